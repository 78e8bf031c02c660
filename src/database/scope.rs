use std::io::Write;

/// Receiver of the fatal connect-failure path.
///
/// A failed connect is not returned to callers as a recoverable error: the
/// owning request scope is told to drop the caller's identity, answer with a
/// service-unavailable response and stop processing, in that order.
pub trait RequestScope: Send + Sync {
    /// Forget any authenticated caller identity.
    fn invalidate_identity(&self);

    /// Emit the service-unavailable response carrying `message`.
    fn service_unavailable(&self, message: &str);

    /// Stop processing the current request. Implementations that return
    /// leave the [`Database`](crate::Database) in its terminal failed state.
    fn terminate(&self);
}

/// Scope for one-request-per-process hosts: writes the 503 status lines to
/// stdout and exits the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessScope;

impl RequestScope for ProcessScope {
    fn invalidate_identity(&self) {
        tracing::debug!("dropping caller identity after connect failure");
    }

    fn service_unavailable(&self, message: &str) {
        let mut out = std::io::stdout().lock();
        // Best effort, the process exits right after.
        let _ = writeln!(out, "HTTP/1.1 503 Service Temporarily Unavailable");
        let _ = writeln!(out, "Status: 503 Service Temporarily Unavailable");
        let _ = writeln!(out);
        let _ = writeln!(out, "{message}");
        let _ = out.flush();
    }

    fn terminate(&self) {
        std::process::exit(1);
    }
}
