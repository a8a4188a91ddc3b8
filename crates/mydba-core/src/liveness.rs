//! Liveness probing
//!
//! A probe fails for two very different reasons: the server is unreachable,
//! or the server is up and refused the statement. An [`ErrorClassifier`]
//! decides which failures still prove the server is alive.

use tracing::{debug, warn};

use crate::connection::Connection;
use crate::error::Error;

/// Conventional probe statement
pub const ALIVE_PROBE: &str = "SELECT 1";

/// `ER_CON_COUNT_ERROR`: too many connections
pub const ER_CON_COUNT_ERROR: u16 = 1040;
/// `ER_SERVER_SHUTDOWN`: server shutdown in progress
pub const ER_SERVER_SHUTDOWN: u16 = 1053;
/// `ER_NORMAL_SHUTDOWN`
pub const ER_NORMAL_SHUTDOWN: u16 = 1077;
/// `ER_SHUTDOWN_COMPLETE`
pub const ER_SHUTDOWN_COMPLETE: u16 = 1079;
/// `ER_FORCING_CLOSE`: forcing close of a thread during shutdown
pub const ER_FORCING_CLOSE: u16 = 1080;
/// `ER_CONNECTION_KILLED`
pub const ER_CONNECTION_KILLED: u16 = 1927;

/// Server error codes that mean the server is going away
const SHUTDOWN_CODES: [u16; 5] = [
    ER_SERVER_SHUTDOWN,
    ER_NORMAL_SHUTDOWN,
    ER_SHUTDOWN_COMPLETE,
    ER_FORCING_CLOSE,
    ER_CONNECTION_KILLED,
];

/// Decides whether a failed probe still shows a live server
pub trait ErrorClassifier: Send + Sync {
    /// `true` if the error was produced by a server that is up
    fn indicates_alive(&self, err: &Error) -> bool;
}

impl<F> ErrorClassifier for F
where
    F: Fn(&Error) -> bool + Send + Sync,
{
    fn indicates_alive(&self, err: &Error) -> bool {
        self(err)
    }
}

/// Default classifier: any reply carrying a server error code counts as alive
///
/// A server that answers with an error code has parsed and rejected the
/// statement (syntax error, access denied, unknown variable, lock wait
/// timeout, too many connections). Shutdown codes are the exception.
/// Connection, I/O, driver and timeout failures count as dead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerReplyClassifier;

impl ErrorClassifier for ServerReplyClassifier {
    fn indicates_alive(&self, err: &Error) -> bool {
        if err.category().is_connection_level() {
            return false;
        }
        match err.server_code() {
            Some(code) => !SHUTDOWN_CODES.contains(&code),
            None => false,
        }
    }
}

/// Run `probe` and report whether the server is responsive
pub async fn is_alive(conn: &dyn Connection, probe: &str) -> bool {
    is_alive_with(conn, probe, &ServerReplyClassifier).await
}

/// [`is_alive`] with a custom classifier
pub async fn is_alive_with(
    conn: &dyn Connection,
    probe: &str,
    classifier: &dyn ErrorClassifier,
) -> bool {
    match conn.query(probe).await {
        Ok(_) => true,
        Err(e) if classifier.indicates_alive(&e) => {
            debug!(probe, error = %e, "probe rejected by a live server");
            true
        }
        Err(e) => {
            warn!(probe, error = %e, "server not responding");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_replies_are_alive() {
        let c = ServerReplyClassifier;
        assert!(c.indicates_alive(&Error::server(1064, "syntax error", "SELEC 1")));
        assert!(c.indicates_alive(&Error::server(1045, "Access denied", "SELECT 1")));
        assert!(c.indicates_alive(&Error::server(
            ER_CON_COUNT_ERROR,
            "Too many connections",
            "SELECT 1"
        )));
    }

    #[test]
    fn test_shutdown_and_transport_errors_are_dead() {
        let c = ServerReplyClassifier;
        assert!(!c.indicates_alive(&Error::server(
            ER_SERVER_SHUTDOWN,
            "Server shutdown in progress",
            "SELECT 1"
        )));
        assert!(!c.indicates_alive(&Error::connection("broken pipe")));
        assert!(!c.indicates_alive(&Error::timeout("probe timed out")));
        assert!(!c.indicates_alive(&Error::query("no code")));
    }

    #[test]
    fn test_closure_classifier() {
        let never = |_: &Error| false;
        assert!(!never.indicates_alive(&Error::server(1064, "x", "y")));
    }
}
