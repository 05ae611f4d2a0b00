//! Execution environment detection
//!
//! Async actions may carry separate server and client operations. Which one
//! runs is decided per call by an [`EnvironmentProbe`] injected into the
//! action creator, so tests can substitute a fixed environment.

use std::fmt;
use std::str::FromStr;

/// Environment variable that overrides [`Environment::detect`]
pub const ENVIRONMENT_VAR: &str = "ACTION_RELAY_ENV";

/// Where the current process is executing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Environment {
    Server,
    Client,
}

impl Environment {
    /// Detect the environment for this process.
    ///
    /// `ACTION_RELAY_ENV=server|client` takes precedence. Otherwise `wasm32`
    /// targets are the client and everything else is the server.
    pub fn detect() -> Self {
        if let Ok(value) = std::env::var(ENVIRONMENT_VAR) {
            match value.parse() {
                Ok(env) => return env,
                Err(err) => tracing::warn!(%err, "Ignoring {}", ENVIRONMENT_VAR),
            }
        }
        Self::target_default()
    }

    /// The default for the compilation target, ignoring the override.
    pub const fn target_default() -> Self {
        if cfg!(target_arch = "wasm32") {
            Environment::Client
        } else {
            Environment::Server
        }
    }

    /// Whether this is the server environment.
    pub const fn is_server(self) -> bool {
        matches!(self, Environment::Server)
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Environment::Server => "server",
            Environment::Client => "client",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an environment name is not `server` or `client`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment {0:?}, expected \"server\" or \"client\"")]
pub struct ParseEnvironmentError(String);

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Environment::Server),
            "client" => Ok(Environment::Client),
            _ => Err(ParseEnvironmentError(s.to_owned())),
        }
    }
}

/// Answers "are we executing server-side?"
///
/// Queried once per async action call, at operation selection time.
pub trait EnvironmentProbe: Send + Sync {
    fn is_server(&self) -> bool;

    fn environment(&self) -> Environment {
        if self.is_server() {
            Environment::Server
        } else {
            Environment::Client
        }
    }
}

impl EnvironmentProbe for Environment {
    fn is_server(&self) -> bool {
        Environment::is_server(*self)
    }
}

impl<F> EnvironmentProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_server(&self) -> bool {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_parse() {
        assert_eq!("server".parse(), Ok(Environment::Server));
        assert_eq!(" Client ".parse(), Ok(Environment::Client));
        assert!("browser".parse::<Environment>().is_err());
    }

    #[test]
    fn test_target_default() {
        assert_eq!(Environment::target_default(), Environment::Server);
    }

    #[test]
    fn test_closure_probe() {
        let server = Arc::new(AtomicBool::new(true));
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = {
            let server = server.clone();
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                server.load(Ordering::SeqCst)
            }
        };

        assert_eq!(probe.environment(), Environment::Server);
        server.store(false, Ordering::SeqCst);
        assert_eq!(probe.environment(), Environment::Client);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Environment::Server.to_string(), "server");
        assert_eq!(Environment::Client.to_string(), "client");
    }
}
