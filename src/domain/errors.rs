use std::fmt;
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The listen socket could not be bound. Process-fatal.
    Bind(String),
    /// The target could not be dialed. Fatal for the requesting session only.
    Dial(String),
    /// IO failure while relaying. Fatal for the session it happened in.
    Relay(String),
    /// A listener hook failed. Never fatal.
    Observer(String),
    InvalidConfig(String),
    InvalidState(String),
    Io(String),
    Timeout,
}

impl ProxyError {
    pub fn bind(addr: &str, err: io::Error) -> Self {
        ProxyError::Bind(format!("{}: {}", addr, err))
    }

    pub fn dial(target: &str, err: io::Error) -> Self {
        ProxyError::Dial(format!("{}: {}", target, err))
    }

    /// Whether this error ends the whole process rather than a single session.
    pub fn is_process_fatal(&self) -> bool {
        matches!(self, ProxyError::Bind(_) | ProxyError::InvalidConfig(_))
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Bind(msg) => write!(f, "Failed to bind listen socket: {}", msg),
            ProxyError::Dial(msg) => write!(f, "Failed to dial target: {}", msg),
            ProxyError::Relay(msg) => write!(f, "Relay failed: {}", msg),
            ProxyError::Observer(msg) => write!(f, "Listener failed: {}", msg),
            ProxyError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ProxyError::InvalidState(msg) => write!(f, "Invalid server state: {}", msg),
            ProxyError::Io(msg) => write!(f, "IO error: {}", msg),
            ProxyError::Timeout => write!(f, "Operation timed out"),
        }
    }
}

impl std::error::Error for ProxyError {}

impl From<io::Error> for ProxyError {
    fn from(err: io::Error) -> Self {
        ProxyError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_bind_and_config_errors_are_process_fatal() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");

        assert!(ProxyError::bind("0.0.0.0:9000", io::Error::new(io::ErrorKind::AddrInUse, "in use")).is_process_fatal());
        assert!(ProxyError::InvalidConfig("missing target".into()).is_process_fatal());
        assert!(!ProxyError::dial("127.0.0.1:9001", refused).is_process_fatal());
        assert!(!ProxyError::Observer("boom".into()).is_process_fatal());
        assert!(!ProxyError::Timeout.is_process_fatal());
    }

    #[test]
    fn test_dial_error_names_target() {
        let err = ProxyError::dial("127.0.0.1:9001", io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(err.to_string(), "Failed to dial target: 127.0.0.1:9001: refused");
    }
}
