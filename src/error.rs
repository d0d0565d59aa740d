//! Error types for the onboarding wizard.

/// Top-level error type for the wizard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    #[error("System error: {0}")]
    System(#[from] SystemError),

    #[error("Internal invariant violated: {0}")]
    Fatal(String),
}

impl Error {
    /// Whether this error must end the process instead of being rendered and
    /// retried from the action menu.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Fatal(_) | Self::Config(_) => true,
            Self::Store(StoreError::Corrupt { .. }) => true,
            Self::Dialog(DialogError::InputClosed) => true,
            _ => false,
        }
    }

    /// Whether this is a gateway-level connectivity failure.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Gateway(GatewayError::Network(_)))
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("No networks configured in {0}")]
    NoNetworks(String),
}

/// Malformed operator-supplied data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid URL (expected http:// or https:// followed by a host)")]
    Url(String),

    #[error("'{0}' is not a valid IPv4 address")]
    Ip(String),

    #[error("'{0}' is not a valid email address")]
    Email(String),

    #[error("Private key must be 0x followed by 64 hex characters")]
    PrivateKey,

    #[error("Invalid amount: {0}")]
    Amount(String),

    #[error("The acceptance sentence does not match the required form")]
    TosAcceptance,
}

/// Persisted state store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("State file {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },

    #[error("Serialization error for key {key}: {message}")]
    Serialization { key: String, message: String },
}

/// Smart contract gateway failures, pre-classified so phases and actions can
/// branch on the category instead of on raw error text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Call rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Classify a raw revert / RPC error message into a known category.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("insufficient funds") || lower.contains("not enough balance") {
            Self::InsufficientFunds(message)
        } else if lower.contains("already onboarded") || lower.contains("already registered") {
            Self::AlreadyRegistered(message)
        } else {
            Self::Rejected(message)
        }
    }
}

/// Dialog (operator I/O) errors.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("Operator input closed")]
    InputClosed,

    #[error("Terminal IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host system probing errors.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Failed to run {command}: {reason}")]
    CommandFailed { command: String, reason: String },
}

/// Result type alias for the wizard.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_revert_messages() {
        assert!(matches!(
            GatewayError::classify("VM Exception: insufficient funds for gas * price + value"),
            GatewayError::InsufficientFunds(_)
        ));
        assert!(matches!(
            GatewayError::classify("revert: Account already onboarded"),
            GatewayError::AlreadyRegistered(_)
        ));
        assert!(matches!(
            GatewayError::classify("revert: Sender is not whitelisted"),
            GatewayError::Rejected(_)
        ));
    }

    #[test]
    fn fatal_classification() {
        assert!(Error::Fatal("boom".into()).is_fatal());
        assert!(Error::from(DialogError::InputClosed).is_fatal());
        assert!(
            Error::from(StoreError::Corrupt {
                path: "state.json".into(),
                message: "eof".into()
            })
            .is_fatal()
        );
        assert!(!Error::from(GatewayError::Network("timeout".into())).is_fatal());
        assert!(Error::from(GatewayError::Network("timeout".into())).is_network());
        assert!(!Error::from(ValidationError::PrivateKey).is_fatal());
    }
}
