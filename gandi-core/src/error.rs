//! Error types for the Gandi hosting CLI

use thiserror::Error;

/// Core error type for Gandi operations
#[derive(Error, Debug)]
pub enum GandiError {
    /// No API key could be resolved from flags, environment, or config file
    #[error("No Gandi API key was specified (use --api-key, GANDI_API_KEY, or `config set api_key`)")]
    MissingCredential,

    /// A required value was neither given nor obtainable interactively
    #[error("Missing required value: {0}")]
    MissingValue(String),

    /// The provider answered with an XML-RPC fault
    #[error("Remote fault {code}: {message}")]
    RemoteFault { code: i64, message: String },

    /// Network or HTTP-level failure while talking to the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed XML-RPC document, or a value the codec refuses to handle
    #[error("Codec error: {0}")]
    Codec(String),

    /// The requested action is not allowed in the resource's current state
    #[error("{0}")]
    Precondition(String),

    /// No disk of the server is flagged as the boot disk
    #[error("Server {server_id} has no boot disk")]
    MissingBootDisk { server_id: i64 },

    /// No public IP of the requested version is attached to the server
    #[error("Server {server_id} has no public IPv{version} address")]
    NoPublicAddress { server_id: i64, version: u8 },

    /// A mutating call did not return the expected operation
    #[error("Provider did not return a '{0}' operation")]
    OperationNotFound(String),

    /// The user declined a confirmation prompt
    #[error("Cancelled by user")]
    Cancelled,

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Gandi operations
pub type Result<T> = std::result::Result<T, GandiError>;

impl From<serde_json::Error> for GandiError {
    fn from(err: serde_json::Error) -> Self {
        GandiError::Serialization(err.to_string())
    }
}
