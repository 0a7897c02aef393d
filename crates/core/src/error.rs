#[derive(Debug, thiserror::Error)]
pub enum AgapayError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cannot {action} while in the {step} step")]
    InvalidTransition {
        action: &'static str,
        step: &'static str,
    },
    #[error("{0} is already in progress")]
    Busy(&'static str),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to create storage directory: {0}")]
    StoreDirCreation(std::io::Error),
    #[error("failed to read stored value: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write stored value: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize value: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize value: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to deserialize YAML fixture: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("invalid value: {0}")]
    Types(#[from] agapay_types::TypesError),
}

pub type AgapayResult<T> = std::result::Result<T, AgapayError>;
