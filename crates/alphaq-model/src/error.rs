use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown region preset: {0}")]
    UnknownRegion(String),
    #[error("unknown neutralization: {0}")]
    UnknownNeutralization(String),
    #[error("empty expression")]
    EmptyExpression,
}
