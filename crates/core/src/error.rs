use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChronologiconError {
    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),
}
