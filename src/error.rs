use thiserror::Error;

/// Errors raised while obtaining the catalog
///
/// Individual malformed rows never surface here: a bad price becomes `0`
/// and a row without a code is dropped during parsing.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport failure or non-success HTTP status from the catalog feed
    #[error("{0}")]
    Fetch(String),

    /// The payload does not contain a header plus at least one data row
    #[error("{0}")]
    Format(String),

    /// A local catalog file could not be read
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl LookupError {
    /// Message shown to the user when a load fails
    pub fn user_message(&self) -> String {
        format!("Failed to load product data: {}", self)
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Fetch(err.to_string())
    }
}
