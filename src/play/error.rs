/// Outcomes of a play request other than a sampled clip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    #[error("{0}")]
    InvalidKeyFormat(String),
    #[error("unknown variant {0}")]
    UnknownVariant(String),
    #[error("no song available for variant {0}")]
    NoContent(String),
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl PlayError {
    /// Stable machine-readable code, sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            PlayError::InvalidKeyFormat(_) => "INVALID_KEY_FORMAT",
            PlayError::UnknownVariant(_) => "UNKNOWN_VARIANT",
            PlayError::NoContent(_) => "NO_CONTENT",
            PlayError::CatalogUnavailable(_) => "CATALOG_UNAVAILABLE",
        }
    }

    /// Only a catalog outage may succeed when the same request is repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlayError::CatalogUnavailable(_))
    }
}
