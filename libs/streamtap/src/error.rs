use thiserror::Error;

/// Errors surfaced by the sampling layer.
///
/// Most sampling failure modes are deliberately non-fatal (bad lookups warn
/// and degrade to an inert cell, unknown channel ids are omitted from query
/// results). Encoding failures are the one condition escalated to the
/// caller, since they indicate a codec/configuration mismatch.
#[derive(Debug, Error)]
pub enum TapError {
    #[error("sample encoding failed: {0}")]
    Encode(String),

    #[error("sampler runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, TapError>;
