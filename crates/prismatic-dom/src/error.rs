//! Error types for document parsing.

/// Error while parsing HTML into a [`Document`](crate::Document).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DomError {
    /// The XML reader rejected the input.
    #[error("HTML parse error: {0}")]
    Parse(#[from] quick_xml::Error),

    /// Text could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}
