use thiserror::Error;

pub type Result<T> = std::result::Result<T, CollationError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollationError {
    /// Name or id is not present in the registry
    #[error("unknown collation: {0}")]
    UnknownCollation(String),

    /// Known to the reference server but deliberately not implemented
    #[error("unsupported collation: {0}")]
    UnsupportedCollation(String),

    #[error("invalid {charset} byte sequence at offset {offset}")]
    InvalidEncoding { charset: &'static str, offset: usize },

    #[error("codepoint U+{codepoint:04X} cannot be represented in {charset}")]
    Unrepresentable {
        charset: &'static str,
        codepoint: u32,
    },
}

impl CollationError {
    pub(crate) fn invalid(charset: &'static str, offset: usize) -> Self {
        CollationError::InvalidEncoding { charset, offset }
    }

    pub(crate) fn unrepresentable(charset: &'static str, codepoint: u32) -> Self {
        CollationError::Unrepresentable { charset, codepoint }
    }
}
