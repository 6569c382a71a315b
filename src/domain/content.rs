use crate::error::{AppError, Result};

/// Default upper bound for document text, in bytes (1 MiB).
pub const MAX_CONTENT_LENGTH: usize = 1024 * 1024;

/// The text body of a document. Empty content is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Content(String);

impl Content {
    /// Validates `value` against the default size limit.
    ///
    /// # Errors
    /// Returns `AppError::ContentTooLarge` if `value` exceeds [`MAX_CONTENT_LENGTH`] bytes.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        Self::with_max_len(value, MAX_CONTENT_LENGTH)
    }

    /// Validates `value` against a caller-supplied size limit.
    ///
    /// # Errors
    /// Returns `AppError::ContentTooLarge` if `value` exceeds `max` bytes.
    pub fn with_max_len(value: impl Into<String>, max: usize) -> Result<Self> {
        let value = value.into();
        if value.len() > max {
            return Err(AppError::ContentTooLarge { len: value.len(), max });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Content {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
