use crate::error::{AppError, Result};

pub const MAX_FILE_NAME_LENGTH: usize = 255;
/// Default upper bound for a single attachment, in bytes (50 MiB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    /// Trims and validates a client-supplied file name.
    ///
    /// # Errors
    /// Returns `AppError::InvalidFileName` if the name is empty, longer than
    /// [`MAX_FILE_NAME_LENGTH`] characters, or contains a path separator or `..`.
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidFileName("file name is empty".into()));
        }
        if name.chars().count() > MAX_FILE_NAME_LENGTH {
            return Err(AppError::InvalidFileName(format!("file name exceeds {MAX_FILE_NAME_LENGTH} characters")));
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(AppError::InvalidFileName("file name contains path components".into()));
        }
        Ok(Self(name.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased extension without the dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.0.rsplit_once('.').map(|(_, ext)| ext.trim().to_ascii_lowercase()).filter(|ext| !ext.is_empty())
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileSize(u64);

impl FileSize {
    /// # Errors
    /// Returns `AppError::EmptyFile` for zero bytes and `AppError::FileTooLarge`
    /// above [`MAX_FILE_SIZE`].
    pub fn new(bytes: u64) -> Result<Self> {
        Self::with_max(bytes, MAX_FILE_SIZE)
    }

    /// # Errors
    /// Returns `AppError::EmptyFile` for zero bytes and `AppError::FileTooLarge` above `max`.
    pub fn with_max(bytes: u64, max: u64) -> Result<Self> {
        if bytes == 0 {
            return Err(AppError::EmptyFile);
        }
        if bytes > max {
            return Err(AppError::FileTooLarge { size: bytes, max });
        }
        Ok(Self(bytes))
    }

    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.0
    }
}

/// A normalized media type: lower-cased, parameters stripped.
///
/// Any type is accepted; an empty value falls back to [`DEFAULT_MIME_TYPE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType(String);

impl MimeType {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let base = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if base.is_empty() { Self::default() } else { Self(base) }
    }

    /// Best-effort guess from the file extension, for clients that send no type.
    #[must_use]
    pub fn guess_from(file_name: &FileName) -> Self {
        let guessed = match file_name.extension().as_deref() {
            Some("txt") => "text/plain",
            Some("html") => "text/html",
            Some("css") => "text/css",
            Some("js") => "text/javascript",
            Some("json") => "application/json",
            Some("pdf") => "application/pdf",
            Some("zip") => "application/zip",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("svg") => "image/svg+xml",
            Some("doc") => "application/msword",
            Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Some("xls") => "application/vnd.ms-excel",
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            _ => DEFAULT_MIME_TYPE,
        };
        Self(guessed.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.0.starts_with("image/")
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.0.starts_with("text/")
    }
}

impl Default for MimeType {
    fn default() -> Self {
        Self(DEFAULT_MIME_TYPE.to_string())
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
