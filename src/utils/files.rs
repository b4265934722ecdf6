//! File storage for course summary documents.
//!
//! A trait-based abstraction so the course service never touches the
//! filesystem directly, plus the validator enforcing the upload policy
//! (at most 1MB, extension pdf/docx/txt).

use std::fmt;
use std::path::PathBuf;

use tokio::fs;

use crate::utils::errors::AppError;

/// Abstract file storage backend.
pub trait FileStorage: Send + Sync {
    /// Save file content under `key` and return the storage key.
    fn save<'a>(
        &'a self,
        key: &'a str,
        content: &'a [u8],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<String, StorageError>> + Send + 'a>,
    >;

    /// Delete a file by key. Missing files are not an error.
    fn delete<'a>(
        &'a self,
        key: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), StorageError>> + Send + 'a>>;
}

#[derive(Debug)]
pub enum StorageError {
    IoError(std::io::Error),
    InvalidKey(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// Local filesystem storage rooted at a configured upload directory.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Keys are relative paths; reject traversal and absolute paths.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with '/'".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(
        &'a self,
        key: &'a str,
        content: &'a [u8],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<String, StorageError>> + Send + 'a>,
    > {
        Box::pin(async move {
            Self::validate_key(key)?;

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(
        &'a self,
        key: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), StorageError>> + Send + 'a>>
    {
        Box::pin(async move {
            Self::validate_key(key)?;

            let file_path = self.base_dir.join(key);
            match fs::remove_file(&file_path).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}

/// Validator for course summary uploads.
pub struct SummaryValidator;

impl SummaryValidator {
    const ALLOWED_EXTENSIONS: &'static [&'static str] = &["pdf", "docx", "txt"];

    /// Maximum summary size: 1MB
    const MAX_SIZE_BYTES: usize = 1024 * 1024;

    pub fn validate(filename: &str, size_bytes: usize) -> Result<(), AppError> {
        if size_bytes > Self::MAX_SIZE_BYTES {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "File size {} bytes exceeds 1MB limit",
                size_bytes
            )));
        }

        let ext = Self::extension(filename);
        if !Self::ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "File extension '{}' not allowed. Allowed: pdf, docx, txt",
                ext
            )));
        }

        Ok(())
    }

    pub fn extension(filename: &str) -> String {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_relative_paths() {
        assert!(LocalFileStorage::validate_key("courses/abc-123.pdf").is_ok());
        assert!(LocalFileStorage::validate_key("courses/summary_v2.docx").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal_and_absolute() {
        assert!(LocalFileStorage::validate_key("../../../etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("").is_err());
    }

    #[tokio::test]
    async fn test_save_and_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf());

        let key = storage.save("courses/test.txt", b"hello").await.unwrap();
        assert_eq!(key, "courses/test.txt");
        assert!(dir.path().join("courses/test.txt").exists());

        storage.delete("courses/test.txt").await.unwrap();
        assert!(!dir.path().join("courses/test.txt").exists());

        // Deleting again is not an error
        storage.delete("courses/test.txt").await.unwrap();
    }

    #[test]
    fn test_summary_validator_accepts_allowed_extensions() {
        assert!(SummaryValidator::validate("summary.pdf", 1024).is_ok());
        assert!(SummaryValidator::validate("summary.docx", 1024).is_ok());
        assert!(SummaryValidator::validate("summary.txt", 1024).is_ok());
        assert!(SummaryValidator::validate("SUMMARY.PDF", 1024).is_ok());
    }

    #[test]
    fn test_summary_validator_rejects_other_extensions() {
        assert!(SummaryValidator::validate("summary.exe", 1024).is_err());
        assert!(SummaryValidator::validate("summary.doc", 1024).is_err());
        assert!(SummaryValidator::validate("no_extension", 1024).is_err());
    }

    #[test]
    fn test_summary_validator_size_boundary() {
        assert!(SummaryValidator::validate("s.pdf", 1024 * 1024).is_ok());
        assert!(SummaryValidator::validate("s.pdf", 1024 * 1024 + 1).is_err());
    }
}
