//! Local upload checks, applied before any request is sent.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::api::{ApiError, ApiResult, ROOT_FOLDER_ID};

/// Largest accepted image file, in bytes (1 MiB).
pub const MAX_UPLOAD_BYTES: usize = 1_048_576;

fn too_large() -> ApiError {
    ApiError::validation("File is too large. Max size is 1MB.")
}

/// An image file read into memory, ready for a multipart upload.
#[derive(Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, never buffering more than the upload limit.
    ///
    /// # Errors
    /// Fails if the file cannot be read, or with the `Validation` size error
    /// when it is larger than [`MAX_UPLOAD_BYTES`].
    pub fn read(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("Failed to read metadata for {}", path.display()))?
            .len();
        if size > MAX_UPLOAD_BYTES as u64 {
            return Err(too_large().into());
        }

        // metadata can under-report (devices, growing files); cap the read too
        let mut bytes = Vec::with_capacity(size as usize);
        file.take(MAX_UPLOAD_BYTES as u64 + 1)
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(too_large().into());
        }

        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { file_name, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type sniffed from the file's magic bytes.
    pub fn mime_type(&self) -> Option<&'static str> {
        infer::get(&self.bytes).map(|kind| kind.mime_type())
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Checks an upload request against the client-side rules.
///
/// Order matters for the reported message: target folder first, then size,
/// then name.
///
/// # Errors
/// `Precondition` when `folder_id` is the synthetic root, `Validation` when
/// the file is too large or the name is blank.
pub fn validate_upload(name: &str, file: &UploadFile, folder_id: &str) -> ApiResult<()> {
    if folder_id == ROOT_FOLDER_ID {
        return Err(ApiError::precondition(
            "Please select a folder to upload images",
        ));
    }
    if file.len() > MAX_UPLOAD_BYTES {
        return Err(too_large());
    }
    if file.is_empty() {
        return Err(ApiError::validation("Please select an image file."));
    }
    if name.trim().is_empty() {
        return Err(ApiError::validation("Image name is required."));
    }
    Ok(())
}
