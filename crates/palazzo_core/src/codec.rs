//! crates/palazzo_core/src/codec.rs
//!
//! Upload validation and the base64/data-URL conversions used at the edges.

use crate::domain::ImageData;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;

/// Uploads larger than this are rejected.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const ACCEPTED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// The file name offered when the current design is saved locally.
pub const EXPORT_FILE_NAME: &str = "palazzo-design.jpeg";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Please upload a JPG or PNG file.")]
    UnsupportedFormat(String),
    #[error("File size should not exceed 5MB.")]
    TooLarge { size: usize },
    #[error("Image data is not valid base64: {0}")]
    InvalidEncoding(String),
}

/// A file as the client handed it over, before validation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub mime_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Builds an upload from either a `data:<mime>;base64,<payload>` URL or a
    /// bare base64 payload with a separately declared MIME type.
    pub fn from_encoded(payload: &str, declared_mime_type: &str) -> Result<Self, CodecError> {
        match parse_data_url(payload) {
            Some((mime_type, data)) => Ok(Self::new(decode_base64(data)?, mime_type)),
            None => Ok(Self::new(decode_base64(payload)?, declared_mime_type)),
        }
    }
}

/// Validates an upload against the allow-list and the size ceiling.
pub fn decode(file: UploadedFile) -> Result<ImageData, CodecError> {
    let mime_type = file.mime_type.trim().to_ascii_lowercase();
    if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(CodecError::UnsupportedFormat(file.mime_type));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(CodecError::TooLarge {
            size: file.bytes.len(),
        });
    }
    Ok(ImageData::new(file.bytes, mime_type))
}

/// Renders an image as a data URL the browser can display directly.
pub fn to_displayable(image: &ImageData) -> String {
    format!("data:{};base64,{}", image.mime_type, encode_base64(&image.bytes))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

pub fn decode_base64(data: &str) -> Result<Bytes, CodecError> {
    BASE64_STANDARD
        .decode(data.trim())
        .map(Bytes::from)
        .map_err(|e| CodecError::InvalidEncoding(e.to_string()))
}

/// Splits a base64 data URL into its MIME type and payload.
fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.trim().strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    Some((mime_type, data))
}
