use serde::{Deserialize, Serialize};

/// Base64 form of a stored image, ready to drop into an `<img src>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: String,
    pub base64: String,
    /// `data:<mime>;base64,<base64>`
    pub data: String,
}

impl EncodedImage {
    pub fn new(mime: impl Into<String>, base64: impl Into<String>) -> Self {
        let mime = mime.into();
        let base64 = base64.into();
        let data = format!("data:{};base64,{}", mime, base64);
        Self { mime, base64, data }
    }
}

/// Payload for `write_file`: text or raw bytes, written verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FileContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl AsRef<[u8]> for FileContent {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileContent::Text(text) => text.as_bytes(),
            FileContent::Bytes(bytes) => bytes,
        }
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        FileContent::Text(text)
    }
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        FileContent::Text(text.to_string())
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(bytes: Vec<u8>) -> Self {
        FileContent::Bytes(bytes)
    }
}
