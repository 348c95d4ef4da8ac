use std::path::Path;

// 1. UploadFile
/// UploadFile
///
/// A file staged for `POST /upload`. The remote stores it and returns the
/// public URL that articles reference through `imageUrl`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// Sanitised file name sent in the multipart part.
    pub file_name: String,
    /// MIME type guessed from the extension, `application/octet-stream` when unknown.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// new
    ///
    /// Builds an upload from in-memory bytes. The name is sanitised and the
    /// MIME type guessed from it.
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        let file_name = sanitize_file_name(file_name);
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// from_path
    ///
    /// Reads a local file for upload.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        Ok(Self::new(name, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

// 2. Name sanitising
/// sanitize_file_name
///
/// Strips directory components (including `..` and `.`) so only a bare file
/// name is ever sent to the upload endpoint. An empty result becomes `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .next_back()
        .unwrap_or("");
    if last.is_empty() {
        "upload".to_string()
    } else {
        last.to_string()
    }
}
