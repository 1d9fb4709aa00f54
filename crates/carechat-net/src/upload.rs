//! Attachment upload API client.

use std::path::Path;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::ApiError;

/// A file selected for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    pub name: String,
    pub bytes: Bytes,
    pub mime: Option<String>,
}

impl AttachmentFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name).map(str::to_string);
        Self {
            name,
            bytes: bytes.into(),
            mime,
        }
    }

    /// Read a file from disk, naming it after the last path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let data = tokio::fs::read(path).await?;
        Ok(Self::new(name, data))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn guess_mime(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

/// Body returned by the upload endpoint.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub file_url: Option<String>,
}

impl UploadResponse {
    /// The uploaded file's URL; an absent or blank field is a failed upload.
    pub fn into_file_url(self) -> Result<String, ApiError> {
        match self.file_url {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(ApiError::MissingFileUrl),
        }
    }
}

/// `POST` a binary file, yielding its public URL.
pub trait AttachmentUploader: Send + Sync {
    /// The returned future owns everything it needs so it can be spawned.
    fn upload(&self, file: AttachmentFile) -> BoxFuture<'static, Result<UploadResponse, ApiError>>;
}

/// [`AttachmentUploader`] posting `multipart/form-data` with a `file` field.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpUploader {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
        })
    }
}

impl AttachmentUploader for HttpUploader {
    fn upload(&self, file: AttachmentFile) -> BoxFuture<'static, Result<UploadResponse, ApiError>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        async move {
            debug!(file_name = %file.name, size = file.size(), "Uploading attachment");

            let mime = file.mime.as_deref().unwrap_or("application/octet-stream");
            let part = reqwest::multipart::Part::stream(file.bytes)
                .file_name(file.name)
                .mime_str(mime)?;
            let form = reqwest::multipart::Form::new().part("file", part);

            let response = client
                .post(endpoint)
                .multipart(form)
                .send()
                .await?
                .error_for_status()?
                .json::<UploadResponse>()
                .await?;
            Ok(response)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_or_blank_url_is_failure() {
        let parsed: UploadResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(parsed.into_file_url(), Err(ApiError::MissingFileUrl)));

        let blank = UploadResponse {
            file_url: Some("  ".into()),
        };
        assert!(blank.into_file_url().is_err());

        let ok: UploadResponse = serde_json::from_str(r#"{"fileUrl":"https://x/y.png"}"#).unwrap();
        assert_eq!(ok.into_file_url().unwrap(), "https://x/y.png");
    }

    #[test]
    fn guesses_common_mime_types() {
        assert_eq!(AttachmentFile::new("a.PNG", vec![1]).mime.as_deref(), Some("image/png"));
        assert_eq!(AttachmentFile::new("doc.pdf", vec![1]).mime.as_deref(), Some("application/pdf"));
        assert_eq!(AttachmentFile::new("blob", vec![1]).mime, None);
    }

    #[tokio::test]
    async fn reads_attachment_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.7").unwrap();

        let attachment = AttachmentFile::from_path(&path).await.unwrap();
        assert_eq!(attachment.name, "invoice.pdf");
        assert_eq!(attachment.size(), 8);
        assert_eq!(attachment.mime.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = AttachmentFile::from_path("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }
}
