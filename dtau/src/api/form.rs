//! Admin form extraction.
//!
//! Admin forms arrive either URL-encoded or as `multipart/form-data` when they carry
//! files. [`FormData`] accepts both and keeps repeated fields, so multi-value inputs
//! such as `technologies` or `remove_images` can be read as lists.

use crate::errors::{Error, Result};
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use tracing::{debug, instrument};

/// A file part of a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content: Bytes,
}

/// Text fields and files of a submitted form, in submission order
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl FormData {
    /// First value of a text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// First value of a text field, trimmed, or empty when absent
    pub fn trimmed(&self, name: &str) -> &str {
        self.text(name).map(str::trim).unwrap_or_default()
    }

    /// Every value submitted for a text field
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields.iter().filter(|(k, _)| k == name).map(|(_, v)| v.as_str()).collect()
    }

    /// Whether the form carried the field at all
    pub fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// Non-empty files submitted under a field name
    pub fn files<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a UploadedFile> + use<'a> {
        let name = name.to_string();
        self.files.iter().filter(move |f| f.field == name)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files(name).next()
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to parse multipart data: {e}"),
        })? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            match file_name {
                Some(file_name) => {
                    let content = field.bytes().await.map_err(|e| Error::BadRequest {
                        message: format!("Failed to read uploaded file: {e}"),
                    })?;
                    // Browsers submit an empty part for file inputs left blank
                    if file_name.is_empty() || content.is_empty() {
                        continue;
                    }
                    debug!(field = %name, file_name = %file_name, size = content.len(), "Received file");
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content,
                    });
                }
                None => {
                    let value = field.text().await.map_err(|e| Error::BadRequest {
                        message: format!("Failed to read form field: {e}"),
                    })?;
                    form.fields.push((name, value));
                }
            }
        }

        Ok(form)
    }

    fn from_urlencoded(body: &[u8]) -> Result<Self> {
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(body).map_err(|e| Error::BadRequest {
            message: format!("Failed to parse form: {e}"),
        })?;
        Ok(Self {
            fields,
            files: Vec::new(),
        })
    }
}

impl<S: Send + Sync> FromRequest<S> for FormData {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| Error::BadRequest {
                message: format!("Invalid multipart request: {e}"),
            })?;
            Self::from_multipart(multipart).await
        } else {
            let body = Bytes::from_request(req, state).await.map_err(|e| Error::BadRequest {
                message: format!("Failed to read request body: {e}"),
            })?;
            Self::from_urlencoded(&body)
        }
    }
}
