// src/web/types.rs
use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::http::ContentType;
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use serde::Serialize;
use std::path::PathBuf;

/// Binary PDF stream with a download filename.
pub struct PdfResponse {
    pub data: Vec<u8>,
    pub filename: String,
}

impl PdfResponse {
    pub fn with_filename(data: Vec<u8>, filename: String) -> Self {
        Self { data, filename }
    }
}

impl<'r> Responder<'r, 'static> for PdfResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(ContentType::PDF)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename={}", self.filename),
            )
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct SaveCvResponse {
    pub success: bool,
    pub message: String,
}

/// Upload result: `{success, imageUrl}` or `{success: false, error}`.
#[derive(Serialize)]
pub struct UploadImageResponse {
    pub success: bool,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadImageResponse {
    pub fn success(image_url: String) -> Self {
        Self {
            success: true,
            image_url: Some(image_url),
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            image_url: None,
            error: Some(error),
        }
    }
}

/// Export failure body, returned with a non-success HTTP status.
#[derive(Serialize)]
pub struct PdfErrorResponse {
    pub error: String,
    pub details: String,
}

/// Catcher payload for malformed or failed requests.
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

impl ApiErrorResponse {
    pub fn new(error: &str, error_code: &str) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            error_code: error_code.to_string(),
        }
    }
}

#[derive(FromForm)]
pub struct ImageUploadForm<'f> {
    pub file: TempFile<'f>,
}

pub struct ServerConfig {
    pub fonts_dir: PathBuf,
}
