// src/web/handlers.rs
//! Request handlers behind the route shells in `web/mod.rs`.

use crate::database::{CvDocumentRepository, DatabaseConfig, StatusCheckRepository};
use crate::image_ingest::{encode_data_uri, ImageValidator};
use crate::pdf::{export_filename, photo, render_cv};
use crate::types::{CvRecord, PdfExportRequest, StatusCheck, StatusCheckCreate};
use crate::utils::Language;
use crate::web::types::{
    ImageUploadForm, MessageResponse, PdfErrorResponse, PdfResponse, SaveCvResponse,
    ServerConfig, UploadImageResponse,
};
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

pub async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello World".to_string(),
    })
}

pub async fn create_status_handler(
    input: Json<StatusCheckCreate>,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<StatusCheck>, Status> {
    let pool = db_config.pool().map_err(|e| {
        error!("Status check rejected, database unavailable: {:#}", e);
        Status::InternalServerError
    })?;

    let check = StatusCheck::new(input.into_inner().client_name);
    StatusCheckRepository::new(pool)
        .append(&check)
        .await
        .map_err(|e| {
            error!("Failed to store status check: {:#}", e);
            Status::InternalServerError
        })?;

    Ok(Json(check))
}

pub async fn list_status_handler(
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<StatusCheck>>, Status> {
    let pool = db_config.pool().map_err(|e| {
        error!("Status listing rejected, database unavailable: {:#}", e);
        Status::InternalServerError
    })?;

    let checks = StatusCheckRepository::new(pool).list().await.map_err(|e| {
        error!("Failed to list status checks: {:#}", e);
        Status::InternalServerError
    })?;

    Ok(Json(checks))
}

pub async fn get_cv_data_handler(
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Option<Value>>, Status> {
    let pool = db_config.pool().map_err(|e| {
        error!("CV fetch rejected, database unavailable: {:#}", e);
        Status::InternalServerError
    })?;

    let document = CvDocumentRepository::new(pool).fetch().await.map_err(|e| {
        error!("Failed to fetch CV document: {:#}", e);
        Status::InternalServerError
    })?;

    Ok(Json(document))
}

pub async fn save_cv_data_handler(
    record: Json<CvRecord>,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<SaveCvResponse>, Status> {
    let pool = db_config.pool().map_err(|e| {
        error!("CV save rejected, database unavailable: {:#}", e);
        Status::InternalServerError
    })?;

    CvDocumentRepository::new(pool)
        .upsert(&record.into_inner())
        .await
        .map_err(|e| {
            error!("Failed to upsert CV document: {:#}", e);
            Status::InternalServerError
        })?;

    Ok(Json(SaveCvResponse {
        success: true,
        message: "CV data saved successfully".to_string(),
    }))
}

pub async fn upload_image_handler(upload: Form<ImageUploadForm<'_>>) -> Json<UploadImageResponse> {
    let mut form = upload.into_inner();
    let declared_mime = form.file.content_type().map(|ct| ct.to_string());

    let temp_path = std::env::temp_dir().join(format!("cv_upload_{}", Uuid::new_v4()));
    if let Err(e) = form.file.persist_to(&temp_path).await {
        error!("Failed to store uploaded image: {}", e);
        return Json(UploadImageResponse::failure(
            "Failed to process uploaded file".to_string(),
        ));
    }

    let bytes = match tokio::fs::read(&temp_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read uploaded image: {}", e);
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Json(UploadImageResponse::failure(
                "Failed to process uploaded file".to_string(),
            ));
        }
    };
    let _ = tokio::fs::remove_file(&temp_path).await;

    if let Err(e) = ImageValidator::validate_upload(&bytes) {
        info!("Rejected image upload: {}", e);
        return Json(UploadImageResponse::failure(e.message));
    }

    let mime = ImageValidator::resolve_mime(&bytes, declared_mime.as_deref());
    info!("Image upload accepted: {} ({} bytes)", mime, bytes.len());
    Json(UploadImageResponse::success(encode_data_uri(&bytes, &mime)))
}

pub async fn export_pdf_handler(
    request: Json<PdfExportRequest>,
    config: &State<ServerConfig>,
) -> Result<PdfResponse, Custom<Json<PdfErrorResponse>>> {
    let PdfExportRequest { language, cv_data } = request.into_inner();
    let language = Language::parse(&language);

    // The photo pipeline degrades to None on any failure; the document
    // still renders without it.
    let profile_photo = match cv_data.get("profileImage").and_then(Value::as_str) {
        Some(source) if !source.is_empty() => photo::load_profile_photo(source).await,
        _ => None,
    };

    let filename = export_filename(&cv_data, language);
    match render_cv(&cv_data, language, profile_photo.as_ref(), &config.fonts_dir) {
        Ok(bytes) => {
            info!("Generated {} ({} bytes)", filename, bytes.len());
            Ok(PdfResponse::with_filename(bytes, filename))
        }
        Err(e) => {
            error!("PDF generation failed: {:#}", e);
            Err(Custom(
                Status::InternalServerError,
                Json(PdfErrorResponse {
                    error: "Failed to generate PDF".to_string(),
                    details: format!("{:#}", e),
                }),
            ))
        }
    }
}
