// src/web/mod.rs
pub mod handlers;
pub mod types;

pub use types::*;

use crate::database::DatabaseConfig;
use crate::environment::EnvironmentConfig;
use anyhow::{Context, Result};
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use tracing::{error, info};

use crate::types::{CvRecord, PdfExportRequest, StatusCheck, StatusCheckCreate};

// CORS Fairing with a configurable origin allowlist
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if self.allowed_origins.iter().any(|o| o == "*") {
            response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        } else if let Some(origin) = request.headers().get_one("Origin") {
            if self.allowed_origins.iter().any(|o| o == origin) {
                response.set_header(Header::new(
                    "Access-Control-Allow-Origin",
                    origin.to_string(),
                ));
                response.set_header(Header::new("Vary", "Origin"));
            }
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// API routes

#[get("/")]
pub async fn root() -> Json<MessageResponse> {
    handlers::root_handler().await
}

#[post("/status", data = "<input>")]
pub async fn create_status(
    input: Json<StatusCheckCreate>,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<StatusCheck>, Status> {
    handlers::create_status_handler(input, db_config).await
}

#[get("/status")]
pub async fn list_status(
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<StatusCheck>>, Status> {
    handlers::list_status_handler(db_config).await
}

#[get("/cv-data")]
pub async fn get_cv_data(
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Option<serde_json::Value>>, Status> {
    handlers::get_cv_data_handler(db_config).await
}

#[post("/cv-data", data = "<record>")]
pub async fn save_cv_data(
    record: Json<CvRecord>,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<SaveCvResponse>, Status> {
    handlers::save_cv_data_handler(record, db_config).await
}

#[post("/upload-image", data = "<upload>")]
pub async fn upload_image(upload: Form<ImageUploadForm<'_>>) -> Json<UploadImageResponse> {
    handlers::upload_image_handler(upload).await
}

#[post("/export-pdf", data = "<request>")]
pub async fn export_pdf(
    request: Json<PdfExportRequest>,
    config: &State<ServerConfig>,
) -> Result<PdfResponse, Custom<Json<PdfErrorResponse>>> {
    handlers::export_pdf_handler(request, config).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers

#[rocket::catch(400)]
pub fn bad_request() -> Json<ApiErrorResponse> {
    Json(ApiErrorResponse::new("Invalid request format", "BAD_REQUEST"))
}

#[rocket::catch(422)]
pub fn unprocessable_entity() -> Json<ApiErrorResponse> {
    Json(ApiErrorResponse::new(
        "Request body failed validation",
        "UNPROCESSABLE_ENTITY",
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ApiErrorResponse> {
    Json(ApiErrorResponse::new("Internal server error", "INTERNAL_ERROR"))
}

/// Assemble the rocket. Shared with the endpoint tests.
pub fn build_rocket(
    server_config: ServerConfig,
    db_config: DatabaseConfig,
    allowed_origins: Vec<String>,
) -> Rocket<Build> {
    // Saved records may inline data-URI photos, so the defaults are too low.
    let figment = rocket::Config::figment().merge((
        "limits",
        Limits::default()
            .limit("json", 20.mebibytes())
            .limit("file", 20.mebibytes())
            .limit("data-form", 25.mebibytes()),
    ));

    rocket::custom(figment)
        .attach(Cors::new(allowed_origins))
        .manage(server_config)
        .manage(db_config)
        .register(
            "/api",
            catchers![bad_request, unprocessable_entity, internal_error],
        )
        .mount(
            "/api",
            routes![
                root,
                create_status,
                list_status,
                get_cv_data,
                save_cv_data,
                upload_image,
                export_pdf,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(environment: EnvironmentConfig) -> Result<()> {
    let mut db_config = DatabaseConfig::new(environment.database_path.clone());

    if let Err(e) = db_config.init_pool().await {
        error!("Failed to initialize database: {}", e);
        return Err(e);
    }

    if let Err(e) = db_config.migrate().await {
        error!("Failed to run database migrations: {}", e);
        return Err(e);
    }

    let server_config = ServerConfig {
        fonts_dir: environment.fonts_path.clone(),
    };

    info!("Starting CVpress single-tenant API server");
    info!("Database: {}", db_config.database_path.display());
    info!("Fonts: {}", environment.fonts_path.display());
    info!("CORS origins: {:?}", environment.cors_allowed_origins);

    build_rocket(server_config, db_config, environment.cors_allowed_origins)
        .launch()
        .await
        .context("Rocket server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use std::path::PathBuf;

    async fn test_client() -> Client {
        let mut db_config = DatabaseConfig::new(PathBuf::from(":memory:"));
        db_config
            .init_pool_with_url("sqlite::memory:")
            .await
            .expect("in-memory pool");
        db_config.migrate().await.expect("migrations");

        let server_config = ServerConfig {
            fonts_dir: PathBuf::from("/nonexistent-font-dir"),
        };

        Client::tracked(build_rocket(
            server_config,
            db_config,
            vec!["*".to_string()],
        ))
        .await
        .expect("valid rocket instance")
    }

    #[rocket::async_test]
    async fn root_returns_liveness_message() {
        let client = test_client().await;
        let response = client.get("/api/").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );

        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["message"], "Hello World");
    }

    #[rocket::async_test]
    async fn cv_data_is_null_before_first_save() {
        let client = test_client().await;
        let response = client.get("/api/cv-data").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body: serde_json::Value = response.into_json().await.unwrap();
        assert!(body.is_null());
    }

    #[rocket::async_test]
    async fn cv_data_round_trips_through_save() {
        let client = test_client().await;

        let response = client
            .post("/api/cv-data")
            .header(ContentType::JSON)
            .body(r#"{"name": "Ana Horvat", "skills_en": ["Teaching"]}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], true);

        let stored: serde_json::Value = client
            .get("/api/cv-data")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(stored["name"], "Ana Horvat");
        assert_eq!(stored["skills_en"][0], "Teaching");
        assert!(stored["updated_at"].is_string());
    }

    #[rocket::async_test]
    async fn empty_record_saves_without_error() {
        let client = test_client().await;
        let response = client
            .post("/api/cv-data")
            .header(ContentType::JSON)
            .body("{}")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn status_checks_append_and_list() {
        let client = test_client().await;

        let created: serde_json::Value = client
            .post("/api/status")
            .header(ContentType::JSON)
            .body(r#"{"client_name": "uptime-probe"}"#)
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(created["client_name"], "uptime-probe");
        assert_eq!(created["id"].as_str().unwrap().len(), 36);
        assert!(created["timestamp"].is_string());

        let listed: serde_json::Value = client
            .get("/api/status")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn export_pdf_streams_document_with_filename() {
        let client = test_client().await;
        let response = client
            .post("/api/export-pdf")
            .header(ContentType::JSON)
            .body(r#"{"language": "HR", "cvData": {"name": "Ana Horvat"}}"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::PDF));
        let disposition = response
            .headers()
            .get_one("Content-Disposition")
            .unwrap()
            .to_string();
        assert!(disposition.contains("Ana_Horvat_CV_Europass_HR.pdf"));

        let bytes = response.into_bytes().await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[rocket::async_test]
    async fn export_pdf_survives_unreachable_photo_url() {
        let client = test_client().await;
        let response = client
            .post("/api/export-pdf")
            .header(ContentType::JSON)
            .body(
                r#"{"language": "EN", "cvData": {"name": "Ana", "profileImage": "http://127.0.0.1:9/gone.jpg"}}"#,
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let bytes = response.into_bytes().await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[rocket::async_test]
    async fn malformed_export_payload_yields_structured_error() {
        let client = test_client().await;
        let response = client
            .post("/api/export-pdf")
            .header(ContentType::JSON)
            .body(r#"{"language": "EN"}"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}
