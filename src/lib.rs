pub mod database;
pub mod environment;
pub mod image_ingest;
pub mod pdf;
pub mod types;
pub mod utils;
pub mod web;

pub use web::start_web_server;
