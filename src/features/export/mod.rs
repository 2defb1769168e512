pub mod handler;
pub mod models;

pub use handler::{API_KEY_HEADER, create_export_router, download_collection};
pub use models::{DownloadQuery, ExportResponse};
