//! Upload pipeline and query operations over stored files.

mod files;
pub mod types;

pub use files::{FileApi, FileService};
pub use types::{FileRecord, ServiceError, UploadRequest};
