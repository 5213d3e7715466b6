//! Search backend: HTTP client and wire types

pub mod api;
pub mod types;

pub use api::{BackendClient, BackendError};
pub use types::{DownloadRequest, DownloadResponse, ImageMeta, SearchResult};
