//! doclist - A client for the Google Documents List (GData) API.
//!
//! This library provides functionality to:
//! - Log in with ClientLogin and cache one token per service scope
//! - Search documents by title
//! - Upload files as documents, drawings, presentations or spreadsheets
//! - Export resources to local temporary files in a chosen format
//! - Delete resources, permanently or to the trash
//! - Convert a local file by uploading, exporting and deleting it
//!
//! # Example
//!
//! ```no_run
//! use doclist::{ClientConfig, Credentials, DocsClient, GetOptions, LocalFile, PutOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let credentials = Credentials::new("user@example.com", "secret");
//!     let client = DocsClient::new(credentials, ClientConfig::default())?;
//!
//!     let mut file = LocalFile::open("report.txt")?;
//!     if let Some(id) = client.put(&mut file, &PutOptions::default())? {
//!         let options = GetOptions {
//!             format: Some("pdf".to_string()),
//!             sheet: None,
//!         };
//!         if let Some(pdf) = client.get(id.as_str(), &options)? {
//!             println!("exported to {}", pdf.path().display());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod resource;
pub mod transport;

// Re-exports for convenience
pub use auth::{Credentials, Scope, TokenStore};
pub use client::{
    ConvertOptions, DeleteOptions, DocsClient, GetOptions, PutOptions, SearchOptions,
};
pub use config::{ClientConfig, Endpoints};
pub use error::{DocsError, Result};
pub use formats::{FileFormat, FormatResolver, StandardFormats};
pub use models::{LocalFile, MemoryFile, Upload};
pub use resource::{extract_ids, is_resource_id, ResourceId, ResourceKind};
pub use transport::{HttpTransport, Method, Request, Response, StatusCategory, Transport};
