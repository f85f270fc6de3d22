//! # medix-client: Invoicing Service Client
//!
//! The terminal's only path to the external inventory-and-invoicing service.
//! That service owns stock levels and transaction records; this crate reads
//! snapshots of both and writes transaction drafts back.
//!
//! ## Modules
//!
//! - [`service`] - The [`InvoicingService`] trait
//! - [`http`] - reqwest implementation
//! - [`memory`] - in-process implementation (feature `memory`)
//! - [`wire`] - JSON DTOs and their mapping to core types
//! - [`error`] - [`ClientError`]
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use medix_client::{HttpInvoicingService, InvoicingService};
//!
//! # async fn run() -> medix_client::ClientResult<()> {
//! let service = HttpInvoicingService::new("http://localhost:8080", Duration::from_secs(10))?;
//! let products = service.fetch_inventory().await?;
//! println!("{} products", products.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod service;
pub mod wire;

pub use error::{ClientError, ClientResult};
pub use http::HttpInvoicingService;
#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryInvoicingService;
pub use service::InvoicingService;
