//! docxfill - Batch DOCX template filler driven by spreadsheet data
//!
//! This crate fills a DOCX template once per row of a spreadsheet: it
//! extracts `{{placeholder}}` names from the template, loads column names
//! and rows from the data file, substitutes mapped column values into a
//! fresh copy of the template for every row, and bundles the rendered
//! documents into a zip archive. A small web server (`src/main.rs`) wires
//! the upload → map → render → download pipeline around this library.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use docxfill::{write_archive, RendererBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a renderer with default settings
//!     let renderer = RendererBuilder::new().build()?;
//!
//!     // Discover placeholder and column names (both sorted)
//!     let inspection = renderer.inspect("letter.docx".as_ref(), "clients.xlsx".as_ref())?;
//!     println!("placeholders: {:?}", inspection.placeholders);
//!     println!("columns: {:?}", inspection.columns);
//!
//!     // Map placeholders to columns and render one document per row
//!     let mut mapping = BTreeMap::new();
//!     mapping.insert("name".to_string(), "client".to_string());
//!     mapping.insert("amount".to_string(), "value".to_string());
//!
//!     let report = renderer.render_batch(
//!         "letter.docx".as_ref(),
//!         "clients.xlsx".as_ref(),
//!         &mapping,
//!         "output".as_ref(),
//!     )?;
//!     println!("{} documents rendered", report.documents.len());
//!
//!     // Bundle the output directory into a single archive
//!     write_archive("output".as_ref(), "documents.zip".as_ref())?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use docxfill::{DateFormat, FailurePolicy, RendererBuilder, UnmappedPolicy};
//!
//! fn main() -> Result<(), docxfill::DocxFillError> {
//!     let renderer = RendererBuilder::new()
//!         .with_identifier_column("invoice_id")          // name outputs by this column
//!         .with_unmapped_policy(UnmappedPolicy::Blank)   // blank out unmapped placeholders
//!         .with_failure_policy(FailurePolicy::Partial)   // archive the successful rows
//!         .with_date_format(DateFormat::Custom("%d.%m.%Y".to_string()))
//!         .build()?;
//!     # let _ = renderer;
//!     Ok(())
//! }
//! ```

mod api;
mod archive;
mod builder;
mod docx;
mod error;
mod formatter;
mod render;
mod security;
mod sheet;
mod types;

pub mod config;
pub mod run;
pub mod server;

// 公開API
pub use api::{DateFormat, FailurePolicy, UnmappedPolicy};
pub use archive::write_archive;
pub use builder::{Renderer, RendererBuilder};
pub use docx::DocxTemplate;
pub use error::DocxFillError;
pub use sheet::DataTable;
pub use types::{Inspection, Mapping, RenderReport, RowFailure};
