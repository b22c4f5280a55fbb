//! Normalizes FreshBooks Classic invoice exports for QuickBooks.
//!
//! A request carries comma-delimited per-line amounts, quantities and tax
//! percentages. [`sanitize`] turns them into subtotal, discount, taxable
//! total, residual tax, 2-decimal quantities and a QuickBooks tax code.

pub mod config;
pub mod error;
pub mod logging;
pub mod money;
pub mod normalizer;
pub mod request;
pub mod response;

pub use config::{ConfigError, TaxCodes};
pub use error::MalformedInputError;
pub use normalizer::{normalize, InvoiceLineInput, InvoiceSummary, TaxableStatus};
pub use request::{parse_body, BodyError, Fields};
pub use response::{sanitize, SanitizedInvoice};
