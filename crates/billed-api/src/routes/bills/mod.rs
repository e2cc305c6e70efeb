//! Bill routes - Bill list, proof preview, JSON list
//!
//! Structure:
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{api_bills, bills_controller, htmx_bill_preview, ServerModal};
pub use page::page_bills;
