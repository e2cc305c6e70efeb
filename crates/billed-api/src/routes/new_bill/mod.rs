//! New bill routes - Form, proof upload, submission
//!
//! Structure:
//! - api.rs: Proof upload and form submission
//! - page.rs: Form rendering

pub mod api;
pub mod page;

pub use api::{api_new_bill_file, htmx_new_bill_store};
pub use page::page_new_bill;
