//! Route modules for the API server
//!
//! - bills: bill list, preview modal, JSON list
//! - new_bill: new bill form, proof upload, submission
//! - files: uploaded proofs
//!
//! Each screen module follows the same structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Page rendering

pub mod bills;
pub mod files;
pub mod new_bill;
