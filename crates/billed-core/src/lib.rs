//! Core logic of the employee bill screens
//!
//! - bills: bill list controller (fetch, preview, new bill navigation)
//! - new_bill: new bill controller (proof upload, form submission)
//! - store: bill store contract and the in-memory store
//! - session: session storage and the connected user lookup
//! - navigation: routes and the navigation seam
//! - format: French date and status labels

pub mod bills;
pub mod error;
pub mod format;
pub mod models;
pub mod navigation;
pub mod new_bill;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use bills::{BillsController, BillsEvent, PreviewAction, PreviewIcon, PreviewModal};
pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
pub use models::{Bill, BillStatus, BillView, SelectedFile, Session, UploadResult, UserType};
pub use navigation::{Navigator, RecordingNavigator, Route};
pub use new_bill::{
    AbortReason, FileOutcome, FormPhase, NewBillController, NewBillEvent, NewBillForm,
    NewBillOutcome, NewBillView, SubmitOutcome, UploadCache,
};
pub use session::{MemoryStorage, SessionError, SessionProvider, SessionStorage, StorageSessionProvider};
pub use store::{BillStore, MemoryStore, StoredFile, UpdateRequest, UploadHeaders, UploadRequest};
