//! New bill controller
//!
//! Handles the proof file input and the submission of the new bill form.
//! Upload identifiers returned by the store are cached on the controller
//! until the form is submitted.
//!
//! Every upload is numbered; only the response of the latest upload may
//! touch the cache, and a submit is refused while that upload is pending.

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::{Bill, BillStatus, SelectedFile, DEFAULT_PCT};
use crate::navigation::{Navigator, Route};
use crate::session::SessionProvider;
use crate::store::{BillStore, UpdateRequest, UploadHeaders, UploadRequest};
use billed_config::UploadConfig;
use billed_utils::{file_extension, parse_int_prefix};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// Form field identifiers
pub const FIELD_EXPENSE_TYPE: &str = "expense-type";
pub const FIELD_EXPENSE_NAME: &str = "expense-name";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_DATE: &str = "datepicker";
pub const FIELD_VAT: &str = "vat";
pub const FIELD_PCT: &str = "pct";
pub const FIELD_COMMENTARY: &str = "commentary";
pub const FIELD_FILE: &str = "file";

/// Alert shown while the proof upload has not answered yet
pub const UPLOAD_IN_FLIGHT_MESSAGE: &str =
    "Le justificatif est en cours d'envoi, veuillez patienter.";

/// Alert shown for a proof above the size limit
pub const FILE_TOO_LARGE_MESSAGE: &str = "Le fichier dépasse la taille maximale autorisée.";

/// Alert shown for a proof with a refused extension
pub fn rejected_file_message(allowed: &[String]) -> String {
    let list = match allowed.split_last() {
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} ou {}", rest.join(", "), last),
        None => String::new(),
    };
    format!("Seuls les fichiers avec les extensions {} sont acceptés.", list)
}

/// Raw values of the new bill form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBillForm {
    pub expense_type: String,
    pub expense_name: String,
    pub amount: String,
    pub date: String,
    pub vat: String,
    pub pct: String,
    pub commentary: String,
}

impl NewBillForm {
    /// Collect values by field identifier; unknown identifiers are ignored
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut form = Self::default();
        for (key, value) in fields {
            let slot = match key.as_ref() {
                FIELD_EXPENSE_TYPE => &mut form.expense_type,
                FIELD_EXPENSE_NAME => &mut form.expense_name,
                FIELD_AMOUNT => &mut form.amount,
                FIELD_DATE => &mut form.date,
                FIELD_VAT => &mut form.vat,
                FIELD_PCT => &mut form.pct,
                FIELD_COMMENTARY => &mut form.commentary,
                _ => continue,
            };
            *slot = value.into();
        }
        form
    }

    /// Pending bill for `email` carrying the cached proof
    pub fn to_bill(&self, email: &str, upload: &UploadCache) -> Bill {
        let pct = match parse_int_prefix(&self.pct) {
            Some(0) | None => DEFAULT_PCT,
            Some(pct) => pct,
        };
        Bill {
            id: None,
            email: email.to_string(),
            expense_type: self.expense_type.clone(),
            name: self.expense_name.clone(),
            amount: parse_int_prefix(&self.amount),
            date: self.date.clone(),
            vat: self.vat.clone(),
            pct,
            commentary: self.commentary.clone(),
            file_url: upload.file_url.clone(),
            file_name: upload.file_name.clone(),
            status: BillStatus::Pending,
        }
    }
}

/// Identifiers of the last successful upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCache {
    pub bill_id: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
}

/// Where the form stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormPhase {
    Idle,
    FileUploading,
    FileReady,
    FileRejected,
    Submitting,
    Navigated,
    SubmitFailed,
}

/// Why a handler stopped before reaching the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbortReason {
    SessionUnavailable,
    NoStore,
    UploadInFlight,
}

/// Result of a file selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Nothing selected
    NoFile,
    /// Extension refused, input cleared and user alerted
    Rejected { file_name: String },
    /// Size limit exceeded, input cleared and user alerted
    TooLarge { file_name: String },
    Aborted { reason: AbortReason },
    Uploaded { upload: UploadCache },
    /// Store refused the upload; cache reset
    UploadFailed { message: String },
    /// A newer upload started meanwhile; response dropped
    Superseded,
}

/// Result of a form submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Aborted { reason: AbortReason },
    /// Bill sent to the update path; `persisted` is false when that path failed
    Submitted { bill: Bill, persisted: bool },
}

/// User interactions on the new bill form
#[derive(Debug, Clone, PartialEq)]
pub enum NewBillEvent {
    FileSelected(Option<SelectedFile>),
    Submit(NewBillForm),
}

/// Outcome of [`NewBillController::handle_event`]
#[derive(Debug, Clone, PartialEq)]
pub enum NewBillOutcome {
    File(FileOutcome),
    Submit(SubmitOutcome),
}

/// Form surface the controller reports to
pub trait NewBillView: Send + Sync {
    /// Blocking user alert
    fn alert(&self, message: &str);
    /// Reset the file input value
    fn clear_file_input(&self);
}

#[derive(Debug)]
struct FormState {
    cache: UploadCache,
    generation: u64,
    in_flight: Option<u64>,
    phase: FormPhase,
}

/// New bill controller
pub struct NewBillController {
    navigator: Arc<dyn Navigator>,
    store: Option<Arc<dyn BillStore>>,
    sessions: Arc<dyn SessionProvider>,
    view: Arc<dyn NewBillView>,
    logger: Arc<dyn ErrorLogger>,
    upload: UploadConfig,
    state: Mutex<FormState>,
}

impl NewBillController {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        store: Option<Arc<dyn BillStore>>,
        sessions: Arc<dyn SessionProvider>,
        view: Arc<dyn NewBillView>,
    ) -> Self {
        Self {
            navigator,
            store,
            sessions,
            view,
            logger: Arc::new(DefaultErrorLogger),
            upload: UploadConfig::default(),
            state: Mutex::new(FormState {
                cache: UploadCache::default(),
                generation: 0,
                in_flight: None,
                phase: FormPhase::Idle,
            }),
        }
    }

    pub fn with_upload_config(mut self, upload: UploadConfig) -> Self {
        self.upload = upload;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Cached upload identifiers
    pub fn upload_cache(&self) -> UploadCache {
        self.lock_state().cache.clone()
    }

    pub fn phase(&self) -> FormPhase {
        self.lock_state().phase
    }

    /// True while the latest upload has not answered
    pub fn upload_in_flight(&self) -> bool {
        self.lock_state().in_flight.is_some()
    }

    /// Dispatch a form event
    pub async fn handle_event(&self, event: NewBillEvent) -> NewBillOutcome {
        match event {
            NewBillEvent::FileSelected(file) => NewBillOutcome::File(self.handle_change_file(file).await),
            NewBillEvent::Submit(form) => NewBillOutcome::Submit(self.handle_submit(form).await),
        }
    }

    /// Validate the selected proof and upload it
    pub async fn handle_change_file(&self, file: Option<SelectedFile>) -> FileOutcome {
        let Some(file) = file.filter(|f| !f.path.is_empty()) else {
            return FileOutcome::NoFile;
        };
        let file_name = file.file_name().to_string();

        let allowed = file_extension(&file_name)
            .map(|ext| self.upload.allowed_extensions.iter().any(|a| *a == ext))
            .unwrap_or(false);
        if !allowed {
            self.view.clear_file_input();
            self.view.alert(&rejected_file_message(&self.upload.allowed_extensions));
            self.lock_state().phase = FormPhase::FileRejected;
            self.logger.log_error(
                &CoreError::InvalidFile {
                    file_name: file_name.clone(),
                },
                &ErrorContext::new("select proof"),
            );
            return FileOutcome::Rejected { file_name };
        }

        if file.content.len() > self.upload.max_file_size {
            return self.handle_oversized_file(&file_name);
        }

        let email = match self.sessions.current() {
            Ok(session) => session.email,
            Err(e) => {
                self.logger.log_error(&CoreError::from(e), &ErrorContext::new("upload proof"));
                return FileOutcome::Aborted {
                    reason: AbortReason::SessionUnavailable,
                };
            }
        };

        let Some(store) = &self.store else {
            self.logger.log_warning(
                "No store configured, proof not uploaded",
                &ErrorContext::new("upload proof").with_user(email),
            );
            return FileOutcome::Aborted {
                reason: AbortReason::NoStore,
            };
        };

        let generation = {
            let mut state = self.lock_state();
            state.generation += 1;
            state.in_flight = Some(state.generation);
            state.phase = FormPhase::FileUploading;
            state.generation
        };

        let mut pending = PendingUpload {
            controller: self,
            generation,
            done: false,
        };

        let request = UploadRequest {
            file,
            email: email.clone(),
            headers: UploadHeaders {
                no_content_type: true,
            },
        };
        let result = store.create(request).await;
        pending.done = true;

        let mut state = self.lock_state();
        if state.generation != generation {
            log::debug!(
                target: "billed::new_bill",
                "Dropping response of upload {} (current is {})",
                generation,
                state.generation
            );
            return FileOutcome::Superseded;
        }
        state.in_flight = None;

        match result {
            Ok(response) => {
                state.cache = UploadCache {
                    bill_id: Some(response.key),
                    file_url: Some(response.file_url),
                    file_name: Some(file_name),
                };
                state.phase = FormPhase::FileReady;
                FileOutcome::Uploaded {
                    upload: state.cache.clone(),
                }
            }
            Err(e) => {
                state.cache = UploadCache::default();
                state.phase = FormPhase::Idle;
                drop(state);
                self.logger
                    .log_error(&e, &ErrorContext::new("upload proof").with_user(email));
                FileOutcome::UploadFailed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Refuse a proof over the size limit
    ///
    /// Also used when the transport cut the file off before it was read whole.
    pub fn handle_oversized_file(&self, file_name: &str) -> FileOutcome {
        self.view.clear_file_input();
        self.view.alert(FILE_TOO_LARGE_MESSAGE);
        self.lock_state().phase = FormPhase::FileRejected;
        log::info!(
            target: "billed::new_bill",
            "Rejected proof {} over {} bytes",
            file_name,
            self.upload.max_file_size
        );
        FileOutcome::TooLarge {
            file_name: file_name.to_string(),
        }
    }

    /// Build the bill from the form, persist it and go back to the list
    ///
    /// Navigation happens whether or not the store accepted the bill.
    pub async fn handle_submit(&self, form: NewBillForm) -> SubmitOutcome {
        let session = match self.sessions.current() {
            Ok(session) => session,
            Err(e) => {
                self.logger.log_error(&CoreError::from(e), &ErrorContext::new("submit bill"));
                return SubmitOutcome::Aborted {
                    reason: AbortReason::SessionUnavailable,
                };
            }
        };

        let (cache, generation) = {
            let mut state = self.lock_state();
            if state.in_flight.is_some() {
                drop(state);
                self.view.alert(UPLOAD_IN_FLIGHT_MESSAGE);
                return SubmitOutcome::Aborted {
                    reason: AbortReason::UploadInFlight,
                };
            }
            state.phase = FormPhase::Submitting;
            (state.cache.clone(), state.generation)
        };

        let bill = form.to_bill(&session.email, &cache);
        let persisted = self.update_bill(&bill).await.is_ok();

        {
            let mut state = self.lock_state();
            // A proof chosen while the update was pending belongs to the next bill
            if state.generation == generation {
                state.cache = UploadCache::default();
                state.phase = if persisted {
                    FormPhase::Navigated
                } else {
                    FormPhase::SubmitFailed
                };
            } else {
                log::debug!(
                    target: "billed::new_bill",
                    "Keeping upload {} selected during submit",
                    state.generation
                );
            }
        }

        self.navigator.on_navigate(Route::Bills);
        SubmitOutcome::Submitted { bill, persisted }
    }

    /// Send the bill to the store under the cached upload key
    ///
    /// No store configured is a no-op. On success the controller navigates
    /// to the bill list; failures are logged and returned.
    pub async fn update_bill(&self, bill: &Bill) -> CoreResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let context = ErrorContext::new("update bill").with_user(bill.email.clone());

        let data = serde_json::to_string(bill).map_err(|e| {
            let error = CoreError::from(e);
            self.logger.log_error(&error, &context);
            error
        })?;
        let selector = self.lock_state().cache.bill_id.clone();

        match store.update(UpdateRequest { data, selector }).await {
            Ok(()) => {
                self.navigator.on_navigate(Route::Bills);
                Ok(())
            }
            Err(e) => {
                self.logger.log_error(&e, &context);
                Err(e)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Upload awaiting the store
///
/// Dropped before the store answers (the request future was cancelled), it
/// releases the submit lock if no newer upload took over.
struct PendingUpload<'a> {
    controller: &'a NewBillController,
    generation: u64,
    done: bool,
}

impl Drop for PendingUpload<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = self.controller.lock_state();
        if state.in_flight == Some(self.generation) {
            state.in_flight = None;
            state.phase = FormPhase::Idle;
            log::info!(
                target: "billed::new_bill",
                "Upload {} cancelled before the store answered",
                self.generation
            );
        }
    }
}

/// Form fields as posted by a browser, keyed by field identifier
pub fn form_from_map(fields: &HashMap<String, String>) -> NewBillForm {
    NewBillForm::from_fields(fields.iter().map(|(k, v)| (k.as_str(), v.clone())))
}
