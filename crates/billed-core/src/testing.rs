//! Recording fakes shared by the controller tests

use crate::bills::PreviewModal;
use crate::error::{CoreError, CoreResult, ErrorContext, ErrorLogger};
use crate::models::{Bill, UploadResult};
use crate::new_bill::NewBillView;
use crate::store::{BillStore, UpdateRequest, UploadRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Default)]
pub struct CountingLogger {
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl CountingLogger {
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::SeqCst)
    }
}

impl ErrorLogger for CountingLogger {
    fn log_error(&self, _error: &CoreError, _context: &ErrorContext) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn log_warning(&self, _message: &str, _context: &ErrorContext) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeModal {
    width: u32,
    shown: Mutex<Vec<String>>,
}

impl FakeModal {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }
}

impl PreviewModal for FakeModal {
    fn width(&self) -> u32 {
        self.width
    }

    fn show(&self, body_html: &str) {
        self.shown.lock().unwrap().push(body_html.to_string());
    }
}

#[derive(Default)]
pub struct FakeView {
    alerts: Mutex<Vec<String>>,
    cleared: AtomicUsize,
}

impl FakeView {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn cleared(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl NewBillView for FakeView {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn clear_file_input(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

enum Pending {
    Ready(CoreResult<UploadResult>),
    Gate(oneshot::Receiver<CoreResult<UploadResult>>),
}

/// Store whose upload responses are scripted, optionally held until released
#[derive(Default)]
pub struct GatedStore {
    responses: Mutex<VecDeque<Pending>>,
    create_calls: AtomicUsize,
    uploads: Mutex<Vec<UploadRequest>>,
    updates: Mutex<Vec<UpdateRequest>>,
    update_failure: Mutex<Option<String>>,
    update_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedStore {
    pub fn respond_with(&self, result: CoreResult<UploadResult>) {
        self.responses.lock().unwrap().push_back(Pending::Ready(result));
    }

    /// Next upload waits until the returned sender fires
    pub fn gate(&self) -> oneshot::Sender<CoreResult<UploadResult>> {
        let (tx, rx) = oneshot::channel();
        self.responses.lock().unwrap().push_back(Pending::Gate(rx));
        tx
    }

    pub fn fail_updates(&self, message: &str) {
        *self.update_failure.lock().unwrap() = Some(message.to_string());
    }

    /// Next update waits until the returned sender fires
    pub fn hold_update(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.update_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub async fn wait_for_updates(&self, count: usize) {
        while self.updates.lock().unwrap().len() < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_creates(&self, count: usize) {
        while self.create_calls() < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn last_upload(&self) -> Option<UploadRequest> {
        self.uploads.lock().unwrap().last().cloned()
    }

    pub fn last_update(&self) -> Option<UpdateRequest> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl BillStore for GatedStore {
    async fn list(&self) -> CoreResult<Vec<Bill>> {
        Ok(Vec::new())
    }

    async fn create(&self, request: UploadRequest) -> CoreResult<UploadResult> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.uploads.lock().unwrap().push(request);
        let pending = self.responses.lock().unwrap().pop_front();
        match pending {
            Some(Pending::Ready(result)) => result,
            Some(Pending::Gate(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(CoreError::store("Erreur 500"))),
            None => Ok(UploadResult {
                key: format!("key-{}", call),
                file_url: format!("https://x/key-{}", call),
                file_name: None,
            }),
        }
    }

    async fn update(&self, request: UpdateRequest) -> CoreResult<()> {
        self.updates.lock().unwrap().push(request);
        let gate = self.update_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.update_failure.lock().unwrap().clone() {
            Some(message) => Err(CoreError::store(message)),
            None => Ok(()),
        }
    }
}
