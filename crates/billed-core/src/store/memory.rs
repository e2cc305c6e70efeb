//! In-process bill store

use super::{BillStore, UpdateRequest, UploadRequest};
use crate::error::{CoreError, CoreResult};
use crate::models::{Bill, BillStatus, UploadResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// Uploaded proof kept by the memory store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
    pub email: String,
}

#[derive(Debug, Default)]
struct Failures {
    list: Option<String>,
    create: Option<String>,
    update: Option<String>,
}

/// Bill store kept in memory
///
/// `create` registers the proof under a fresh key; `update` with that key as
/// selector turns it into a bill. Each operation can be made to fail with a
/// given message.
#[derive(Debug)]
pub struct MemoryStore {
    file_base_url: String,
    bills: RwLock<Vec<Bill>>,
    files: RwLock<HashMap<String, StoredFile>>,
    failures: RwLock<Failures>,
}

impl MemoryStore {
    pub fn new(file_base_url: impl Into<String>) -> Self {
        Self {
            file_base_url: file_base_url.into().trim_end_matches('/').to_string(),
            bills: RwLock::new(Vec::new()),
            files: RwLock::new(HashMap::new()),
            failures: RwLock::new(Failures::default()),
        }
    }

    /// Store pre-filled with bills
    pub fn with_bills(file_base_url: impl Into<String>, bills: Vec<Bill>) -> Self {
        let store = Self::new(file_base_url);
        if let Ok(mut guard) = store.bills.write() {
            *guard = bills;
        }
        store
    }

    /// Read bills from a JSON array file
    pub async fn load_fixtures(&self, path: &Path) -> CoreResult<usize> {
        let content = tokio::fs::read_to_string(path).await?;
        let bills: Vec<Bill> = serde_json::from_str(&content)?;
        let count = bills.len();
        self.write_bills()?.extend(bills);
        log::info!(target: "billed::store", "Loaded {} bills from {}", count, path.display());
        Ok(count)
    }

    pub fn fail_list(&self, message: Option<&str>) {
        if let Ok(mut failures) = self.failures.write() {
            failures.list = message.map(str::to_string);
        }
    }

    pub fn fail_create(&self, message: Option<&str>) {
        if let Ok(mut failures) = self.failures.write() {
            failures.create = message.map(str::to_string);
        }
    }

    pub fn fail_update(&self, message: Option<&str>) {
        if let Ok(mut failures) = self.failures.write() {
            failures.update = message.map(str::to_string);
        }
    }

    /// Snapshot of the persisted bills
    pub fn bills(&self) -> Vec<Bill> {
        self.bills.read().map(|b| b.clone()).unwrap_or_default()
    }

    /// Uploaded proof by key
    pub fn file(&self, key: &str) -> Option<StoredFile> {
        self.files.read().ok().and_then(|f| f.get(key).cloned())
    }

    fn injected_failure(&self, pick: impl Fn(&Failures) -> Option<String>) -> CoreResult<()> {
        match self.failures.read().ok().and_then(|f| pick(&*f)) {
            Some(message) => Err(CoreError::store(message)),
            None => Ok(()),
        }
    }

    fn write_bills(&self) -> CoreResult<std::sync::RwLockWriteGuard<'_, Vec<Bill>>> {
        self.bills
            .write()
            .map_err(|_| CoreError::store("Erreur 500"))
    }
}

#[async_trait]
impl BillStore for MemoryStore {
    async fn list(&self) -> CoreResult<Vec<Bill>> {
        self.injected_failure(|f| f.list.clone())?;
        Ok(self.bills())
    }

    async fn create(&self, request: UploadRequest) -> CoreResult<UploadResult> {
        self.injected_failure(|f| f.create.clone())?;

        let key = billed_utils::generate_id();
        let file_name = request.file.file_name().to_string();
        let file_url = format!(
            "{}/{}/{}",
            self.file_base_url,
            key,
            urlencoding::encode(&file_name)
        );

        let stored = StoredFile {
            file_name: file_name.clone(),
            content_type: request.file.content_type.clone(),
            content: request.file.content.clone(),
            email: request.email,
        };
        self.files
            .write()
            .map_err(|_| CoreError::store("Erreur 500"))?
            .insert(key.clone(), stored);

        log::debug!(target: "billed::store", "Stored proof {} under key {}", file_name, key);

        Ok(UploadResult {
            key,
            file_url,
            file_name: Some(file_name),
        })
    }

    async fn update(&self, request: UpdateRequest) -> CoreResult<()> {
        self.injected_failure(|f| f.update.clone())?;

        let mut bill: Bill = serde_json::from_str(&request.data)?;
        let id = match request.selector {
            Some(selector) => {
                if self.file(&selector).is_none() {
                    return Err(CoreError::store("Erreur 404"));
                }
                selector
            }
            None => billed_utils::generate_id(),
        };
        bill.id = Some(id.clone());
        if bill.status != BillStatus::Pending {
            log::warn!(target: "billed::store", "Bill {} submitted with status {}", id, bill.status);
        }

        let mut bills = self.write_bills()?;
        match bills.iter_mut().find(|b| b.id.as_deref() == Some(id.as_str())) {
            Some(existing) => *existing = bill,
            None => bills.push(bill),
        }
        Ok(())
    }
}
