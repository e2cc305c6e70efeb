//! Request session and per-user new bill forms
//!
//! The browser keeps the serialized user in a cookie; each request rebuilds
//! a session storage from it. New bill controllers outlive a request so the
//! proof upload and the form submission share the cached upload.

use crate::{AppState, FormSlot};
use billed_config::SessionConfig;
use billed_core::{
    BillStore, MemoryStorage, NewBillController, NewBillView, RecordingNavigator, SessionProvider,
    StorageSessionProvider,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Session storage holding the `user` cookie value, if any
pub fn storage_from_headers(headers: &axum::http::HeaderMap, cookie_name: &str) -> MemoryStorage {
    let storage = MemoryStorage::new();
    let cookies = headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok());

    for header in cookies {
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if name == cookie_name {
                let value = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                storage.set_item(billed_core::session::USER_KEY, &value);
            }
        }
    }
    storage
}

/// Alerts and input resets raised while handling one request
#[derive(Debug, Default)]
pub struct PendingAlerts {
    alerts: Mutex<Vec<String>>,
    clear_file_input: Mutex<bool>,
}

impl PendingAlerts {
    /// Drain what the controller raised
    pub fn take(&self) -> (Vec<String>, bool) {
        let alerts = self
            .alerts
            .lock()
            .map(|mut a| std::mem::take(&mut *a))
            .unwrap_or_default();
        let cleared = self
            .clear_file_input
            .lock()
            .map(|mut c| std::mem::replace(&mut *c, false))
            .unwrap_or(false);
        (alerts, cleared)
    }
}

impl NewBillView for PendingAlerts {
    fn alert(&self, message: &str) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(message.to_string());
        }
    }

    fn clear_file_input(&self) {
        if let Ok(mut cleared) = self.clear_file_input.lock() {
            *cleared = true;
        }
    }
}

fn new_slot(state: &AppState, sessions: Arc<dyn SessionProvider>, owner: Option<String>) -> FormSlot {
    let navigator = Arc::new(RecordingNavigator::new());
    let view = Arc::new(PendingAlerts::default());
    let store: Arc<dyn BillStore> = state.store.clone();
    let controller = NewBillController::new(navigator.clone(), Some(store), sessions, view.clone())
        .with_upload_config(state.config.upload.clone());
    FormSlot {
        controller: Arc::new(controller),
        navigator,
        view,
        owner,
        touched: Arc::new(Mutex::new(Instant::now())),
    }
}

/// New bill form of the requesting user
///
/// Without a readable session a throwaway form is returned; its handlers
/// abort on the session check.
pub async fn form_slot(state: &AppState, headers: &axum::http::HeaderMap) -> FormSlot {
    let storage = storage_from_headers(headers, &state.config.session.cookie_name);
    let sessions: Arc<dyn SessionProvider> = Arc::new(StorageSessionProvider::new(Arc::new(storage)));

    let email = match sessions.current() {
        Ok(session) => session.email,
        Err(e) => {
            log::debug!(target: "billed::session", "No usable session: {}", e);
            return new_slot(state, sessions, None);
        }
    };

    if let Some(slot) = state.forms.read().await.get(&email) {
        slot.touch();
        return slot.clone();
    }

    let mut forms = state.forms.write().await;
    if let Some(slot) = forms.get(&email) {
        slot.touch();
        return slot.clone();
    }
    prune_forms(&mut forms, &state.config.session);

    let slot = new_slot(state, sessions, Some(email.clone()));
    forms.insert(email, slot.clone());
    slot
}

/// Forget a form once its bill went out
pub async fn release_form_slot(state: &AppState, slot: &FormSlot) {
    let Some(owner) = &slot.owner else {
        return;
    };
    let mut forms = state.forms.write().await;
    if forms
        .get(owner)
        .is_some_and(|kept| Arc::ptr_eq(&kept.controller, &slot.controller))
    {
        forms.remove(owner);
    }
}

/// Drop idle forms, then the least recently used ones, to leave room for one more
fn prune_forms(forms: &mut HashMap<String, FormSlot>, config: &SessionConfig) {
    let before = forms.len();
    let idle_timeout = Duration::from_secs(config.form_idle_timeout_secs);
    forms.retain(|_, slot| slot.idle_for() < idle_timeout);

    while forms.len() >= config.max_open_forms {
        let oldest = forms
            .iter()
            .max_by_key(|(_, slot)| slot.idle_for())
            .map(|(email, _)| email.clone());
        match oldest {
            Some(email) => {
                forms.remove(&email);
            }
            None => break,
        }
    }

    if forms.len() < before {
        log::debug!(
            target: "billed::session",
            "Dropped {} open forms ({} kept)",
            before - forms.len(),
            forms.len()
        );
    }
}
