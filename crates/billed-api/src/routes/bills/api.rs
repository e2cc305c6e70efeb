//! Bill API endpoints
//!
//! Endpoints:
//! - api_bills: Bills for display (JSON)
//! - htmx_bill_preview: Proof modal body for an icon-eye (HTMX)

use crate::AppState;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use billed_core::{BillStore, BillsController, PreviewAction, PreviewIcon, PreviewModal, RecordingNavigator};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Preview modal rendered into an HTMX response
#[derive(Debug)]
pub struct ServerModal {
    width: u32,
    body: Mutex<Option<String>>,
}

impl ServerModal {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            body: Mutex::new(None),
        }
    }

    /// Body shown last, if any
    pub fn body(&self) -> Option<String> {
        self.body.lock().ok().and_then(|b| b.clone())
    }
}

impl PreviewModal for ServerModal {
    fn width(&self) -> u32 {
        self.width
    }

    fn show(&self, body_html: &str) {
        if let Ok(mut body) = self.body.lock() {
            *body = Some(body_html.to_string());
        }
    }
}

/// Bill list controller for one request
pub fn bills_controller(state: &AppState) -> (BillsController, Arc<RecordingNavigator>, Arc<ServerModal>) {
    let navigator = Arc::new(RecordingNavigator::new());
    let modal = Arc::new(ServerModal::new(state.config.preview.modal_width));
    let store: Arc<dyn BillStore> = state.store.clone();
    let controller = BillsController::new(navigator.clone(), Some(store), modal.clone());
    (controller, navigator, modal)
}

/// Bills for display (JSON API)
pub async fn api_bills(state: axum::extract::State<AppState>) -> Response {
    let (controller, _, _) = bills_controller(&state);
    match controller.get_bills().await {
        Ok(bills) => axum::Json(bills).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// HTMX: Modal body for an icon-eye click
///
/// Query: `url` (proof URL) and `file_name`. Icons without proof get an
/// empty 204 response.
pub async fn htmx_bill_preview(
    state: axum::extract::State<AppState>,
    params: Query<HashMap<String, String>>,
) -> Response {
    let icon = PreviewIcon {
        bill_url: params.get("url").cloned().unwrap_or_default(),
        file_name: params.get("file_name").cloned().unwrap_or_else(|| "null".to_string()),
    };

    let (controller, _, modal) = bills_controller(&state);
    match controller.handle_click_icon_eye(&icon) {
        PreviewAction::Opened { .. } => Html(modal.body().unwrap_or_default()).into_response(),
        PreviewAction::Ignored => StatusCode::NO_CONTENT.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;
    use billed_core::Bill;

    #[tokio::test]
    async fn test_preview_opens_modal() {
        let (status, _, body) = get(
            &state(),
            "/bills/preview?url=https%3A%2F%2Ftest.com%2Fbill.jpg&file_name=test.jpg",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"src="https://test.com/bill.jpg""#));
        assert!(body.contains("width=400"));
    }

    #[tokio::test]
    async fn test_preview_without_proof_is_empty() {
        let (status, _, body) = get(
            &state(),
            "/bills/preview?url=https%3A%2F%2Ftest.com%2Fbill.jpg&file_name=null",
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_api_bills_json() {
        let state = state();
        let bill: Bill = serde_json::from_value(serde_json::json!({
            "id": "b1", "email": "a@a", "type": "Hôtel et logement", "name": "Hotel",
            "amount": 400, "date": "2004-04-04", "status": "accepted"
        }))
        .unwrap();
        let store = billed_core::MemoryStore::with_bills("http://files.test", vec![bill]);
        let state = crate::AppState::new(state.config, std::sync::Arc::new(store));

        let (status, _, body) = get(&state, "/api/bills").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value[0]["date"], "4 Avr. 04");
        assert_eq!(value[0]["status"], "Accepté");
    }

    #[tokio::test]
    async fn test_api_bills_error() {
        let state = state();
        state.store.fail_list(Some("Erreur 500"));
        let (status, _, body) = get(&state, "/api/bills").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Erreur 500"));
    }
}
