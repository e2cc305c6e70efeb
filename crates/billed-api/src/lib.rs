//! HTTP server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::bills: bill list, proof preview modal
//! - routes::new_bill: new bill form, proof upload, submission
//! - routes::files: uploaded proof download

pub mod error;
pub mod routes;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    response::Redirect,
    routing::{get, post},
    Router,
};
use billed_config::Config;
use billed_core::{MemoryStore, NewBillController, RecordingNavigator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

pub use error::ApiError;
pub use session::PendingAlerts;

/// New bill controller of one user, with the surfaces it reports to
#[derive(Clone)]
pub struct FormSlot {
    pub controller: Arc<NewBillController>,
    pub navigator: Arc<RecordingNavigator>,
    pub view: Arc<PendingAlerts>,
    /// Email the slot is kept under, `None` for a throwaway form
    pub owner: Option<String>,
    touched: Arc<std::sync::Mutex<Instant>>,
}

impl FormSlot {
    fn touch(&self) {
        if let Ok(mut touched) = self.touched.lock() {
            *touched = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.touched.lock().map(|t| t.elapsed()).unwrap_or_default()
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<MemoryStore>,
    /// Open new bill forms by user email
    pub forms: Arc<RwLock<HashMap<String, FormSlot>>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<MemoryStore>) -> Self {
        Self {
            config,
            store,
            forms: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::bills::{api_bills, htmx_bill_preview, page_bills};
    use routes::files::api_file_content;
    use routes::new_bill::{api_new_bill_file, htmx_new_bill_store, page_new_bill};

    // Multipart framing on top of the proof itself
    let body_limit = state.config.upload.max_file_size + 64 * 1024;

    // JSON API endpoints, readable cross-origin
    let api = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/bills", get(api_bills))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]));

    Router::new()
        .merge(api)
        .route("/files/:key/:name", get(api_file_content))
        // HTMX page routes
        .route("/", get(|| async { Redirect::to("/bills") }))
        .route("/bills", get(page_bills))
        .route("/bills/preview", get(htmx_bill_preview))
        .route("/bills/new", get(page_new_bill).post(htmx_new_bill_store))
        .route("/bills/new/file", post(api_new_bill_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Billed</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        billed_utils::escape_html(title),
        content
    )
}

/// Vertical navigation with the active screen highlighted
pub fn nav_sidebar(current_path: &str) -> String {
    let links = [
        ("/bills", "Notes de frais", "icon-window"),
        ("/bills/new", "Nouvelle note", "icon-mail"),
    ];

    let mut html = String::from(
        r#"<nav class='h-full bg-white border-r p-4'><h1 class='text-xl font-bold mb-6 text-indigo-600'>Billed</h1><ul class='space-y-2'>"#,
    );
    for (href, label, test_id) in links {
        let class = if href == current_path {
            "active-icon block px-3 py-2 rounded-lg bg-indigo-50 text-indigo-700 font-medium"
        } else {
            "block px-3 py-2 rounded-lg hover:bg-gray-100"
        };
        html.push_str(&format!(
            r#"<li><a href='{}' data-testid='{}' class='{}'>{}</a></li>"#,
            href, test_id, class, label
        ));
    }
    html.push_str("</ul></nav>");
    html
}

/// Check if request is from HTMX
pub fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

/// Wrap content for full page or HTMX partial
pub fn page_response(headers: &axum::http::HeaderMap, title: &str, current_path: &str, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        format!(r#"<main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>"#, inner_content)
    } else {
        base_html(title, &format!(r#"<div class='flex h-screen'>
    <aside class='w-64 flex-shrink-0'>{}</aside>
    <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
</div>"#,
            nav_sidebar(current_path), inner_content))
    }
}

/// Start the HTTP server and serve until Ctrl-C
pub async fn start_server(config: Config, store: Arc<MemoryStore>) -> Result<(), ApiError> {
    let addr = config.bind_address();
    let state = AppState::new(config, store);
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        log::error!("Failed to bind {}: {}", addr, e);
        ApiError::InternalError
    })?;
    log::info!("Starting Billed server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - /bills (Mes notes de frais)");
    log::info!("  - /bills/new (Envoyer une note de frais)");
    log::info!("  - /api/* (JSON API endpoints)");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    match axum::serve(listener, router).with_graceful_shutdown(shutdown).await {
        Ok(_) => {
            log::info!("Server stopped gracefully");
            Ok(())
        }
        Err(e) => {
            log::error!("Server error: {}", e);
            Err(ApiError::InternalError)
        }
    }
}
