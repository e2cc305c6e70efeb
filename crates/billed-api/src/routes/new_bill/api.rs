//! New bill API endpoints
//!
//! Endpoints:
//! - api_new_bill_file: Proof upload from the file input (multipart, JSON answer)
//! - htmx_new_bill_store: Form submission (urlencoded)

use super::page::render_new_bill_form;
use crate::error::ApiError;
use crate::session::{form_slot, release_form_slot};
use crate::AppState;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use billed_core::new_bill::{form_from_map, FIELD_FILE};
use billed_core::{AbortReason, FileOutcome, Route, SelectedFile, SubmitOutcome};
use billed_utils::file_name_from_path;
use serde::Serialize;
use std::collections::HashMap;

/// Answer to a proof upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileResponse {
    #[serde(flatten)]
    outcome: FileOutcome,
    alerts: Vec<String>,
    clear_file_input: bool,
}

/// Multipart read error raised by the body size limit
fn is_length_limit(error: &MultipartError) -> bool {
    error.status() == StatusCode::PAYLOAD_TOO_LARGE
}

/// Proof upload (JSON API)
///
/// A body cut off by the size limit is answered like any oversized proof.
pub async fn api_new_bill_file(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut file = None;
    let mut oversized = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if is_length_limit(&e) => {
                oversized = Some(String::new());
                break;
            }
            Err(e) => {
                return Err(ApiError::BadRequest {
                    message: e.to_string(),
                })
            }
        };
        if field.name() != Some(FIELD_FILE) {
            continue;
        }
        let path = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        match field.bytes().await {
            Ok(content) => {
                let mut selected = SelectedFile::new(path, content);
                selected.content_type = content_type;
                file = Some(selected);
            }
            Err(e) if is_length_limit(&e) => {
                oversized = Some(path);
                break;
            }
            Err(e) => {
                return Err(ApiError::BadRequest {
                    message: e.to_string(),
                })
            }
        }
    }

    let slot = form_slot(&state, &headers).await;
    let outcome = match oversized {
        Some(path) => slot.controller.handle_oversized_file(file_name_from_path(&path)),
        None => slot.controller.handle_change_file(file).await,
    };
    let (alerts, clear_file_input) = slot.view.take();

    let status = match outcome {
        FileOutcome::Aborted {
            reason: AbortReason::SessionUnavailable,
        } => StatusCode::UNAUTHORIZED,
        FileOutcome::UploadFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };

    let response = FileResponse {
        outcome,
        alerts,
        clear_file_input,
    };
    Ok((status, axum::Json(response)).into_response())
}

/// Parse an urlencoded body
fn parse_form_body(body: &str) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = HashMap::new();
    for pair in body.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let decode = |s: &str| {
            let spaced = s.replace('+', " ");
            urlencoding::decode(&spaced)
                .map(|v| v.into_owned())
                .unwrap_or(spaced)
        };
        params.insert(decode(key), decode(value));
    }
    params
}

/// Form submission
///
/// Redirects to the screen the controller navigated to. An aborted submit
/// renders the form again with its alerts.
pub async fn htmx_new_bill_store(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
    body: String,
) -> Response {
    let form = form_from_map(&parse_form_body(&body));
    let slot = form_slot(&state, &headers).await;
    let outcome = slot.controller.handle_submit(form).await;
    let (alerts, _) = slot.view.take();

    match outcome {
        SubmitOutcome::Submitted { bill, persisted } => {
            log::info!(
                target: "billed::api",
                "Bill '{}' submitted by {} (persisted: {})",
                bill.name,
                bill.email,
                persisted
            );
            let route = slot.navigator.take_last().unwrap_or(Route::Bills);
            release_form_slot(&state, &slot).await;
            Redirect::to(route.path()).into_response()
        }
        SubmitOutcome::Aborted {
            reason: AbortReason::SessionUnavailable,
        } => ApiError::Unauthorized.into_response(),
        SubmitOutcome::Aborted { .. } => {
            let content = render_new_bill_form(&state.config.upload.allowed_extensions, &alerts);
            (
                StatusCode::CONFLICT,
                Html(crate::page_response(&headers, "Envoyer une note de frais", "/bills/new", &content)),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{header, Request};

    const BOUNDARY: &str = "XBILLEDBOUNDARY";

    fn upload_request(file_name: &str, cookie: Option<&str>) -> Request<Body> {
        upload_request_with(file_name, "JPEGDATA", cookie)
    }

    fn upload_request_with(file_name: &str, content: &str, cookie: Option<&str>) -> Request<Body> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: image/jpeg\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = file_name,
            c = content
        );
        let mut builder = Request::post("/bills/new/file")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY));
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn submit_request(cookie: Option<&str>) -> Request<Body> {
        let body = "expense-type=Transports&expense-name=Vol+Paris+Londres&amount=348&datepicker=2023-10-10&vat=70&pct=&commentary=Voyage+d%27affaires";
        let mut builder = Request::post("/bills/new")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[test]
    fn test_parse_form_body() {
        let params = parse_form_body("expense-name=Vol+Paris&commentary=d%27affaires&broken");
        assert_eq!(params["expense-name"], "Vol Paris");
        assert_eq!(params["commentary"], "d'affaires");
        assert!(!params.contains_key("broken"));
    }

    #[tokio::test]
    async fn test_refused_extension() {
        let state = state();
        let (status, _, body) = send(&state, upload_request("doc.pdf", Some(EMPLOYEE_COOKIE))).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["outcome"], "rejected");
        assert_eq!(value["clearFileInput"], true);
        assert_eq!(
            value["alerts"][0],
            "Seuls les fichiers avec les extensions jpg, jpeg ou png sont acceptés."
        );
    }

    #[tokio::test]
    async fn test_upload_then_submit() {
        let state = state();
        let (status, _, body) = send(&state, upload_request("f.JPG",Some(EMPLOYEE_COOKIE))).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["outcome"], "uploaded");
        assert_eq!(value["upload"]["fileName"], "f.JPG");

        let (status, headers, _) = send(&state, submit_request(Some(EMPLOYEE_COOKIE))).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[header::LOCATION], "/bills");

        assert!(state.forms.read().await.is_empty());

        let bills = state.store.bills();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].email, "a@a");
        assert_eq!(bills[0].name, "Vol Paris Londres");
        assert_eq!(bills[0].amount, Some(348));
        assert_eq!(bills[0].pct, 20);
        assert_eq!(bills[0].commentary, "Voyage d'affaires");
        assert_eq!(bills[0].file_name.as_deref(), Some("f.JPG"));
        let key = bills[0].id.clone().unwrap();
        assert!(state.store.file(&key).is_some());
    }

    #[tokio::test]
    async fn test_body_over_limit_reported_as_too_large() {
        let mut config = billed_config::Config::default();
        config.upload.max_file_size = 16;
        let state = crate::AppState::new(config, state().store);

        let content = "x".repeat(128 * 1024);
        let (_, _, body) = send(&state, upload_request_with("big.jpg", &content, Some(EMPLOYEE_COOKIE))).await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["outcome"], "too_large");
        assert_eq!(value["clearFileInput"], true);
        assert_eq!(value["alerts"][0], billed_core::new_bill::FILE_TOO_LARGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_upload_failure_reported() {
        let state = state();
        state.store.fail_create(Some("Erreur 500"));
        let (status, _, body) = send(&state, upload_request("f.png", Some(EMPLOYEE_COOKIE))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["outcome"], "upload_failed");
        assert_eq!(value["message"], "Erreur 500");
        assert!(value["alerts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requests_without_session() {
        let state = state();
        let (status, _, _) = send(&state, upload_request("f.png", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(&state, submit_request(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(state.store.bills().is_empty());
    }
}
