//! Bills page rendering
//!
//! Endpoints:
//! - page_bills: "Mes notes de frais" list
//!
//! Helper functions:
//! - render_bills_table: Rows sorted most recent first
//! - render_error: Store failure message

use super::api::bills_controller;
use crate::AppState;
use billed_core::BillView;
use billed_utils::{escape_html, format_amount};

/// Bills page - list with preview modal and new bill button
pub async fn page_bills(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let (controller, _, _) = bills_controller(&state);

    let content = match controller.get_bills().await {
        Ok(bills) => render_bills_page(bills),
        Err(e) => render_error(&e.to_string()),
    };

    axum::response::Html(crate::page_response(&headers, "Mes notes de frais", "/bills", &content))
}

fn render_bills_page(bills: Vec<BillView>) -> String {
    format!(
        r#"<div class='flex items-center justify-between mb-4'>
            <h2 class='text-2xl font-bold'>Mes notes de frais</h2>
            <a href='/bills/new' data-testid='btn-new-bill'
                class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Nouvelle note de frais</a>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6'>{}</div>
        {}"#,
        render_bills_table(bills),
        render_modal()
    )
}

/// Table of bills, most recent first
pub fn render_bills_table(mut bills: Vec<BillView>) -> String {
    if bills.is_empty() {
        return "<p class='text-gray-500 text-center'>Aucune note de frais</p>".to_string();
    }

    bills.sort_by(|a, b| b.raw_date.cmp(&a.raw_date));

    let rows: String = bills
        .iter()
        .map(|bill| {
            let file_name = bill.file_name.as_deref().unwrap_or("null");
            let file_url = bill.file_url.as_deref().unwrap_or("");
            format!(
                r#"<tr class='border-b'>
                <td class='py-2'>{}</td>
                <td class='py-2'>{}</td>
                <td class='py-2'>{}</td>
                <td class='py-2 text-right'>{}</td>
                <td class='py-2'>{}</td>
                <td class='py-2 text-center'>
                    <div data-testid='icon-eye' data-bill-url='{}' data-file-name='{}' class='cursor-pointer'
                        hx-get='/bills/preview?url={}&amp;file_name={}' hx-target='#modaleFile .modal-body'
                        hx-on::after-request="document.getElementById('modaleFile').classList.remove('hidden')">&#128065;</div>
                </td>
            </tr>"#,
                escape_html(&bill.expense_type),
                escape_html(&bill.name),
                escape_html(&bill.date),
                format_amount(bill.amount),
                escape_html(&bill.status),
                escape_html(file_url),
                escape_html(file_name),
                urlencoding::encode(file_url),
                urlencoding::encode(file_name),
            )
        })
        .collect();

    format!(
        r#"<table class='w-full text-sm' data-testid='tbody-bills'>
            <thead><tr class='text-left text-gray-500 border-b'>
                <th class='py-2'>Type</th><th class='py-2'>Nom</th><th class='py-2'>Date</th>
                <th class='py-2 text-right'>Montant</th><th class='py-2'>Statut</th><th class='py-2 text-center'>Actions</th>
            </tr></thead>
            <tbody>{}</tbody>
        </table>"#,
        rows
    )
}

fn render_modal() -> String {
    r#"<div id='modaleFile' class='modal hidden fixed inset-0 bg-black bg-opacity-50 z-50 flex items-center justify-center'
            onclick='if(event.target.id === "modaleFile") this.classList.add("hidden")'>
        <div class='bg-white rounded-xl shadow-2xl p-6'>
            <h3 class='text-lg font-bold mb-4'>Justificatif</h3>
            <div class='modal-body'></div>
        </div>
    </div>"#
        .to_string()
}

/// Error view with the store's message
pub fn render_error(message: &str) -> String {
    format!(
        r#"<div class='bg-red-50 border border-red-200 text-red-700 rounded-xl p-6'>
            <h2 class='text-xl font-bold mb-2'>Erreur</h2>
            <div data-testid='error-message'>{}</div>
        </div>"#,
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use axum::http::StatusCode;
    use billed_core::{Bill, BillStatus, MemoryStore};
    use std::sync::Arc;

    fn view(raw_date: &str, name: &str) -> BillView {
        BillView {
            id: None,
            email: "a@a".to_string(),
            expense_type: "Transports".to_string(),
            name: name.to_string(),
            amount: Some(10),
            date: raw_date.to_string(),
            raw_date: raw_date.to_string(),
            vat: String::new(),
            pct: 20,
            commentary: String::new(),
            file_url: None,
            file_name: None,
            status: "En attente".to_string(),
        }
    }

    #[test]
    fn test_rows_most_recent_first() {
        let html = render_bills_table(vec![
            view("2001-01-01", "oldest"),
            view("2004-04-04", "newest"),
            view("2003-03-03", "middle"),
        ]);
        let newest = html.find("newest").unwrap();
        let middle = html.find("middle").unwrap();
        let oldest = html.find("oldest").unwrap();
        assert!(newest < middle && middle < oldest);
        assert!(html.contains("data-file-name='null'"));
    }

    #[test]
    fn test_empty_table() {
        assert!(render_bills_table(Vec::new()).contains("Aucune note de frais"));
    }

    #[tokio::test]
    async fn test_page_renders_store_errors() {
        for message in ["Erreur 404", "Erreur 500"] {
            let state = state();
            state.store.fail_list(Some(message));
            let (status, _, body) = get(&state, "/bills").await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains(message), "missing {}", message);
            assert!(body.contains("data-testid='error-message'"));
        }
    }

    #[tokio::test]
    async fn test_page_lists_bills() {
        let mut bill: Bill = serde_json::from_value(serde_json::json!({
            "id": "b1", "email": "a@a", "type": "Transports", "name": "Vol Paris Londres",
            "amount": 348, "date": "2023-10-10", "status": "pending",
            "fileUrl": "https://x/f.jpg", "fileName": "f.jpg"
        }))
        .unwrap();
        bill.status = BillStatus::Accepted;
        let store = Arc::new(MemoryStore::with_bills("http://files.test", vec![bill]));
        let state = crate::AppState::new(billed_config::Config::default(), store);

        let (status, _, body) = get(&state, "/bills").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Mes notes de frais"));
        assert!(body.contains("10 Oct. 23"));
        assert!(body.contains("Accepté"));
        assert!(body.contains("348 €"));
        assert!(body.contains("data-bill-url='https://x/f.jpg'"));
        assert!(body.contains("data-testid='btn-new-bill'"));
    }
}
