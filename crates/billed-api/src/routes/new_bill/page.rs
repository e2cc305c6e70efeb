//! New bill page rendering
//!
//! Endpoints:
//! - page_new_bill: "Envoyer une note de frais" form

use crate::AppState;
use billed_utils::escape_html;

/// Expense types offered by the form
pub const EXPENSE_TYPES: [&str; 7] = [
    "Transports",
    "Restaurants et bars",
    "Hôtel et logement",
    "Services en ligne",
    "IT et électronique",
    "Equipement et matériel",
    "Fournitures de bureau",
];

/// New bill page
pub async fn page_new_bill(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let content = render_new_bill_form(&state.config.upload.allowed_extensions, &[]);
    axum::response::Html(crate::page_response(&headers, "Envoyer une note de frais", "/bills/new", &content))
}

/// Form with the named fields, alerts shown above it
pub fn render_new_bill_form(allowed_extensions: &[String], alerts: &[String]) -> String {
    let options: String = EXPENSE_TYPES
        .iter()
        .map(|t| format!("<option>{}</option>", escape_html(t)))
        .collect();
    let accept: Vec<String> = allowed_extensions.iter().map(|e| format!(".{}", e)).collect();
    let alerts: String = alerts
        .iter()
        .map(|a| {
            format!(
                "<div role='alert' class='mb-4 p-3 rounded-lg bg-yellow-50 border border-yellow-200 text-yellow-800'>{}</div>",
                escape_html(a)
            )
        })
        .collect();

    format!(
        r#"<h2 class='text-2xl font-bold mb-4'>Envoyer une note de frais</h2>
        {}
        <form data-testid='form-new-bill' method='post' action='/bills/new' class='bg-white rounded-xl shadow-sm p-6 grid grid-cols-2 gap-4'>
            <label class='flex flex-col'>Type de dépense
                <select required name='expense-type' data-testid='expense-type' class='border rounded-lg px-3 py-2'>{}</select>
            </label>
            <label class='flex flex-col'>Nom de la dépense
                <input type='text' name='expense-name' data-testid='expense-name' placeholder='Vol Paris Londres' class='border rounded-lg px-3 py-2'>
            </label>
            <label class='flex flex-col'>Date
                <input required type='date' name='datepicker' data-testid='datepicker' class='border rounded-lg px-3 py-2'>
            </label>
            <label class='flex flex-col'>Montant TTC
                <input required type='number' name='amount' data-testid='amount' placeholder='348' class='border rounded-lg px-3 py-2'>
            </label>
            <label class='flex flex-col'>TVA
                <span class='flex gap-2'>
                    <input type='number' name='vat' data-testid='vat' placeholder='70' class='border rounded-lg px-3 py-2 w-1/2'>
                    <input type='number' name='pct' data-testid='pct' placeholder='20' class='border rounded-lg px-3 py-2 w-1/2'> %
                </span>
            </label>
            <label class='flex flex-col'>Commentaire
                <textarea name='commentary' data-testid='commentary' rows='3' class='border rounded-lg px-3 py-2'></textarea>
            </label>
            <label class='flex flex-col col-span-2'>Justificatif
                <input required type='file' name='file' data-testid='file' accept='{}' onchange='uploadProof(this)' class='border rounded-lg px-3 py-2'>
                <span id='file-status' class='text-sm text-gray-500'></span>
            </label>
            <div class='col-span-2'>
                <button type='submit' id='btn-send-bill' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Envoyer</button>
            </div>
        </form>
        <script>
        function uploadProof(input) {{
            if (!input.files.length) return;
            const data = new FormData();
            data.append('file', input.files[0], input.value.split(/\\/g).pop());
            const status = document.getElementById('file-status');
            status.textContent = 'Envoi...';
            fetch('/bills/new/file', {{method: 'POST', body: data}})
                .then(r => r.json())
                .then(res => {{
                    if (res.clearFileInput) input.value = '';
                    (res.alerts || []).forEach(a => alert(a));
                    status.textContent = res.outcome === 'uploaded' ? res.upload.fileName : '';
                }})
                .catch(e => {{ status.textContent = ''; console.error(e); }});
        }}
        </script>"#,
        alerts,
        options,
        accept.join(","),
    )
}
