//! Bill list controller
//!
//! Fetches the employee's bills for display, opens the proof preview modal
//! from an icon-eye click and leads to the new bill form.

use crate::error::{CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::format::{format_date, format_status};
use crate::models::{Bill, BillView};
use crate::navigation::{Navigator, Route};
use crate::store::BillStore;
use billed_utils::escape_html;
use std::sync::Arc;

/// File name an icon carries when the bill has no proof
pub const NO_FILE: &str = "null";

/// Data attributes of an icon-eye
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewIcon {
    /// `data-bill-url`
    pub bill_url: String,
    /// `data-file-name`
    pub file_name: String,
}

/// Proof preview modal
pub trait PreviewModal: Send + Sync {
    /// Rendered modal width in pixels
    fn width(&self) -> u32;
    /// Replace the modal body and show it
    fn show(&self, body_html: &str);
}

/// Result of an icon-eye click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewAction {
    /// Modal shown with this body
    Opened { body: String },
    /// Icon without proof
    Ignored,
}

/// User interactions on the bill list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillsEvent {
    IconEyeClicked(PreviewIcon),
    NewBillClicked,
}

/// Bill list controller
pub struct BillsController {
    navigator: Arc<dyn Navigator>,
    store: Option<Arc<dyn BillStore>>,
    modal: Arc<dyn PreviewModal>,
    logger: Arc<dyn ErrorLogger>,
}

impl BillsController {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        store: Option<Arc<dyn BillStore>>,
        modal: Arc<dyn PreviewModal>,
    ) -> Self {
        Self {
            navigator,
            store,
            modal,
            logger: Arc::new(DefaultErrorLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Dispatch a click
    pub fn handle_event(&self, event: BillsEvent) -> Option<PreviewAction> {
        match event {
            BillsEvent::IconEyeClicked(icon) => Some(self.handle_click_icon_eye(&icon)),
            BillsEvent::NewBillClicked => {
                self.handle_click_new_bill();
                None
            }
        }
    }

    pub fn handle_click_new_bill(&self) {
        self.navigator.on_navigate(Route::NewBill);
    }

    /// Show the proof in the modal, at half the modal width
    pub fn handle_click_icon_eye(&self, icon: &PreviewIcon) -> PreviewAction {
        if icon.file_name == NO_FILE {
            return PreviewAction::Ignored;
        }
        let img_width = self.modal.width() / 2;
        let body = format!(
            r#"<div style='text-align: center;' class="bill-proof-container"><img width={} src="{}" alt="Bill" /></div>"#,
            img_width,
            escape_html(&icon.bill_url)
        );
        self.modal.show(&body);
        PreviewAction::Opened { body }
    }

    /// Bills from the store, formatted for display
    ///
    /// Store order is kept. A record whose date cannot be formatted keeps its
    /// raw date. Without a store the list is empty.
    pub async fn get_bills(&self) -> CoreResult<Vec<BillView>> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };

        let bills = store.list().await.map_err(|e| {
            self.logger.log_error(&e, &ErrorContext::new("list bills"));
            e
        })?;

        Ok(bills.into_iter().map(|bill| self.to_view(bill)).collect())
    }

    fn to_view(&self, bill: Bill) -> BillView {
        let date = match format_date(&bill.date) {
            Ok(formatted) => formatted,
            Err(e) => {
                self.logger.log_warning(
                    &format!("{} for bill {:?}", e, bill.id),
                    &ErrorContext::new("format bill").with_user(bill.email.clone()),
                );
                bill.date.clone()
            }
        };
        BillView {
            id: bill.id,
            email: bill.email,
            expense_type: bill.expense_type,
            name: bill.name,
            amount: bill.amount,
            date,
            raw_date: bill.date,
            vat: bill.vat,
            pct: bill.pct,
            commentary: bill.commentary,
            file_url: bill.file_url,
            file_name: bill.file_name,
            status: format_status(bill.status).to_string(),
        }
    }
}
