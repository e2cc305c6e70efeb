//! French display formatting for bill dates and statuses

use crate::error::{CoreError, CoreResult};
use crate::models::BillStatus;
use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Jui", "Jui", "Aoû", "Sep", "Oct", "Nov", "Déc",
];

/// Format an ISO date as `1 Avr. 21`
pub fn format_date(value: &str) -> CoreResult<String> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CoreError::InvalidDate {
            value: value.to_string(),
        }
    })?;
    let month = MONTHS[date.month0() as usize];
    Ok(format!("{} {}. {:02}", date.day(), month, date.year().rem_euclid(100)))
}

/// French label of a status
pub fn format_status(status: BillStatus) -> &'static str {
    match status {
        BillStatus::Pending => "En attente",
        BillStatus::Accepted => "Accepté",
        BillStatus::Refused => "Refusé",
    }
}
