//! Bill, upload and session records

use serde::{Deserialize, Serialize};

/// Approval status of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Awaiting review
    #[default]
    Pending,
    /// Approved for reimbursement
    Accepted,
    /// Rejected
    Refused,
}

impl std::str::FromStr for BillStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BillStatus::Pending),
            "accepted" => Ok(BillStatus::Accepted),
            "refused" => Ok(BillStatus::Refused),
            _ => Err(format!("Invalid bill status: {}", s)),
        }
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillStatus::Pending => write!(f, "pending"),
            BillStatus::Accepted => write!(f, "accepted"),
            BillStatus::Refused => write!(f, "refused"),
        }
    }
}

/// Expense-report record
///
/// Serialized in the store's camelCase layout. `amount` is `None` when the
/// form value had no integer prefix and then serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default)]
    pub expense_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub vat: String,
    #[serde(default = "default_pct")]
    pub pct: i64,
    #[serde(default)]
    pub commentary: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub status: BillStatus,
}

/// VAT percentage used when the form gives none
pub const DEFAULT_PCT: i64 = 20;

fn default_pct() -> i64 {
    DEFAULT_PCT
}

/// Identifiers returned by the store after a proof upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub key: String,
    pub file_url: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// File chosen in the proof input
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    /// Input value, possibly a browser fake path (`C:\fakepath\photo.jpg`)
    pub path: String,
    pub content_type: Option<String>,
    pub content: bytes::Bytes,
}

impl SelectedFile {
    pub fn new(path: impl Into<String>, content: impl Into<bytes::Bytes>) -> Self {
        Self {
            path: path.into(),
            content_type: None,
            content: content.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// File name without any directory part
    pub fn file_name(&self) -> &str {
        billed_utils::file_name_from_path(&self.path)
    }
}

/// Kind of authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    Employee,
    Admin,
}

/// Identity of the connected user as persisted in session storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub email: String,
}

/// Bill as shown in the list: localized date and status label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    pub id: Option<String>,
    pub email: String,
    #[serde(rename = "type")]
    pub expense_type: String,
    pub name: String,
    pub amount: Option<i64>,
    /// Formatted date, or the raw date when it could not be formatted
    pub date: String,
    /// ISO date as stored, kept for sorting
    pub raw_date: String,
    pub vat: String,
    pub pct: i64,
    pub commentary: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    /// French status label
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bill_serializes_in_store_layout() {
        let bill = Bill {
            id: None,
            email: "a@a".to_string(),
            expense_type: "Transports".to_string(),
            name: "Vol Paris Londres".to_string(),
            amount: Some(348),
            date: "2023-10-10".to_string(),
            vat: "70".to_string(),
            pct: 20,
            commentary: "Voyage d'affaires".to_string(),
            file_url: None,
            file_name: None,
            status: BillStatus::Pending,
        };
        let value = serde_json::to_value(&bill).unwrap();
        assert_eq!(value["type"], json!("Transports"));
        assert_eq!(value["fileUrl"], json!(null));
        assert_eq!(value["status"], json!("pending"));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_bill_deserializes_sparse_record() {
        let bill: Bill = serde_json::from_value(json!({
            "id": "47qAXb6fIm2zOKkLzMro",
            "date": "2021-04-01",
            "status": "refused",
            "type": "restaurant",
            "amount": 50
        }))
        .unwrap();
        assert_eq!(bill.status, BillStatus::Refused);
        assert_eq!(bill.amount, Some(50));
        assert_eq!(bill.pct, DEFAULT_PCT);
        assert!(bill.file_url.is_none());
    }

    #[test]
    fn test_session_parses_user_type() {
        let session: Session =
            serde_json::from_str(r#"{"type":"Employee","email":"a@a"}"#).unwrap();
        assert_eq!(session.user_type, UserType::Employee);
        assert_eq!(session.email, "a@a");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("Accepted".parse::<BillStatus>().unwrap(), BillStatus::Accepted);
        assert!("unknown".parse::<BillStatus>().is_err());
    }
}
