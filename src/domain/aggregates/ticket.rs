//! Support ticket aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// `resolved_at` to store alongside this status.
    pub fn resolved_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self == Self::Resolved).then_some(now)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketRow {
    pub id: i64,
    pub user_id: Uuid,
    pub issue_type: String,
    pub description: String,
    pub transaction_reference: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub supporting_files: Vec<String>,
    pub status: String,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/tickets`.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTicketRequest {
    #[validate(length(min = 1))]
    pub issue_type: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub transaction_reference: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub supporting_files: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub issue_type: String,
    pub description: String,
    pub transaction_reference: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub supporting_files: Vec<String>,
}

impl NewTicketRequest {
    pub fn into_ticket(self, user_id: Uuid) -> NewTicket {
        NewTicket {
            user_id,
            issue_type: self.issue_type,
            description: self.description,
            transaction_reference: self.transaction_reference,
            contact_phone: self.phone,
            contact_email: self.email,
            supporting_files: self.supporting_files,
        }
    }
}

/// Body of `PUT /api/tickets/{id}`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct TicketStatusUpdate { pub status: TicketStatus }

/// Acknowledgement body returned by ticket writes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TicketAck { pub status: u16, pub message: &'static str }

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolved_stamps_time() {
        let now = Utc::now();
        assert_eq!(TicketStatus::Resolved.resolved_at(now), Some(now));
        assert_eq!(TicketStatus::InProgress.resolved_at(now), None);
    }

    #[test]
    fn test_status_round_trip_names() {
        for s in [TicketStatus::Open, TicketStatus::InProgress, TicketStatus::Resolved, TicketStatus::Closed] {
            assert_eq!(serde_json::from_value::<TicketStatus>(json!(s.as_str())).unwrap(), s);
        }
        assert!(serde_json::from_value::<TicketStatusUpdate>(json!({"status": "escalated"})).is_err());
    }

    #[test]
    fn test_new_ticket_validation() {
        let req: NewTicketRequest = serde_json::from_value(json!({
            "issueType": "refund", "description": "Jar arrived cracked", "email": "not-an-email"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
