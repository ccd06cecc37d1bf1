use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::search::repo::HistoryEntry;

/// Request body for saving a search query.
#[derive(Debug, Deserialize)]
pub struct SaveSearchRequest {
    pub query: String,
}

/// One history item as returned to the client.
#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub query: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<HistoryEntry> for HistoryItem {
    fn from(e: HistoryEntry) -> Self {
        Self {
            query: e.query,
            timestamp: e.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    #[test]
    fn history_item_exposes_query_and_timestamp_only() {
        let item: HistoryItem = HistoryEntry {
            id: 42,
            user_id: Uuid::new_v4(),
            query: "naruto".into(),
            created_at: datetime!(2024-03-01 12:00:00 UTC),
        }
        .into();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["query"], "naruto");
        assert_eq!(json["timestamp"], "2024-03-01T12:00:00Z");
        assert!(json.get("user_id").is_none());
    }
}
