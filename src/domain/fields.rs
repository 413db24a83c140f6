use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Goal,
    Milestone,
    Task,
    ChecklistItem,
    Note,
    Category,
}

impl IdKind {
    fn prefix(self) -> &'static str {
        match self {
            IdKind::Goal => "G",
            IdKind::Milestone => "M",
            IdKind::Task => "T",
            IdKind::ChecklistItem => "C",
            IdKind::Note => "N",
            IdKind::Category => "CAT",
        }
    }
}

pub fn new_id(kind: IdKind) -> String {
    format!("{}-{}", kind.prefix(), Uuid::now_v7())
}

const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00.000000000Z";

pub fn now_utc_rfc3339() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

/// RFC3339 in UTC with a fixed nine digit fraction, so stored timestamps
/// compare as text in chronological order.
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
        ))
        .unwrap_or_else(|_| EPOCH_TIMESTAMP.to_string())
}

/// Re-renders a user supplied RFC3339 timestamp in UTC; `None` when it does
/// not parse.
pub fn normalize_datetime(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|ts| ts.to_offset(UtcOffset::UTC).format(&Rfc3339).ok())
}

pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
