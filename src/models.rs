use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::StoreError;

/// Date -> member id -> record. Dates sort in calendar order.
pub type AttendanceTable = BTreeMap<NaiveDate, BTreeMap<String, AttendanceRecord>>;

/// Unrecognised roles read back as `Other` so one odd user never drops the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub username: String,
    pub password: String,
}

/// What a successful login hands back: the user without the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub username: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            username: user.username.clone(),
        }
    }
}

/// Plan names are free text in stored rosters; anything beyond the two
/// built-in plans is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MembershipType {
    #[default]
    Monthly,
    Quarterly,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub membership_type: MembershipType,
    pub join_date: NaiveDate,
    pub status: MemberStatus,
}

impl Member {
    /// Placeholder created by the "add member" action; callers edit it afterwards.
    pub fn placeholder(id: String, join_date: NaiveDate) -> Self {
        Self {
            id,
            name: "New Member".to_string(),
            phone: String::new(),
            email: String::new(),
            membership_type: MembershipType::Monthly,
            join_date,
            status: MemberStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    pub fn apply(&mut self, patch: MemberPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(membership_type) = patch.membership_type {
            self.membership_type = membership_type;
        }
        if let Some(join_date) = patch.join_date {
            self.join_date = join_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Partial update for a member. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_type: Option<MembershipType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MemberStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
            Self::Leave => "Leave",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Present" => Ok(Self::Present),
            "Absent" => Ok(Self::Absent),
            "Leave" => Ok(Self::Leave),
            other => Err(StoreError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub status: AttendanceStatus,
    pub marked_by: String,
    #[serde(with = "iso_millis")]
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub date: NaiveDate,
    pub by: String,
    #[serde(with = "iso_millis")]
    pub at: DateTime<Utc>,
}

/// Everything the store owns. Persisted as independent blobs, see `storage`.
#[derive(Debug, Clone, Default)]
pub struct AppData {
    pub users: Vec<User>,
    pub members: Vec<Member>,
    pub attendance: AttendanceTable,
    pub audit: Vec<AuditEntry>,
    pub member_seq: u64,
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamps as `2025-01-01T10:00:00.000Z`; any RFC 3339 string reads back.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|value| value.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberQuery {
    pub query: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// One page of the filtered roster. `page` is clamped into `1..=total_pages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPage {
    pub members: Vec<Member>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAttendanceRequest {
    pub status: String,
    #[serde(default)]
    pub marked_by: Option<String>,
}

/// Body for the bulk actions (mark all present, save). `by` is a user id.
#[derive(Debug, Default, Deserialize)]
pub struct BulkActionRequest {
    #[serde(default)]
    pub by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default, deserialize_with = "blank_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilter {
    pub member: Option<String>,
    #[serde(default, deserialize_with = "blank_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date")]
    pub to: Option<NaiveDate>,
}

/// Query dates where an empty value (`?from=`) means no bound.
fn blank_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPresentPoint {
    pub date: NaiveDate,
    pub present_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberStats {
    pub present: usize,
    pub absent: usize,
    pub leave: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatsResponse {
    pub member_id: String,
    pub window: Vec<NaiveDate>,
    pub stats: MemberStats,
    pub trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWideStat {
    pub member_id: String,
    pub name: String,
    pub pct: u32,
    pub present: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPresentPoint {
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub present: usize,
}

/// One flattened attendance record, as shown in the logs and exported to CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRow {
    pub date: NaiveDate,
    pub member_id: String,
    pub member_name: String,
    pub status: AttendanceStatus,
    pub marked_by: String,
    #[serde(with = "iso_millis")]
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub present: usize,
    pub absent: usize,
    pub leave: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogsResponse {
    pub rows: Vec<LogRow>,
    pub totals: StatusTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSheetRow {
    pub member_id: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSheet {
    pub date: NaiveDate,
    pub rows: Vec<AttendanceSheetRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<AuditEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub today: NaiveDate,
    pub active_members: usize,
    pub pending_members: usize,
    pub present_today: usize,
    pub last_7_days: Vec<DailyPresentPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub last_14_days: Vec<DailyPresentPoint>,
    pub weekly: Vec<WeeklyPresentPoint>,
    pub member_stats: Vec<MemberWideStat>,
    pub top_members: Vec<MemberWideStat>,
}
