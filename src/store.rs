//! The attendance store: roster, date-indexed attendance and the audit trail.
//!
//! All operations are synchronous and work on the one in-memory copy of the
//! data. Persisting the touched blobs is the caller's job (see `handlers`).

use crate::errors::StoreError;
use crate::models::{
    AnalyticsResponse, AppData, AttendanceRecord, AttendanceSheet, AttendanceSheetRow,
    AttendanceStatus, AttendanceTable, AuditEntry, DailyPresentPoint, DashboardResponse,
    LogFilter, LogRow, Member, MemberPage, MemberPatch, MemberStats, MemberStatus, MemberWideStat,
    MembershipType, Role, TrendPoint, User, format_timestamp,
};
use crate::stats;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Member profile pages look back over this many recorded dates.
pub const DEFAULT_PROFILE_WINDOW: usize = 30;

/// Who marked a record when the caller did not say.
pub const UNKNOWN_USER: &str = "unknown";

/// Roster page size used when the caller does not pick one.
pub const DEFAULT_PER_PAGE: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct AttendanceStore {
    data: AppData,
}

impl AttendanceStore {
    pub fn new(mut data: AppData) -> Self {
        data.member_seq = data.member_seq.max(highest_member_seq(&data.members));
        Self { data }
    }

    pub fn members(&self) -> &[Member] {
        &self.data.members
    }

    pub fn attendance(&self) -> &AttendanceTable {
        &self.data.attendance
    }

    /// Newest first.
    pub fn audit(&self) -> &[AuditEntry] {
        &self.data.audit
    }

    pub fn member_seq(&self) -> u64 {
        self.data.member_seq
    }

    /// Exact username and password match. Not a security boundary.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&User> {
        self.data
            .users
            .iter()
            .find(|user| user.username == username && user.password == password)
    }

    /// Roster in storage order, optionally narrowed by a case-insensitive
    /// substring of the name or id.
    pub fn list_members(&self, query: Option<&str>) -> Vec<Member> {
        let needle = query.unwrap_or_default().to_lowercase();
        self.data
            .members
            .iter()
            .filter(|member| {
                needle.is_empty()
                    || member.name.to_lowercase().contains(&needle)
                    || member.id.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// `list_members` cut into pages. Out-of-range pages are clamped to the
    /// nearest one, and an empty roster still has one (empty) page.
    pub fn member_page(&self, query: Option<&str>, page: usize, per_page: usize) -> MemberPage {
        let matched = self.list_members(query);
        let per_page = per_page.max(1);
        let total = matched.len();
        let total_pages = total.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);

        MemberPage {
            members: matched.into_iter().skip((page - 1) * per_page).take(per_page).collect(),
            page,
            per_page,
            total_pages,
            total,
        }
    }

    pub fn member(&self, id: &str) -> Result<&Member, StoreError> {
        self.data
            .members
            .iter()
            .find(|member| member.id == id)
            .ok_or_else(|| StoreError::MemberNotFound(id.to_string()))
    }

    pub fn add_member(&mut self) -> Member {
        self.add_member_on(today())
    }

    /// Prepends a placeholder member with the next id from the sequence.
    /// Ids are never reused, even after deletions.
    pub fn add_member_on(&mut self, join_date: NaiveDate) -> Member {
        let id = loop {
            self.data.member_seq += 1;
            let candidate = member_id(self.data.member_seq);
            if !self.data.members.iter().any(|member| member.id == candidate) {
                break candidate;
            }
        };

        let member = Member::placeholder(id, join_date);
        self.data.members.insert(0, member.clone());
        member
    }

    pub fn update_member(&mut self, id: &str, patch: MemberPatch) -> Result<Member, StoreError> {
        let member = self
            .data
            .members
            .iter_mut()
            .find(|member| member.id == id)
            .ok_or_else(|| StoreError::MemberNotFound(id.to_string()))?;
        member.apply(patch);
        Ok(member.clone())
    }

    /// Removes the member from the roster. Their attendance history stays.
    pub fn delete_member(&mut self, id: &str) -> Result<Member, StoreError> {
        let index = self
            .data
            .members
            .iter()
            .position(|member| member.id == id)
            .ok_or_else(|| StoreError::MemberNotFound(id.to_string()))?;
        Ok(self.data.members.remove(index))
    }

    pub fn record(&self, date: NaiveDate, member_id: &str) -> Option<&AttendanceRecord> {
        self.data.attendance.get(&date)?.get(member_id)
    }

    pub fn set_attendance(
        &mut self,
        date: NaiveDate,
        member_id: &str,
        status: AttendanceStatus,
        marked_by: &str,
    ) -> Result<AttendanceRecord, StoreError> {
        self.set_attendance_at(date, member_id, status, marked_by, Utc::now())
    }

    pub fn set_attendance_at(
        &mut self,
        date: NaiveDate,
        member_id: &str,
        status: AttendanceStatus,
        marked_by: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, StoreError> {
        self.member(member_id)?;

        let record = AttendanceRecord {
            status,
            marked_by: marked_by.to_string(),
            marked_at: now,
        };
        self.data
            .attendance
            .entry(date)
            .or_default()
            .insert(member_id.to_string(), record.clone());
        Ok(record)
    }

    pub fn mark_all_present(&mut self, date: NaiveDate, marked_by: &str) -> usize {
        self.mark_all_present_at(date, marked_by, Utc::now())
    }

    /// Marks every currently active member present on `date`. Records of
    /// inactive members for that date are left as they are.
    pub fn mark_all_present_at(&mut self, date: NaiveDate, marked_by: &str, now: DateTime<Utc>) -> usize {
        let day = self.data.attendance.entry(date).or_default();
        let mut marked = 0;
        for member in self.data.members.iter().filter(|member| member.is_active()) {
            day.insert(
                member.id.clone(),
                AttendanceRecord {
                    status: AttendanceStatus::Present,
                    marked_by: marked_by.to_string(),
                    marked_at: now,
                },
            );
            marked += 1;
        }
        marked
    }

    pub fn record_audit(&mut self, date: NaiveDate, by: &str) -> AuditEntry {
        self.record_audit_at(date, by, Utc::now())
    }

    /// Appends a save confirmation for `date`. Attendance itself is untouched.
    pub fn record_audit_at(&mut self, date: NaiveDate, by: &str, now: DateTime<Utc>) -> AuditEntry {
        let entry = AuditEntry {
            id: audit_id(),
            date,
            by: by.to_string(),
            at: now,
        };
        self.data.audit.insert(0, entry.clone());
        entry
    }

    /// The last `n` dates that carry any attendance data, oldest first.
    pub fn recorded_dates_window(&self, n: usize) -> Vec<NaiveDate> {
        let dates: Vec<NaiveDate> = self.data.attendance.keys().copied().collect();
        let skip = dates.len().saturating_sub(n);
        dates[skip..].to_vec()
    }

    /// Active members with their status on `date`; unrecorded reads as Absent.
    pub fn attendance_sheet(&self, date: NaiveDate) -> AttendanceSheet {
        let day = self.data.attendance.get(&date);
        let rows = self
            .data
            .members
            .iter()
            .filter(|member| member.is_active())
            .map(|member| {
                let record = day.and_then(|records| records.get(&member.id));
                AttendanceSheetRow {
                    member_id: member.id.clone(),
                    name: member.name.clone(),
                    status: record.map_or(AttendanceStatus::Absent, |record| record.status),
                    recorded: record.is_some(),
                    marked_by: record.map(|record| record.marked_by.clone()),
                    marked_at: record.map(|record| format_timestamp(&record.marked_at)),
                }
            })
            .collect();

        AttendanceSheet {
            date,
            rows,
            last_saved: self.data.audit.first().cloned(),
        }
    }

    /// Every record flattened into rows, newest date first.
    pub fn log_rows(&self, filter: &LogFilter) -> Vec<LogRow> {
        let member_filter = filter.member.as_deref().filter(|id| !id.is_empty());

        self.data
            .attendance
            .iter()
            .rev()
            .filter(|(date, _)| filter.from.is_none_or(|from| **date >= from))
            .filter(|(date, _)| filter.to.is_none_or(|to| **date <= to))
            .flat_map(|(date, records)| {
                records
                    .iter()
                    .filter(move |(member_id, _)| member_filter.is_none_or(|id| id == member_id.as_str()))
                    .map(move |(member_id, record)| LogRow {
                        date: *date,
                        member_id: member_id.clone(),
                        member_name: self.member_name(member_id),
                        status: record.status,
                        marked_by: record.marked_by.clone(),
                        marked_at: record.marked_at,
                    })
            })
            .collect()
    }

    fn member_name(&self, id: &str) -> String {
        self.member(id).map(|member| member.name.clone()).unwrap_or_default()
    }

    pub fn daily_present_counts(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyPresentPoint>, StoreError> {
        stats::daily_present_counts(&self.data.attendance, from, to)
    }

    pub fn member_stats(&self, member_id: &str, window: &[NaiveDate]) -> MemberStats {
        stats::member_stats(&self.data.attendance, member_id, window)
    }

    pub fn member_trend(&self, member_id: &str, window: &[NaiveDate]) -> Vec<TrendPoint> {
        stats::member_trend(&self.data.attendance, member_id, window)
    }

    pub fn member_wide_stats(&self) -> Vec<MemberWideStat> {
        stats::member_wide_stats(&self.data.members, &self.data.attendance)
    }

    pub fn dashboard(&self) -> DashboardResponse {
        stats::build_dashboard(&self.data)
    }

    pub fn analytics(&self) -> AnalyticsResponse {
        stats::build_analytics(&self.data)
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn member_id(seq: u64) -> String {
    format!("M-{seq:03}")
}

fn highest_member_seq(members: &[Member]) -> u64 {
    members
        .iter()
        .filter_map(|member| member.id.strip_prefix("M-"))
        .filter_map(|digits| digits.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

fn audit_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(7);
    id.to_uppercase()
}

pub fn default_users() -> Vec<User> {
    vec![
        User {
            id: "u-admin".to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
            username: "admin".to_string(),
            password: "admin".to_string(),
        },
        User {
            id: "u-staff".to_string(),
            name: "Staff".to_string(),
            role: Role::Staff,
            username: "staff".to_string(),
            password: "staff".to_string(),
        },
    ]
}

pub fn sample_members() -> Vec<Member> {
    let sample = |id: &str, name: &str, phone: &str, email: &str, kind, joined: (i32, u32, u32), status| Member {
        id: id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
        membership_type: kind,
        join_date: NaiveDate::from_ymd_opt(joined.0, joined.1, joined.2).unwrap_or_default(),
        status,
    };

    vec![
        sample(
            "M-001",
            "Amit Patel",
            "+91 98765 43210",
            "amit@example.com",
            MembershipType::Monthly,
            (2025, 8, 1),
            MemberStatus::Active,
        ),
        sample(
            "M-002",
            "Sneha Desai",
            "+91 91234 56789",
            "sneha@example.com",
            MembershipType::Quarterly,
            (2025, 6, 15),
            MemberStatus::Active,
        ),
        sample(
            "M-003",
            "Rohit Sharma",
            "+91 99887 66554",
            "rohit@example.com",
            MembershipType::Monthly,
            (2025, 11, 1),
            MemberStatus::Inactive,
        ),
    ]
}
