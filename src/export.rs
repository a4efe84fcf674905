use crate::models::{LogRow, format_timestamp};
use chrono::NaiveDate;

pub const CSV_HEADER: [&str; 6] = ["date", "memberId", "memberName", "status", "markedBy", "markedAt"];

/// Header first, every field double-quoted with inner quotes doubled, rows
/// joined by `\n` with no trailing newline.
pub fn logs_to_csv(rows: &[LogRow]) -> Vec<u8> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(csv_line(CSV_HEADER));

    for row in rows {
        lines.push(csv_line([
            row.date.to_string().as_str(),
            row.member_id.as_str(),
            row.member_name.as_str(),
            row.status.as_str(),
            row.marked_by.as_str(),
            format_timestamp(&row.marked_at).as_str(),
        ]));
    }

    lines.join("\n").into_bytes()
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("attendance_{today}.csv")
}

fn csv_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(quote_field)
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use chrono::{TimeZone, Utc};

    fn row(member_name: &str) -> LogRow {
        LogRow {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            member_id: "M-001".to_string(),
            member_name: member_name.to_string(),
            status: AttendanceStatus::Present,
            marked_by: "u-admin".to_string(),
            marked_at: Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn exports_header_and_quoted_rows() {
        let csv = String::from_utf8(logs_to_csv(&[row("Amit Patel")])).unwrap();
        assert_eq!(
            csv,
            "\"date\",\"memberId\",\"memberName\",\"status\",\"markedBy\",\"markedAt\"\n\
             \"2025-01-01\",\"M-001\",\"Amit Patel\",\"Present\",\"u-admin\",\"2025-01-01T10:00:00.000Z\""
        );
    }

    #[test]
    fn doubles_embedded_quotes() {
        let csv = String::from_utf8(logs_to_csv(&[row("Amit \"Big A\" Patel, Jr")])).unwrap();
        let line = csv.lines().nth(1).unwrap();
        assert!(line.contains("\"Amit \"\"Big A\"\" Patel, Jr\""));
    }

    #[test]
    fn empty_export_is_just_the_header() {
        let csv = String::from_utf8(logs_to_csv(&[])).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn file_name_uses_iso_date() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert_eq!(export_file_name(today), "attendance_2026-10-15.csv");
    }
}
