use crate::errors::StoreError;
use crate::models::{
    AnalyticsResponse, AppData, AttendanceStatus, AttendanceTable, DailyPresentPoint,
    DashboardResponse, LogRow, Member, MemberStats, MemberWideStat, StatusTotals, TrendPoint,
    WeeklyPresentPoint,
};
use chrono::{Duration, NaiveDate, Utc};

const TOP_MEMBER_COUNT: usize = 5;

/// Longest range `daily_present_counts` will expand, in days.
pub const MAX_RANGE_DAYS: i64 = 366;

pub fn present_on(attendance: &AttendanceTable, date: NaiveDate) -> usize {
    attendance
        .get(&date)
        .map(|records| {
            records
                .values()
                .filter(|record| record.status == AttendanceStatus::Present)
                .count()
        })
        .unwrap_or(0)
}

/// Present counts for each date in `from..=to`, calendar order. Ranges
/// longer than `MAX_RANGE_DAYS` are rejected.
pub fn daily_present_counts(
    attendance: &AttendanceTable,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyPresentPoint>, StoreError> {
    if from > to {
        return Err(StoreError::InvalidDateRange { from, to });
    }
    let days = to.signed_duration_since(from).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(StoreError::DateRangeTooLong {
            from,
            to,
            max_days: MAX_RANGE_DAYS,
        });
    }
    Ok(present_series(attendance, from, days as usize))
}

/// The `days` dates ending at `today`.
pub fn last_days(attendance: &AttendanceTable, today: NaiveDate, days: usize) -> Vec<DailyPresentPoint> {
    let start = today - Duration::days(days.saturating_sub(1) as i64);
    present_series(attendance, start, days)
}

fn present_series(attendance: &AttendanceTable, start: NaiveDate, days: usize) -> Vec<DailyPresentPoint> {
    start
        .iter_days()
        .take(days)
        .map(|date| DailyPresentPoint {
            date,
            present_count: present_on(attendance, date),
        })
        .collect()
}

/// Classifies each window date for one member. No record counts as Absent,
/// so the three counts always add up to the window length.
pub fn member_stats(attendance: &AttendanceTable, member_id: &str, window: &[NaiveDate]) -> MemberStats {
    let mut stats = MemberStats {
        present: 0,
        absent: 0,
        leave: 0,
        pct: 0.0,
    };

    for date in window {
        match status_on(attendance, *date, member_id) {
            Some(AttendanceStatus::Present) => stats.present += 1,
            Some(AttendanceStatus::Leave) => stats.leave += 1,
            Some(AttendanceStatus::Absent) | None => stats.absent += 1,
        }
    }

    let counted = (stats.present + stats.absent + stats.leave).max(1);
    stats.pct = round_one_decimal(stats.present as f64 / counted as f64 * 100.0);
    stats
}

pub fn member_trend(attendance: &AttendanceTable, member_id: &str, window: &[NaiveDate]) -> Vec<TrendPoint> {
    window
        .iter()
        .map(|date| TrendPoint {
            date: *date,
            value: match status_on(attendance, *date, member_id) {
                Some(AttendanceStatus::Present) => 1.0,
                Some(AttendanceStatus::Leave) => 0.5,
                Some(AttendanceStatus::Absent) | None => 0.0,
            },
        })
        .collect()
}

/// Per-member attendance over every date that has a record for that member.
/// Unlike `member_stats`, days without a record are left out of `total`.
/// Sorted by `pct`, highest first; ties keep roster order.
pub fn member_wide_stats(members: &[Member], attendance: &AttendanceTable) -> Vec<MemberWideStat> {
    let mut stats: Vec<MemberWideStat> = members
        .iter()
        .map(|member| {
            let mut present = 0;
            let mut total = 0;
            for record in attendance.values().filter_map(|day| day.get(&member.id)) {
                total += 1;
                if record.status == AttendanceStatus::Present {
                    present += 1;
                }
            }
            let pct = if total == 0 {
                0
            } else {
                (present as f64 / total as f64 * 100.0).round() as u32
            };
            MemberWideStat {
                member_id: member.id.clone(),
                name: member.name.clone(),
                pct,
                present,
                total,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.pct.cmp(&a.pct));
    stats
}

/// Present totals over `weeks` rolling 7-day windows ending at `today`,
/// oldest window first.
pub fn weekly_present_totals(attendance: &AttendanceTable, today: NaiveDate, weeks: usize) -> Vec<WeeklyPresentPoint> {
    let mut points: Vec<WeeklyPresentPoint> = (0..weeks)
        .map(|offset| {
            let end = today - Duration::weeks(offset as i64);
            let start = end - Duration::days(6);
            let present = start
                .iter_days()
                .take(7)
                .map(|date| present_on(attendance, date))
                .sum();
            WeeklyPresentPoint {
                label: format!("{}-{}", start.format("%m-%d"), end.format("%m-%d")),
                start_date: start,
                end_date: end,
                present,
            }
        })
        .collect();

    points.reverse();
    points
}

pub fn status_totals(rows: &[LogRow]) -> StatusTotals {
    rows.iter().fold(StatusTotals::default(), |mut totals, row| {
        match row.status {
            AttendanceStatus::Present => totals.present += 1,
            AttendanceStatus::Absent => totals.absent += 1,
            AttendanceStatus::Leave => totals.leave += 1,
        }
        totals
    })
}

pub fn build_dashboard(data: &AppData) -> DashboardResponse {
    build_dashboard_at(Utc::now().date_naive(), data)
}

pub fn build_dashboard_at(today: NaiveDate, data: &AppData) -> DashboardResponse {
    let active_members = data.members.iter().filter(|member| member.is_active()).count();
    DashboardResponse {
        today,
        active_members,
        pending_members: data.members.len() - active_members,
        present_today: present_on(&data.attendance, today),
        last_7_days: last_days(&data.attendance, today, 7),
    }
}

pub fn build_analytics(data: &AppData) -> AnalyticsResponse {
    build_analytics_at(Utc::now().date_naive(), data)
}

pub fn build_analytics_at(today: NaiveDate, data: &AppData) -> AnalyticsResponse {
    let member_stats = member_wide_stats(&data.members, &data.attendance);
    let top_members = member_stats.iter().take(TOP_MEMBER_COUNT).cloned().collect();

    AnalyticsResponse {
        last_14_days: last_days(&data.attendance, today, 14),
        weekly: weekly_present_totals(&data.attendance, today, 4),
        member_stats,
        top_members,
    }
}

fn status_on(attendance: &AttendanceTable, date: NaiveDate, member_id: &str) -> Option<AttendanceStatus> {
    attendance
        .get(&date)
        .and_then(|records| records.get(member_id))
        .map(|record| record.status)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceRecord;
    use crate::store::sample_members;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn mark(attendance: &mut AttendanceTable, date: NaiveDate, member_id: &str, status: AttendanceStatus) {
        attendance.entry(date).or_default().insert(
            member_id.to_string(),
            AttendanceRecord {
                status,
                marked_by: "u-admin".to_string(),
                marked_at: Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap(),
            },
        );
    }

    #[test]
    fn empty_week_yields_seven_zero_days_in_order() {
        let attendance = AttendanceTable::new();
        let points = daily_present_counts(&attendance, day(1), day(7)).unwrap();
        assert_eq!(points.len(), 7);
        assert!(points.iter().all(|point| point.present_count == 0));
        let dates: Vec<_> = points.iter().map(|point| point.date).collect();
        assert_eq!(dates, (1..=7).map(day).collect::<Vec<_>>());
    }

    #[test]
    fn daily_counts_only_count_present() {
        let mut attendance = AttendanceTable::new();
        mark(&mut attendance, day(2), "M-001", AttendanceStatus::Present);
        mark(&mut attendance, day(2), "M-002", AttendanceStatus::Leave);
        mark(&mut attendance, day(2), "M-003", AttendanceStatus::Present);
        mark(&mut attendance, day(3), "M-001", AttendanceStatus::Absent);

        let points = daily_present_counts(&attendance, day(2), day(3)).unwrap();
        assert_eq!(points[0].present_count, 2);
        assert_eq!(points[1].present_count, 0);

        let single = daily_present_counts(&attendance, day(2), day(2)).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = daily_present_counts(&AttendanceTable::new(), day(5), day(1)).unwrap_err();
        assert_eq!(err, StoreError::InvalidDateRange { from: day(5), to: day(1) });
    }

    #[test]
    fn range_length_is_capped() {
        let attendance = AttendanceTable::new();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let leap_year = daily_present_counts(&attendance, from, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()).unwrap();
        assert_eq!(leap_year.len() as i64, MAX_RANGE_DAYS);

        let err = daily_present_counts(&attendance, from, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::DateRangeTooLong { max_days: MAX_RANGE_DAYS, .. }));

        let err = daily_present_counts(&attendance, NaiveDate::MIN, NaiveDate::MAX).unwrap_err();
        assert!(matches!(err, StoreError::DateRangeTooLong { .. }));
    }

    #[test]
    fn range_at_calendar_edges() {
        let attendance = AttendanceTable::new();
        let first = daily_present_counts(&attendance, NaiveDate::MIN, NaiveDate::MIN).unwrap();
        assert_eq!(first.len(), 1);
        let last = daily_present_counts(&attendance, NaiveDate::MAX, NaiveDate::MAX).unwrap();
        assert_eq!(last[0].date, NaiveDate::MAX);
    }

    #[test]
    fn member_stats_treat_missing_as_absent() {
        let mut attendance = AttendanceTable::new();
        mark(&mut attendance, day(1), "M-001", AttendanceStatus::Present);
        mark(&mut attendance, day(2), "M-001", AttendanceStatus::Leave);
        mark(&mut attendance, day(3), "M-002", AttendanceStatus::Present);

        let window = [day(1), day(2), day(3)];
        let stats = member_stats(&attendance, "M-001", &window);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.leave, 1);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.present + stats.absent + stats.leave, window.len());
        assert_eq!(stats.pct, 33.3);

        let trend = member_trend(&attendance, "M-001", &window);
        let values: Vec<_> = trend.iter().map(|point| point.value).collect();
        assert_eq!(values, vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn member_stats_on_empty_window() {
        let stats = member_stats(&AttendanceTable::new(), "M-001", &[]);
        assert_eq!(stats.present + stats.absent + stats.leave, 0);
        assert_eq!(stats.pct, 0.0);
    }

    #[test]
    fn member_wide_stats_ignore_unrecorded_days() {
        let members = sample_members();
        let mut attendance = AttendanceTable::new();
        mark(&mut attendance, day(1), "M-001", AttendanceStatus::Present);
        mark(&mut attendance, day(2), "M-001", AttendanceStatus::Absent);
        mark(&mut attendance, day(3), "M-001", AttendanceStatus::Present);
        mark(&mut attendance, day(1), "M-002", AttendanceStatus::Present);
        mark(&mut attendance, day(9), "M-999", AttendanceStatus::Present);

        let stats = member_wide_stats(&members, &attendance);
        assert_eq!(stats.len(), 3);

        assert_eq!(stats[0].member_id, "M-002");
        assert_eq!((stats[0].pct, stats[0].present, stats[0].total), (100, 1, 1));
        assert_eq!(stats[1].member_id, "M-001");
        assert_eq!((stats[1].pct, stats[1].present, stats[1].total), (67, 2, 3));

        let rohit = &stats[2];
        assert_eq!(rohit.member_id, "M-003");
        assert_eq!((rohit.pct, rohit.present, rohit.total), (0, 0, 0));
    }

    #[test]
    fn weekly_totals_are_rolling_windows_oldest_first() {
        let mut attendance = AttendanceTable::new();
        let today = day(28);
        mark(&mut attendance, today, "M-001", AttendanceStatus::Present);
        mark(&mut attendance, day(22), "M-002", AttendanceStatus::Present);
        mark(&mut attendance, day(21), "M-001", AttendanceStatus::Present);
        mark(&mut attendance, day(1), "M-001", AttendanceStatus::Present);

        let weeks = weekly_present_totals(&attendance, today, 4);
        assert_eq!(weeks.len(), 4);
        let current = &weeks[3];
        assert_eq!(current.start_date, day(22));
        assert_eq!(current.end_date, today);
        assert_eq!(current.label, "01-22-01-28");
        assert_eq!(current.present, 2);
        assert_eq!(weeks[2].present, 1);
        assert_eq!(weeks[0].start_date, day(1));
        assert_eq!(weeks[0].present, 1);
    }

    #[test]
    fn dashboard_counts_today_and_roster() {
        let mut data = AppData {
            members: sample_members(),
            ..AppData::default()
        };
        let today = day(10);
        mark(&mut data.attendance, today, "M-001", AttendanceStatus::Present);
        mark(&mut data.attendance, day(8), "M-002", AttendanceStatus::Present);

        let dashboard = build_dashboard_at(today, &data);
        assert_eq!(dashboard.active_members, 2);
        assert_eq!(dashboard.pending_members, 1);
        assert_eq!(dashboard.present_today, 1);
        assert_eq!(dashboard.last_7_days.len(), 7);
        assert_eq!(dashboard.last_7_days[6].date, today);
        assert_eq!(dashboard.last_7_days[4].present_count, 1);
    }

    #[test]
    fn analytics_series_lengths() {
        let data = AppData {
            members: sample_members(),
            ..AppData::default()
        };
        let analytics = build_analytics_at(day(20), &data);
        assert_eq!(analytics.last_14_days.len(), 14);
        assert_eq!(analytics.weekly.len(), 4);
        assert_eq!(analytics.member_stats.len(), 3);
        assert_eq!(analytics.top_members.len(), 3);
    }
}
