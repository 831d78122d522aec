// libs/analytics-cell/src/services/metrics.rs
use std::cmp::Reverse;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::models::{
    Activity, ActivityKind, AgeBuckets, ChangeDirection, GenderDistribution, Kpi, KpiChange,
    RecentAppointmentRow, RecentPatientRow, Workload,
};

pub const RECENT_ACTIVITY_LIMIT: usize = 8;

/// round(completed / (completed + pending) * 100), 0 when neither occurs.
pub fn completion_ratio<'a>(statuses: impl IntoIterator<Item = &'a str>) -> u32 {
    let (completed, pending) = statuses.into_iter().fold((0u32, 0u32), |(c, p), s| match s {
        "completed" => (c + 1, p),
        "pending" => (c, p + 1),
        _ => (c, p),
    });

    if completed + pending == 0 {
        return 0;
    }
    (f64::from(completed) / f64::from(completed + pending) * 100.0).round() as u32
}

pub fn cancelled_rate<'a>(statuses: impl IntoIterator<Item = &'a str>) -> f64 {
    let (cancelled, total) = statuses
        .into_iter()
        .fold((0usize, 0usize), |(c, t), s| (c + usize::from(s == "cancelled"), t + 1));

    cancelled as f64 / total.max(1) as f64 * 100.0
}

pub fn revenue_sum(amounts: impl IntoIterator<Item = Option<f64>>) -> f64 {
    amounts.into_iter().map(|a| a.unwrap_or(0.0)).sum()
}

/// Calendar-year difference, ignoring whether the birthday has passed.
pub fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    today.year() - date_of_birth.year()
}

fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Patients without a parseable date of birth are left out.
pub fn age_distribution<'a>(
    birth_dates: impl IntoIterator<Item = Option<&'a str>>,
    today: NaiveDate,
) -> AgeBuckets {
    birth_dates
        .into_iter()
        .filter_map(|raw| raw.and_then(parse_birth_date))
        .fold(AgeBuckets::default(), |mut buckets, dob| {
            match age_in_years(dob, today) {
                age if age <= 18 => buckets.children += 1,
                age if age <= 35 => buckets.young_adults += 1,
                age if age <= 50 => buckets.adults += 1,
                _ => buckets.seniors += 1,
            }
            buckets
        })
}

pub fn gender_distribution<'a>(genders: impl IntoIterator<Item = Option<&'a str>>) -> GenderDistribution {
    let mut distribution = GenderDistribution::new();
    for gender in genders {
        let key = gender
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or("unknown");
        *distribution.entry(key.to_string()).or_insert(0) += 1;
    }
    distribution
}

pub fn workload(doctor_count: usize, total_appointments: usize) -> Workload {
    let doctor_count = doctor_count.max(1);
    Workload {
        doctor_count,
        total_appointments,
        per_doctor: (total_appointments as f64 / doctor_count as f64).round() as usize,
    }
}

pub fn kpi_change(current: f64, previous: f64) -> KpiChange {
    if previous == 0.0 {
        return if current > 0.0 {
            KpiChange { percentage: 100.0, direction: ChangeDirection::Increase }
        } else {
            KpiChange { percentage: 0.0, direction: ChangeDirection::Neutral }
        };
    }

    let percentage = ((current - previous) / previous * 1000.0).round() / 10.0;
    let direction = if percentage > 0.0 {
        ChangeDirection::Increase
    } else if percentage < 0.0 {
        ChangeDirection::Decrease
    } else {
        ChangeDirection::Neutral
    };

    KpiChange { percentage, direction }
}

pub fn kpi(current: f64, previous: f64) -> Kpi {
    Kpi {
        value: current,
        previous,
        change: kpi_change(current, previous),
    }
}

fn timestamp_key(raw: Option<&str>) -> i64 {
    raw.and_then(|t| DateTime::parse_from_rfc3339(t.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
        .unwrap_or(0)
}

/// Latest appointments and sign-ups merged into one feed, newest first.
pub fn merge_recent_activity(
    appointments: Vec<RecentAppointmentRow>,
    patients: Vec<RecentPatientRow>,
) -> Vec<Activity> {
    let appointment_items = appointments.into_iter().map(|a| {
        let name = a
            .patient
            .and_then(|p| p.full_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown Patient".to_string());
        Activity {
            kind: ActivityKind::Appointment,
            description: format!("Appointment with {}", name),
            timestamp: a.created_at,
            status: a.appointment_status,
        }
    });

    let patient_items = patients.into_iter().map(|p| Activity {
        kind: ActivityKind::Patient,
        description: format!("New patient: {}", p.full_name.unwrap_or_default()),
        timestamp: p.created_at,
        status: None,
    });

    let mut activity: Vec<Activity> = appointment_items.chain(patient_items).collect();
    activity.sort_by_cached_key(|a| Reverse(timestamp_key(a.timestamp.as_deref())));
    activity.truncate(RECENT_ACTIVITY_LIMIT);
    activity
}
