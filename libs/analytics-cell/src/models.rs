// libs/analytics-cell/src/models.rs
use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// QUERIES
// ==============================================================================

/// Moves a date by whole days, rejecting results outside the calendar chrono can represent.
pub fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate, AnalyticsError> {
    date.checked_add_signed(Duration::days(days)).ok_or_else(|| {
        AnalyticsError::ValidationError(format!("Date {} is out of range", date))
    })
}

/// Inclusive creation-date window, in whole UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyticsError> {
        if start > end {
            return Err(AnalyticsError::ValidationError(format!(
                "Range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The window of equal length ending the day before this one starts.
    pub fn previous(&self) -> Result<Self, AnalyticsError> {
        let end = shift_days(self.start, -1)?;
        let start = shift_days(end, 1 - self.days())?;
        Ok(Self { start, end })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeQuery {
    /// Missing bounds default to the 30 days ending today.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange, AnalyticsError> {
        let end = self.end.unwrap_or(today);
        let start = match self.start {
            Some(start) => start,
            None => shift_days(end, -29)?,
        };
        DateRange::new(start, end)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

impl DayQuery {
    pub fn or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

// ==============================================================================
// REPORTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Increase,
    Decrease,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct KpiChange {
    pub percentage: f64,
    pub direction: ChangeDirection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Kpi {
    pub value: f64,
    pub previous: f64,
    pub change: KpiChange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiReport {
    pub range: DateRange,
    pub previous_range: DateRange,
    pub appointments: Kpi,
    pub new_patients: Kpi,
    pub revenue: Kpi,
    pub completion_ratio: u32,
    pub cancelled_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeBuckets {
    #[serde(rename = "0-18")]
    pub children: usize,
    #[serde(rename = "19-35")]
    pub young_adults: usize,
    #[serde(rename = "36-50")]
    pub adults: usize,
    #[serde(rename = "51+")]
    pub seniors: usize,
}

impl AgeBuckets {
    pub fn total(&self) -> usize {
        self.children + self.young_adults + self.adults + self.seniors
    }
}

pub type GenderDistribution = BTreeMap<String, usize>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workload {
    pub doctor_count: usize,
    pub total_appointments: usize,
    pub per_doctor: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingCounts {
    pub total: u64,
    pub today: u64,
    pub upcoming: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub today_appointments: u64,
    pub pending_appointments: u64,
    pub total_patients: u64,
    pub total_staff: u64,
    pub today_revenue: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Appointment,
    Patient,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ==============================================================================
// ROW PROJECTIONS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRow {
    pub appointment_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmountRow {
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BirthDateRow {
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenderRow {
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientNameRef {
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentAppointmentRow {
    pub appointment_id: String,
    pub created_at: Option<String>,
    pub appointment_status: Option<String>,
    pub patient: Option<PatientNameRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentPatientRow {
    pub id: String,
    pub full_name: Option<String>,
    pub created_at: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn previous_range_has_equal_length() {
        let range = DateRange::new(day(2024, 6, 8), day(2024, 6, 14)).unwrap();
        let previous = range.previous().unwrap();

        assert_eq!(previous, DateRange { start: day(2024, 6, 1), end: day(2024, 6, 7) });
        assert_eq!(previous.days(), range.days());
    }

    #[test]
    fn single_day_range_steps_back_one_day() {
        let range = DateRange::new(day(2024, 3, 1), day(2024, 3, 1)).unwrap();
        assert_eq!(
            range.previous().unwrap(),
            DateRange { start: day(2024, 2, 29), end: day(2024, 2, 29) }
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(DateRange::new(day(2024, 6, 2), day(2024, 6, 1)).is_err());
    }

    #[test]
    fn dates_at_the_calendar_edge_are_rejected() {
        let query: RangeQuery =
            serde_json::from_value(serde_json::json!({ "start": "-262143-01-01", "end": "-262143-01-10" }))
                .unwrap();
        let range = query.resolve(day(2024, 6, 30)).unwrap();
        assert_matches!(range.previous(), Err(AnalyticsError::ValidationError(_)));

        let open_start = RangeQuery { start: None, end: Some(NaiveDate::MIN) };
        assert_matches!(open_start.resolve(day(2024, 6, 30)), Err(AnalyticsError::ValidationError(_)));

        assert_matches!(shift_days(NaiveDate::MAX, 1), Err(AnalyticsError::ValidationError(_)));
    }

    #[test]
    fn range_query_defaults_to_last_thirty_days() {
        let range = RangeQuery::default().resolve(day(2024, 6, 30)).unwrap();
        assert_eq!(range.start, day(2024, 6, 1));
        assert_eq!(range.days(), 30);
    }
}
