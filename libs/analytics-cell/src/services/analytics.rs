// libs/analytics-cell/src/services/analytics.rs
use chrono::NaiveDate;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Activity, AgeBuckets, AmountRow, AnalyticsError, BirthDateRow, DashboardStats, DateRange,
    GenderDistribution, GenderRow, KpiReport, PendingCounts, RecentAppointmentRow,
    RecentPatientRow, StatusRow, Workload, shift_days,
};
use crate::services::metrics;

fn day_start(date: NaiveDate) -> String {
    urlencoding::encode(&format!("{}T00:00:00+00:00", date.format("%Y-%m-%d"))).into_owned()
}

fn day_end(date: NaiveDate) -> String {
    urlencoding::encode(&format!("{}T23:59:59+00:00", date.format("%Y-%m-%d"))).into_owned()
}

/// `created_at` bounds for an inclusive day range.
pub fn created_between(range: &DateRange) -> String {
    format!(
        "created_at=gte.{}&created_at=lte.{}",
        day_start(range.start),
        day_end(range.end)
    )
}

fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct AnalyticsService {
    supabase: SupabaseClient,
}

impl AnalyticsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn rows<T>(&self, path: &str, auth_token: &str) -> Result<Vec<T>, AnalyticsError>
    where
        T: DeserializeOwned,
    {
        self.supabase
            .request::<Vec<T>>(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| {
                error!("Analytics query {} failed: {}", path, e);
                AnalyticsError::DatabaseError(e.to_string())
            })
    }

    async fn count(&self, path: &str, auth_token: &str) -> Result<u64, AnalyticsError> {
        self.supabase.count(path, Some(auth_token)).await.map_err(|e| {
            error!("Count query {} failed: {}", path, e);
            AnalyticsError::DatabaseError(e.to_string())
        })
    }

    async fn rpc<T>(&self, function: &str, params: Value, auth_token: &str) -> Result<T, AnalyticsError>
    where
        T: DeserializeOwned,
    {
        debug!("Calling RPC {} with {}", function, params);
        self.supabase
            .rpc(function, params, Some(auth_token))
            .await
            .map_err(|e| {
                error!("RPC {} failed: {}", function, e);
                AnalyticsError::DatabaseError(e.to_string())
            })
    }

    pub async fn appointments_count(&self, range: &DateRange, auth_token: &str) -> Result<u64, AnalyticsError> {
        let path = format!("/rest/v1/appointments?{}", created_between(range));
        self.count(&path, auth_token).await
    }

    pub async fn new_patients_count(&self, range: &DateRange, auth_token: &str) -> Result<u64, AnalyticsError> {
        let path = format!("/rest/v1/patients?{}", created_between(range));
        self.count(&path, auth_token).await
    }

    pub async fn revenue(&self, range: &DateRange, auth_token: &str) -> Result<f64, AnalyticsError> {
        let path = format!("/rest/v1/receipts?select=amount&{}", created_between(range));
        let rows: Vec<AmountRow> = self.rows(&path, auth_token).await?;
        Ok(metrics::revenue_sum(rows.into_iter().map(|r| r.amount)))
    }

    pub async fn appointment_statuses(
        &self,
        range: &DateRange,
        auth_token: &str,
    ) -> Result<Vec<String>, AnalyticsError> {
        let path = format!(
            "/rest/v1/appointments?select=appointment_status&{}",
            created_between(range)
        );
        let rows: Vec<StatusRow> = self.rows(&path, auth_token).await?;
        Ok(rows.into_iter().map(|r| r.appointment_status).collect())
    }

    /// Headline numbers for the range, each compared with the preceding window of equal length.
    pub async fn kpis(&self, range: DateRange, auth_token: &str) -> Result<KpiReport, AnalyticsError> {
        let previous = range.previous()?;
        debug!("Computing KPIs for {:?} against {:?}", range, previous);

        let (appointments, previous_appointments, patients, previous_patients) = futures::try_join!(
            self.appointments_count(&range, auth_token),
            self.appointments_count(&previous, auth_token),
            self.new_patients_count(&range, auth_token),
            self.new_patients_count(&previous, auth_token),
        )?;

        let (revenue, previous_revenue, statuses) = futures::try_join!(
            self.revenue(&range, auth_token),
            self.revenue(&previous, auth_token),
            self.appointment_statuses(&range, auth_token),
        )?;

        Ok(KpiReport {
            range,
            previous_range: previous,
            appointments: metrics::kpi(appointments as f64, previous_appointments as f64),
            new_patients: metrics::kpi(patients as f64, previous_patients as f64),
            revenue: metrics::kpi(revenue, previous_revenue),
            completion_ratio: metrics::completion_ratio(statuses.iter().map(String::as_str)),
            cancelled_rate: metrics::cancelled_rate(statuses.iter().map(String::as_str)),
        })
    }

    pub async fn age_distribution(&self, today: NaiveDate, auth_token: &str) -> Result<AgeBuckets, AnalyticsError> {
        let rows: Vec<BirthDateRow> = self
            .rows("/rest/v1/patients?select=date_of_birth", auth_token)
            .await?;
        Ok(metrics::age_distribution(
            rows.iter().map(|r| r.date_of_birth.as_deref()),
            today,
        ))
    }

    pub async fn gender_distribution(&self, auth_token: &str) -> Result<GenderDistribution, AnalyticsError> {
        let rows: Vec<GenderRow> = self.rows("/rest/v1/patients?select=gender", auth_token).await?;
        Ok(metrics::gender_distribution(rows.iter().map(|r| r.gender.as_deref())))
    }

    pub async fn workload(&self, auth_token: &str) -> Result<Workload, AnalyticsError> {
        let (doctors, appointments) = futures::try_join!(
            self.count("/rest/v1/staff_members?role=eq.doctor", auth_token),
            self.count("/rest/v1/appointments", auth_token),
        )?;
        Ok(metrics::workload(doctors as usize, appointments as usize))
    }

    pub async fn pending_counts(&self, today: NaiveDate, auth_token: &str) -> Result<PendingCounts, AnalyticsError> {
        let tomorrow = shift_days(today, 1)?;
        let today_path = format!(
            "/rest/v1/appointments?appointment_status=eq.pending&appointment_date=eq.{}",
            ymd(today)
        );
        let upcoming_path = format!(
            "/rest/v1/appointments?appointment_status=eq.pending&appointment_date=gte.{}",
            ymd(tomorrow)
        );

        let (total, today, upcoming) = futures::try_join!(
            self.count("/rest/v1/appointments?appointment_status=eq.pending", auth_token),
            self.count(&today_path, auth_token),
            self.count(&upcoming_path, auth_token),
        )?;

        Ok(PendingCounts { total, today, upcoming })
    }

    pub async fn dashboard(&self, today: NaiveDate, auth_token: &str) -> Result<DashboardStats, AnalyticsError> {
        let today_path = format!("/rest/v1/appointments?appointment_date=eq.{}", ymd(today));

        let (today_appointments, pending_appointments, total_patients, total_staff) = futures::try_join!(
            self.count(&today_path, auth_token),
            self.count("/rest/v1/appointments?appointment_status=eq.pending", auth_token),
            self.count("/rest/v1/patients", auth_token),
            self.count("/rest/v1/staff_members", auth_token),
        )?;

        // Revenue is best-effort on the dashboard
        let today_revenue = match self.daily_revenue(today, auth_token).await {
            Ok(revenue) => revenue,
            Err(e) => {
                warn!("Daily revenue unavailable, reporting 0: {}", e);
                0.0
            }
        };

        Ok(DashboardStats {
            today_appointments,
            pending_appointments,
            total_patients,
            total_staff,
            today_revenue,
        })
    }

    pub async fn recent_activity(&self, auth_token: &str) -> Result<Vec<Activity>, AnalyticsError> {
        let (appointments, patients) = futures::try_join!(
            self.rows::<RecentAppointmentRow>(
                "/rest/v1/appointments?select=appointment_id,created_at,appointment_status,patient:patients(full_name)&order=created_at.desc&limit=5",
                auth_token,
            ),
            self.rows::<RecentPatientRow>(
                "/rest/v1/patients?select=id,full_name,created_at&order=created_at.desc&limit=3",
                auth_token,
            ),
        )?;

        Ok(metrics::merge_recent_activity(appointments, patients))
    }

    pub async fn patients_by_month(&self, year: i32, month: u32, auth_token: &str) -> Result<i64, AnalyticsError> {
        if !(1..=12).contains(&month) {
            return Err(AnalyticsError::ValidationError(format!("Invalid month: {}", month)));
        }
        let count: Option<i64> = self
            .rpc(
                "count_patients_by_month",
                json!({ "target_year": year, "target_month": month }),
                auth_token,
            )
            .await?;
        Ok(count.unwrap_or(0))
    }

    pub async fn appointments_by_day(&self, date: NaiveDate, auth_token: &str) -> Result<i64, AnalyticsError> {
        let count: Option<i64> = self
            .rpc("count_appointments_by_day", json!({ "target_date": ymd(date) }), auth_token)
            .await?;
        Ok(count.unwrap_or(0))
    }

    pub async fn daily_revenue(&self, date: NaiveDate, auth_token: &str) -> Result<f64, AnalyticsError> {
        let revenue: Option<f64> = self
            .rpc("calculate_daily_revenue", json!({ "target_date": ymd(date) }), auth_token)
            .await?;
        Ok(revenue.unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_between_encodes_both_bounds() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
        )
        .unwrap();

        assert_eq!(
            created_between(&range),
            "created_at=gte.2024-06-01T00%3A00%3A00%2B00%3A00&created_at=lte.2024-06-07T23%3A59%3A59%2B00%3A00"
        );
    }
}
