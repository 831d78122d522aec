// libs/appointment-cell/src/services/stats.rs
use chrono::NaiveDate;

use crate::models::{AppointmentStats, DisplayAppointment, ProcessStatus};

/// Front-desk counters over the unified set. `today` is compared against `appointment_date`.
pub fn compute_stats(records: &[DisplayAppointment], today: NaiveDate) -> AppointmentStats {
    let today = today.format("%Y-%m-%d").to_string();
    let is_today = |r: &&DisplayAppointment| r.appointment_date.as_deref() == Some(today.as_str());

    AppointmentStats {
        total_appointments: records.len(),
        pending_approvals: records
            .iter()
            .filter(|r| r.appointment_status == ProcessStatus::Pending)
            .count(),
        today_appointments: records.iter().filter(is_today).count(),
        confirmed_today: records
            .iter()
            .filter(is_today)
            .filter(|r| r.appointment_status == ProcessStatus::Confirmed)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentOrigin, Schedule, VisitType};

    fn record(date: Option<&str>, status: ProcessStatus) -> DisplayAppointment {
        DisplayAppointment {
            id: "x".to_string(),
            origin: AppointmentOrigin::Guest,
            name: "guest".to_string(),
            phone: String::new(),
            email: String::new(),
            visit_type: VisitType::Consultation,
            appointment_status: status,
            created_at: None,
            updated_at: None,
            schedule: Schedule::Afternoon,
            appointment_date: date.map(str::to_string),
            appointment_time: None,
            doctor_name: None,
            category_name: None,
        }
    }

    #[test]
    fn counts_today_and_pending() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let records = vec![
            record(Some("2024-06-01"), ProcessStatus::Confirmed),
            record(Some("2024-06-01"), ProcessStatus::Pending),
            record(Some("2024-06-02"), ProcessStatus::Pending),
            record(None, ProcessStatus::Confirmed),
        ];

        let stats = compute_stats(&records, today);
        assert_eq!(
            stats,
            AppointmentStats {
                total_appointments: 4,
                pending_approvals: 2,
                today_appointments: 2,
                confirmed_today: 1,
            }
        );
    }

    #[test]
    fn empty_set_has_zero_counts() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(compute_stats(&[], today), AppointmentStats::default());
    }
}
