// libs/appointment-cell/src/services/unifier.rs
use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::models::{
    AppointmentOrigin, DisplayAppointment, Guest, GuestAppointment, PatientAppointment, PatientName,
};

/// Everything fetched for one unified listing.
#[derive(Debug, Clone, Default)]
pub struct AppointmentSources {
    pub patient_appointments: Vec<PatientAppointment>,
    pub guest_appointments: Vec<GuestAppointment>,
    pub patient_names: HashMap<String, String>,
    pub guest_names: HashMap<String, String>,
}

impl AppointmentSources {
    pub fn new(
        patient_appointments: Vec<PatientAppointment>,
        guest_appointments: Vec<GuestAppointment>,
        patients: Vec<PatientName>,
        guests: Vec<Guest>,
    ) -> Self {
        let patient_names = patients
            .into_iter()
            .filter_map(|p| p.full_name.map(|name| (p.id, name)))
            .collect();
        let guest_names = guests
            .into_iter()
            .filter_map(|g| g.full_name.map(|name| (g.guest_id, name)))
            .collect();

        Self {
            patient_appointments,
            guest_appointments,
            patient_names,
            guest_names,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn resolve_name(
    embedded: Option<&str>,
    key: Option<&str>,
    directory: &HashMap<String, String>,
    origin: AppointmentOrigin,
) -> String {
    non_blank(embedded)
        .or_else(|| non_blank(key.and_then(|k| directory.get(k)).map(String::as_str)))
        .unwrap_or(origin.fallback_name())
        .to_string()
}

impl DisplayAppointment {
    pub fn from_patient(appt: PatientAppointment, patient_names: &HashMap<String, String>) -> Self {
        let name = resolve_name(
            appt.patient_name.as_deref(),
            appt.patient_id.as_deref(),
            patient_names,
            AppointmentOrigin::Patient,
        );

        Self {
            id: appt.appointment_id,
            origin: AppointmentOrigin::Patient,
            name,
            phone: appt.phone,
            email: appt.email,
            visit_type: appt.visit_type,
            appointment_status: appt.appointment_status,
            created_at: appt.created_at,
            updated_at: appt.updated_at,
            schedule: appt.schedule,
            appointment_date: appt.appointment_date,
            appointment_time: appt.appointment_time,
            doctor_name: appt.doctor_name,
            category_name: appt.category_name,
        }
    }

    pub fn from_guest(appt: GuestAppointment, guest_names: &HashMap<String, String>) -> Self {
        let name = resolve_name(
            appt.guest_name.as_deref(),
            appt.guest_id.as_deref(),
            guest_names,
            AppointmentOrigin::Guest,
        );

        Self {
            id: appt.guest_appointment_id,
            origin: AppointmentOrigin::Guest,
            name,
            phone: appt.phone,
            email: appt.email,
            visit_type: appt.visit_type,
            appointment_status: appt.appointment_status,
            created_at: appt.created_at,
            updated_at: appt.updated_at,
            schedule: appt.schedule,
            appointment_date: appt.appointment_date,
            appointment_time: appt.appointment_time,
            doctor_name: appt.doctor_name,
            category_name: appt.category_name,
        }
    }

    /// Creation time used for ordering; missing or unreadable values count as the epoch.
    pub fn created_timestamp(&self) -> DateTime<Utc> {
        self.created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Reads the timestamp shapes Supabase emits for `timestamptz`, `timestamp` and `date` columns.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Orders newest first. Equal timestamps keep their incoming order.
pub fn sort_by_recency(records: &mut [DisplayAppointment]) {
    records.sort_by_cached_key(|record| Reverse(record.created_timestamp()));
}

/// Maps both collections into display rows, tags their origin and merges them newest first.
pub fn unify(sources: AppointmentSources) -> Vec<DisplayAppointment> {
    let AppointmentSources {
        patient_appointments,
        guest_appointments,
        patient_names,
        guest_names,
    } = sources;

    debug!(
        "Unifying {} patient and {} guest appointments",
        patient_appointments.len(),
        guest_appointments.len()
    );

    let mut merged: Vec<DisplayAppointment> =
        Vec::with_capacity(patient_appointments.len() + guest_appointments.len());

    merged.extend(
        patient_appointments
            .into_iter()
            .map(|appt| DisplayAppointment::from_patient(appt, &patient_names)),
    );
    merged.extend(
        guest_appointments
            .into_iter()
            .map(|appt| DisplayAppointment::from_guest(appt, &guest_names)),
    );

    merged.retain(|record| {
        let keep = !record.id.trim().is_empty();
        if !keep {
            warn!("Dropping {} appointment without an identifier", record.origin);
        }
        keep
    });

    sort_by_recency(&mut merged);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProcessStatus, Schedule, VisitType};

    fn patient_appt(id: &str, patient_id: Option<&str>, created_at: Option<&str>) -> PatientAppointment {
        PatientAppointment {
            appointment_id: id.to_string(),
            patient_id: patient_id.map(str::to_string),
            doctor_id: None,
            slot_id: None,
            category_id: None,
            phone: "0900000000".to_string(),
            email: "p@example.com".to_string(),
            visit_type: VisitType::Consultation,
            appointment_status: ProcessStatus::Pending,
            schedule: Schedule::Morning,
            created_at: created_at.map(str::to_string),
            updated_at: None,
            message: None,
            appointment_date: None,
            appointment_time: None,
            preferred_date: None,
            preferred_time: None,
            patient_name: None,
            doctor_name: None,
            category_name: None,
        }
    }

    fn guest_appt(id: &str, created_at: Option<&str>) -> GuestAppointment {
        GuestAppointment {
            guest_appointment_id: id.to_string(),
            guest_id: None,
            slot_id: None,
            doctor_id: None,
            category_id: None,
            phone: "0911111111".to_string(),
            email: "g@example.com".to_string(),
            visit_type: VisitType::Emergency,
            appointment_status: ProcessStatus::Confirmed,
            schedule: Schedule::Evening,
            created_at: created_at.map(str::to_string),
            updated_at: None,
            message: None,
            appointment_date: None,
            appointment_time: None,
            preferred_date: None,
            preferred_time: None,
            guest_name: None,
            doctor_name: None,
            category_name: None,
        }
    }

    fn names(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn merges_both_collections_with_origin_tags() {
        let sources = AppointmentSources {
            patient_appointments: vec![
                patient_appt("p1", Some("pat-1"), Some("2024-06-01T08:00:00Z")),
                patient_appt("p2", None, Some("2024-06-03T08:00:00Z")),
                patient_appt("p3", Some("pat-9"), Some("2024-06-05T08:00:00Z")),
            ],
            guest_appointments: vec![
                guest_appt("g1", Some("2024-06-02T08:00:00Z")),
                guest_appt("g2", Some("2024-06-04T08:00:00Z")),
            ],
            patient_names: names(&[("pat-1", "Nguyen Van A")]),
            guest_names: HashMap::new(),
        };

        let merged = unify(sources);

        assert_eq!(merged.len(), 5);
        for record in &merged {
            let expected = if record.id.starts_with('p') {
                AppointmentOrigin::Patient
            } else {
                AppointmentOrigin::Guest
            };
            assert_eq!(record.origin, expected);
        }

        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "g2", "p2", "g1", "p1"]);
    }

    #[test]
    fn output_is_non_increasing_by_creation_time() {
        let sources = AppointmentSources {
            patient_appointments: vec![
                patient_appt("a", None, Some("2024-01-01T00:00:00+07:00")),
                patient_appt("b", None, None),
                patient_appt("c", None, Some("2024-03-01 10:00:00.123456+00")),
            ],
            guest_appointments: vec![
                guest_appt("d", Some("not a date")),
                guest_appt("e", Some("2024-02-01T00:00:00")),
            ],
            ..Default::default()
        };

        let merged = unify(sources);
        let stamps: Vec<DateTime<Utc>> = merged.iter().map(|r| r.created_timestamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(merged.last().map(|r| r.created_timestamp()), Some(DateTime::UNIX_EPOCH));
    }

    #[test]
    fn ties_keep_patient_records_ahead_of_guests() {
        let same = Some("2024-05-05T05:05:05Z");
        let sources = AppointmentSources {
            patient_appointments: vec![patient_appt("p1", None, same), patient_appt("p2", None, same)],
            guest_appointments: vec![guest_appt("g1", same)],
            ..Default::default()
        };

        let ids: Vec<String> = unify(sources).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["p1", "p2", "g1"]);
    }

    #[test]
    fn missing_names_fall_back_to_literals() {
        let mut blank = patient_appt("p1", Some("pat-1"), None);
        blank.patient_name = Some("   ".to_string());

        let mut embedded_guest = guest_appt("g2", None);
        embedded_guest.guest_name = Some("Walk In".to_string());

        let mut known_guest = guest_appt("g3", None);
        known_guest.guest_id = Some("guest-3".to_string());

        let sources = AppointmentSources {
            patient_appointments: vec![blank],
            guest_appointments: vec![guest_appt("g1", None), embedded_guest, known_guest],
            patient_names: HashMap::new(),
            guest_names: names(&[("guest-3", "Tran Thi B")]),
        };

        let merged = unify(sources);
        let name_of = |id: &str| merged.iter().find(|r| r.id == id).map(|r| r.name.clone());

        assert_eq!(name_of("p1").as_deref(), Some("Unknown"));
        assert_eq!(name_of("g1").as_deref(), Some("guest"));
        assert_eq!(name_of("g2").as_deref(), Some("Walk In"));
        assert_eq!(name_of("g3").as_deref(), Some("Tran Thi B"));
    }

    #[test]
    fn records_without_identifier_are_dropped() {
        let sources = AppointmentSources {
            patient_appointments: vec![patient_appt("", None, None), patient_appt("p1", None, None)],
            guest_appointments: vec![guest_appt("  ", None)],
            ..Default::default()
        };

        let merged = unify(sources);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "p1");
    }

    #[test]
    fn directory_construction_skips_unnamed_rows() {
        let sources = AppointmentSources::new(
            vec![],
            vec![],
            vec![
                PatientName { id: "a".into(), full_name: Some("Alpha".into()) },
                PatientName { id: "b".into(), full_name: None },
            ],
            vec![],
        );

        assert_eq!(sources.patient_names.len(), 1);
        assert_eq!(sources.patient_names.get("a").map(String::as_str), Some("Alpha"));
    }
}
