// libs/doctor-cell/src/services/notifications.rs
use crate::models::{patient_name, Notification, NotificationAppointment, NotificationRow};

pub fn notification_title(kind: &str) -> &'static str {
    match kind {
        "appointment_created" => "New Appointment",
        "appointment_updated" => "Appointment Updated",
        "appointment_cancelled" => "Appointment Cancelled",
        "appointment_reminder" => "Appointment Reminder",
        _ => "Notification",
    }
}

pub fn notification_message(kind: &str, appointment: Option<&NotificationAppointment>) -> String {
    let name = patient_name(appointment.and_then(|a| a.patient.as_ref()));
    let date = appointment
        .and_then(|a| a.appointment_date.as_deref())
        .unwrap_or("Unknown Date");

    match kind {
        "appointment_created" => format!("New appointment with {} on {}", name, date),
        "appointment_updated" => format!("Appointment with {} has been updated", name),
        "appointment_cancelled" => format!("Appointment with {} has been cancelled", name),
        "appointment_reminder" => format!("Reminder: Appointment with {} on {}", name, date),
        _ => "You have a new notification".to_string(),
    }
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        let title = notification_title(&row.notification_type).to_string();
        let message = notification_message(&row.notification_type, row.appointment.as_ref());

        Self {
            notification_id: row.notification_id,
            notification_type: row.notification_type,
            sent_at: row.sent_at,
            is_read: row.is_read,
            title,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientNameRef;

    fn appointment(name: Option<&str>, date: Option<&str>) -> NotificationAppointment {
        NotificationAppointment {
            appointment_date: date.map(str::to_string),
            patient: Some(PatientNameRef { full_name: name.map(str::to_string) }),
        }
    }

    #[test]
    fn known_kinds_get_their_own_wording() {
        let appt = appointment(Some("Bui Thanh"), Some("2024-06-12"));

        assert_eq!(notification_title("appointment_created"), "New Appointment");
        assert_eq!(
            notification_message("appointment_created", Some(&appt)),
            "New appointment with Bui Thanh on 2024-06-12"
        );
        assert_eq!(
            notification_message("appointment_cancelled", Some(&appt)),
            "Appointment with Bui Thanh has been cancelled"
        );
        assert_eq!(
            notification_message("appointment_reminder", Some(&appt)),
            "Reminder: Appointment with Bui Thanh on 2024-06-12"
        );
    }

    #[test]
    fn missing_details_use_placeholders() {
        assert_eq!(
            notification_message("appointment_created", None),
            "New appointment with Unknown Patient on Unknown Date"
        );
        assert_eq!(notification_title("system"), "Notification");
        assert_eq!(notification_message("system", None), "You have a new notification");
    }
}
