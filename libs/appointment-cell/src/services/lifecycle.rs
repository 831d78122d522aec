// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, ProcessStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status change is allowed. Re-applying the current status is accepted.
    pub fn validate_status_transition(
        &self,
        current_status: ProcessStatus,
        new_status: ProcessStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == new_status {
            return Ok(());
        }

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: ProcessStatus) -> Vec<ProcessStatus> {
        match current_status {
            ProcessStatus::Pending => vec![
                ProcessStatus::Confirmed,
                ProcessStatus::Completed,
                ProcessStatus::Cancelled,
                ProcessStatus::NoShow,
            ],
            ProcessStatus::Confirmed => vec![
                ProcessStatus::Pending,
                ProcessStatus::Completed,
                ProcessStatus::Cancelled,
                ProcessStatus::NoShow,
            ],
            // Terminal states
            ProcessStatus::Completed | ProcessStatus::Cancelled | ProcessStatus::NoShow => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
