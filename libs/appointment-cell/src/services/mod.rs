pub mod appointment;
pub mod filter;
pub mod lifecycle;
pub mod stats;
pub mod unifier;

pub use appointment::AppointmentService;
pub use filter::{AppointmentFilter, AppointmentView};
pub use lifecycle::AppointmentLifecycleService;
pub use unifier::{unify, AppointmentSources};
