pub mod filter;
pub mod notifications;
pub mod portal;

pub use filter::DoctorPatientFilter;
pub use portal::DoctorPortalService;
