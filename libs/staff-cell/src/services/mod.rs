pub mod filter;
pub mod staff;

pub use filter::StaffFilter;
pub use staff::StaffService;
