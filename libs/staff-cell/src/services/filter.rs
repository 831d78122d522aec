use shared_models::pagination::{paginate, Page, PageRequest};

use crate::models::{Staff, StaffError, StaffListQuery, StaffRole, StaffStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffFilter {
    pub search: Option<String>,
    pub role: Option<StaffRole>,
    pub status: Option<StaffStatus>,
    pub is_available: Option<bool>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl StaffFilter {
    pub fn from_query(query: &StaffListQuery) -> Result<Self, StaffError> {
        Ok(Self {
            search: present(query.search.as_deref()).map(str::to_lowercase),
            role: present(query.role.as_deref()).map(str::parse::<StaffRole>).transpose()?,
            status: present(query.status.as_deref()).map(str::parse::<StaffStatus>).transpose()?,
            is_available: query.available,
        })
    }

    /// Search hits name, working email or role, case-insensitively.
    pub fn matches(&self, staff: &Staff) -> bool {
        let search_matches = self.search.as_ref().map_or(true, |term| {
            let term = term.to_lowercase();
            staff.full_name.to_lowercase().contains(&term)
                || staff.working_email.to_lowercase().contains(&term)
                || staff.role.as_str().contains(&term)
        });

        search_matches
            && self.role.map_or(true, |role| staff.role == role)
            && self.status.map_or(true, |status| staff.staff_status == status)
            && self.is_available.map_or(true, |available| staff.is_available == available)
    }

    pub fn apply(&self, staff: Vec<Staff>) -> Vec<Staff> {
        staff.into_iter().filter(|s| self.matches(s)).collect()
    }

    pub fn paginate(&self, staff: Vec<Staff>, page: PageRequest) -> Page<Staff> {
        paginate(self.apply(staff), page)
    }
}
