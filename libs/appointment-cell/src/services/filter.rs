// libs/appointment-cell/src/services/filter.rs
use shared_models::pagination::{paginate, total_pages, Page, PageRequest};

use crate::models::{AppointmentError, AppointmentListQuery, DisplayAppointment, ProcessStatus, VisitType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub search: Option<String>,
    pub visit_type: Option<VisitType>,
    pub status: Option<ProcessStatus>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AppointmentFilter {
    /// Empty query values mean "any", matching an unselected dropdown.
    pub fn from_query(query: &AppointmentListQuery) -> Result<Self, AppointmentError> {
        Ok(Self {
            search: present(query.search.as_deref()).map(str::to_string),
            visit_type: present(query.visit_type.as_deref()).map(str::parse::<VisitType>).transpose()?,
            status: present(query.status.as_deref()).map(str::parse::<ProcessStatus>).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.visit_type.is_none() && self.status.is_none()
    }

    pub fn matches(&self, record: &DisplayAppointment) -> bool {
        let name_matches = match &self.search {
            Some(term) => record.name.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        };

        name_matches
            && self.visit_type.map_or(true, |vt| record.visit_type == vt)
            && self.status.map_or(true, |st| record.appointment_status == st)
    }

    pub fn apply(&self, records: Vec<DisplayAppointment>) -> Vec<DisplayAppointment> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// One screen's worth of unified appointments: the merged set, its filtered subset and the cursor.
#[derive(Debug, Clone)]
pub struct AppointmentView {
    records: Vec<DisplayAppointment>,
    filtered: Vec<DisplayAppointment>,
    current_page: usize,
    page_size: usize,
}

impl AppointmentView {
    pub fn new(records: Vec<DisplayAppointment>, page_size: usize) -> Self {
        Self {
            filtered: records.clone(),
            records,
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Replaces the filter and rewinds to the first page.
    pub fn apply_filter(&mut self, filter: AppointmentFilter) {
        self.filtered = filter.apply(self.records.clone());
        self.current_page = 1;
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered.len(), self.page_size)
    }

    /// Jumps to an explicit page. Pages past the end are allowed and render empty.
    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn first_page(&mut self) {
        self.current_page = 1;
    }

    pub fn previous_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    pub fn next_page(&mut self) {
        if self.current_page < self.total_pages() {
            self.current_page += 1;
        }
    }

    pub fn last_page(&mut self) {
        self.current_page = self.total_pages().max(1);
    }

    pub fn page(&self) -> Page<DisplayAppointment> {
        paginate(
            self.filtered.clone(),
            PageRequest::new(self.current_page, self.page_size),
        )
    }

    pub fn into_page(self) -> Page<DisplayAppointment> {
        paginate(self.filtered, PageRequest::new(self.current_page, self.page_size))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::models::{AppointmentOrigin, Schedule};

    fn record(id: &str, name: &str, visit_type: VisitType, status: ProcessStatus) -> DisplayAppointment {
        DisplayAppointment {
            id: id.to_string(),
            origin: AppointmentOrigin::Patient,
            name: name.to_string(),
            phone: String::new(),
            email: String::new(),
            visit_type,
            appointment_status: status,
            created_at: None,
            updated_at: None,
            schedule: Schedule::Morning,
            appointment_date: None,
            appointment_time: None,
            doctor_name: None,
            category_name: None,
        }
    }

    fn sample() -> Vec<DisplayAppointment> {
        vec![
            record("1", "Nguyen Van An", VisitType::Consultation, ProcessStatus::Pending),
            record("2", "Tran Thi Binh", VisitType::FollowUp, ProcessStatus::Confirmed),
            record("3", "guest", VisitType::Emergency, ProcessStatus::Pending),
            record("4", "Le Van Cuong", VisitType::Consultation, ProcessStatus::Completed),
            record("5", "Unknown", VisitType::RoutineCheckup, ProcessStatus::Cancelled),
        ]
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let filter = AppointmentFilter {
            search: Some("VAN".to_string()),
            ..Default::default()
        };
        let ids: Vec<String> = filter.apply(sample()).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn predicates_combine() {
        let filter = AppointmentFilter {
            search: None,
            visit_type: Some(VisitType::Consultation),
            status: Some(ProcessStatus::Pending),
        };
        let ids: Vec<String> = filter.apply(sample()).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn absent_status_yields_nothing() {
        let filter = AppointmentFilter {
            status: Some(ProcessStatus::NoShow),
            ..Default::default()
        };
        assert!(filter.apply(sample()).is_empty());
    }

    #[test]
    fn empty_query_values_are_ignored() {
        let query = AppointmentListQuery {
            search: Some("  ".to_string()),
            visit_type: Some(String::new()),
            status: Some("pending".to_string()),
            ..Default::default()
        };
        let filter = AppointmentFilter::from_query(&query).unwrap();
        assert!(filter.search.is_none());
        assert!(filter.visit_type.is_none());
        assert_eq!(filter.status, Some(ProcessStatus::Pending));
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        let query = AppointmentListQuery {
            status: Some("in_progress".to_string()),
            ..Default::default()
        };
        assert_matches!(
            AppointmentFilter::from_query(&query),
            Err(AppointmentError::ValidationError(_))
        );
    }

    #[test]
    fn pending_filter_fits_on_one_page() {
        let mut view = AppointmentView::new(sample(), 10);
        view.apply_filter(AppointmentFilter {
            status: Some(ProcessStatus::Pending),
            ..Default::default()
        });

        let page = view.page();
        assert_eq!(view.total_pages(), 1);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|r| r.appointment_status == ProcessStatus::Pending));
    }

    #[test]
    fn changing_the_filter_rewinds_to_page_one() {
        let mut view = AppointmentView::new(sample(), 2);
        view.next_page();
        view.next_page();
        assert_eq!(view.current_page(), 3);

        view.next_page();
        assert_eq!(view.current_page(), 3);

        view.apply_filter(AppointmentFilter {
            search: Some("n".to_string()),
            ..Default::default()
        });
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn navigation_stays_within_bounds() {
        let mut view = AppointmentView::new(sample(), 2);
        view.previous_page();
        assert_eq!(view.current_page(), 1);

        view.last_page();
        assert_eq!(view.current_page(), 3);
        assert_eq!(view.page().items.len(), 1);

        view.first_page();
        assert_eq!(view.page().items.len(), 2);
    }

    #[test]
    fn explicit_page_past_the_end_is_empty() {
        let mut view = AppointmentView::new(sample(), 2);
        view.go_to_page(9);

        let page = view.into_page();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn last_view_on_empty_set_is_page_one() {
        let mut view = AppointmentView::new(Vec::new(), 10);
        view.last_page();
        assert_eq!(view.current_page(), 1);
        assert_eq!(view.total_pages(), 0);
    }
}
