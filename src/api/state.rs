use std::sync::Arc;

use prometheus::IntCounter;

use crate::{
    dao::services::{CityService, CountryService},
    model::{config::FormPolicy, models::City},
    service::{recordform::RecordForm, recordlist::RecordListView},
};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * Backend access for countries.
     */
    pub country_service: Arc<dyn CountryService>,
    /**
     * Backend access for cities.
     */
    pub city_service: Arc<dyn CityService>,
    /**
     * Validation rules of the city form.
     */
    pub form_policy: FormPolicy,
    /**
     * Counts successful form submissions.
     */
    pub submission_counter: IntCounter,
}

impl AppState {
    /**
     * Creates a new instance of `AppState`.
     *
     * # Arguments
     * `country_service`: Backend access for countries.
     * `city_service`: Backend access for cities.
     * `form_policy`: Validation rules of the city form.
     * `submission_counter`: Counter of successful form submissions.
     */
    pub fn new(country_service: Arc<dyn CountryService>, city_service: Arc<dyn CityService>, form_policy: FormPolicy, submission_counter: IntCounter) -> Self {
        AppState { country_service, city_service, form_policy, submission_counter }
    }

    /**
     * A list view over the shared services. Nothing is loaded yet.
     */
    pub fn list_view(&self) -> RecordListView {
        RecordListView::new(self.country_service.clone(), self.city_service.clone())
    }

    pub fn create_form(&self) -> RecordForm {
        RecordForm::new(self.form_policy.clone())
    }

    pub fn edit_form(&self, city: &City) -> RecordForm {
        RecordForm::for_city(city, self.form_policy.clone())
    }
}
