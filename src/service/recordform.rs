use std::fmt;

use tracing::instrument;

use crate::{
    dao::services::{CityService, CountryService},
    model::{
        apperror::{ApplicationError, ErrorType},
        config::FormPolicy,
        models::{City, CityDraft, Country, CountryDraft, CountrySelection, UNSAVED_ID},
    },
};

/**
 * Outcome of a fully successful submission.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    /**
     * The country the cities were attached to.
     */
    pub country_id: i64,
    /**
     * Whether the country was created by this submission.
     */
    pub created_country: bool,
    /**
     * Number of city entries written.
     */
    pub persisted_entries: usize,
}

/**
 * A submission that stopped before all writes were made.
 *
 * Writes made before the failing step are not rolled back.
 */
#[derive(Debug, Clone)]
pub struct SubmissionFailure {
    /**
     * The error of the failing step.
     */
    pub error: ApplicationError,
    /**
     * Id of the country created before the failure.
     */
    pub created_country_id: Option<i64>,
    /**
     * Number of leading city entries already written.
     */
    pub persisted_entries: usize,
}

impl SubmissionFailure {
    fn before_writes(error: ApplicationError) -> Self {
        SubmissionFailure { error, created_country_id: None, persisted_entries: 0 }
    }
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(country_id) = self.created_country_id {
            write!(f, " (country {country_id} was created)")?;
        }
        if self.persisted_entries > 0 {
            write!(f, " ({} city entries were saved)", self.persisted_entries)?;
        }
        Ok(())
    }
}

/**
 * Draft state of the city form.
 *
 * In create mode the cities are attached to a selected country or to a country created first.
 * In edit mode every entry updates the city being edited.
 */
#[derive(Debug, Clone)]
pub struct RecordForm {
    selection: CountrySelection,
    city_drafts: Vec<CityDraft>,
    /**
     * City being edited, `None` in create mode.
     */
    target: Option<City>,
    /**
     * Countries offered by the selector.
     */
    countries: Vec<Country>,
    policy: FormPolicy,
}

impl RecordForm {
    /**
     * Creates an empty form in create mode.
     */
    pub fn new(policy: FormPolicy) -> Self {
        RecordForm { selection: CountrySelection::default(), city_drafts: vec![CityDraft::default()], target: None, countries: vec![], policy }
    }

    /**
     * Creates a form editing the given city.
     */
    pub fn for_city(city: &City, policy: FormPolicy) -> Self {
        RecordForm {
            selection: CountrySelection::Existing(city.country_id),
            city_drafts: vec![CityDraft::from(city)],
            target: Some(city.clone()),
            countries: vec![],
            policy,
        }
    }

    /**
     * Sets the countries offered by the selector.
     */
    pub fn with_countries(mut self, countries: Vec<Country>) -> Self {
        self.countries = countries;
        self
    }

    pub fn selection(&self) -> &CountrySelection {
        &self.selection
    }

    pub fn city_drafts(&self) -> &[CityDraft] {
        &self.city_drafts
    }

    pub fn target(&self) -> Option<&City> {
        self.target.as_ref()
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn is_edit(&self) -> bool {
        self.target.is_some()
    }

    /**
     * The create-country draft, present only while the inline country fields are shown.
     */
    pub fn country_fields(&self) -> Option<&CountryDraft> {
        match &self.selection {
            CountrySelection::New(draft) => Some(draft),
            CountrySelection::Existing(_) => None,
        }
    }

    pub fn select_country(&mut self, country_id: i64) {
        self.selection = CountrySelection::Existing(country_id);
    }

    /**
     * Drops the selected country and opens an empty create-country draft.
     */
    pub fn clear_selection(&mut self) {
        self.selection = CountrySelection::default();
    }

    /**
     * Replaces the create-country draft, switching to create-country mode.
     */
    pub fn update_country_draft(&mut self, draft: CountryDraft) {
        self.selection = CountrySelection::New(draft);
    }

    pub fn set_city_drafts(&mut self, city_drafts: Vec<CityDraft>) {
        self.city_drafts = city_drafts;
    }

    /**
     * Appends a blank city entry.
     */
    pub fn append_city(&mut self) {
        self.city_drafts.push(CityDraft::default());
    }

    /**
     * Removes the city entry at `index`, keeping the order of the others.
     *
     * # Returns
     * `false` if there was no entry at `index`.
     */
    pub fn remove_city(&mut self, index: usize) -> bool {
        if index < self.city_drafts.len() {
            self.city_drafts.remove(index);
            true
        } else {
            false
        }
    }

    /**
     * Discards the draft, returning to an empty create form.
     */
    pub fn reset(&mut self) {
        self.selection = CountrySelection::default();
        self.city_drafts = vec![CityDraft::default()];
        self.target = None;
    }

    /**
     * Checks the draft against the form policy.
     *
     * # Returns
     * A Result indicating success or a `Validation` error.
     */
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.city_drafts.is_empty() && !self.policy.allow_empty_submission {
            return Err(ApplicationError::new(ErrorType::Validation, "At least one city is required".to_string()));
        }
        if self.policy.validate_coordinates {
            for (index, draft) in self.city_drafts.iter().enumerate() {
                if !draft.lat.is_finite() || !(-90.0..=90.0).contains(&draft.lat) {
                    return Err(ApplicationError::new(ErrorType::Validation, format!("City {}: latitude must be between -90 and 90", index + 1)));
                }
                if !draft.lon.is_finite() || !(-180.0..=180.0).contains(&draft.lon) {
                    return Err(ApplicationError::new(ErrorType::Validation, format!("City {}: longitude must be between -180 and 180", index + 1)));
                }
            }
        }
        Ok(())
    }

    /**
     * Submits the draft.
     *
     * Steps run strictly in order: the country is created first when requested, then every city
     * entry is written in list order. The first failing step aborts the remaining ones. When the
     * country was created but a city write failed, the form switches to that country so a retry
     * does not create it again. On success the draft is reset.
     *
     * # Arguments
     * `country_service`: Service used to create the country.
     * `city_service`: Service used to create or update the cities.
     *
     * # Returns
     * A Result containing the `SubmissionReport` or the `SubmissionFailure`.
     */
    #[instrument(level = "info", skip(self, country_service, city_service), fields(edit = self.is_edit(), entries = self.city_drafts.len()))]
    pub async fn submit(&mut self, country_service: &dyn CountryService, city_service: &dyn CityService) -> Result<SubmissionReport, SubmissionFailure> {
        self.validate().map_err(SubmissionFailure::before_writes)?;

        let (country_id, created_country_id) = match &self.selection {
            CountrySelection::Existing(country_id) => (*country_id, None),
            CountrySelection::New(draft) => {
                let country_id = country_service.post_country(Country::from(draft.clone())).await.map_err(SubmissionFailure::before_writes)?;
                tracing::info!("Created country {}", country_id);
                (country_id, Some(country_id))
            }
        };

        let target_id = self.target.as_ref().map(|city| city.id);
        if let Err((persisted_entries, error)) = write_cities(&self.city_drafts, target_id, country_id, city_service).await {
            if let Some(country_id) = created_country_id {
                self.selection = CountrySelection::Existing(country_id);
            }
            return Err(SubmissionFailure { error, created_country_id, persisted_entries });
        }

        let report = SubmissionReport { country_id, created_country: created_country_id.is_some(), persisted_entries: self.city_drafts.len() };
        self.reset();
        Ok(report)
    }
}

/**
 * Writes the entries one after another.
 *
 * # Returns
 * On failure the number of entries written before the failing one and its error.
 */
async fn write_cities(city_drafts: &[CityDraft], target_id: Option<i64>, country_id: i64, city_service: &dyn CityService) -> Result<(), (usize, ApplicationError)> {
    for (index, draft) in city_drafts.iter().enumerate() {
        let city = City::from_draft(target_id.unwrap_or(UNSAVED_ID), draft, country_id);
        let result = match target_id {
            Some(id) => city_service.update_city(id, city).await,
            None => city_service.post_city(city).await,
        };
        result.map_err(|err| {
            tracing::error!("Error saving city entry {}: {}", index, err);
            (index, err)
        })?;
    }
    Ok(())
}
