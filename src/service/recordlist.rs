use std::sync::Arc;

use tracing::{Instrument, instrument};

use crate::{
    dao::services::{CityService, CountryService},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{City, CityRow, Country},
    },
};

/**
 * Shown instead of a country name when the referenced country is not loaded.
 */
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/**
 * Resolves the name of a country by linear scan of the loaded countries.
 *
 * # Arguments
 * `country_id`: The id referenced by a city.
 * `countries`: The loaded countries.
 *
 * # Returns
 * The country name or `UNKNOWN_COUNTRY` when there is no country with that id.
 */
pub fn join(country_id: i64, countries: &[Country]) -> &str {
    countries.iter().find(|country| country.id == country_id).map_or(UNKNOWN_COUNTRY, |country| country.name.as_str())
}

/**
 * Holds the loaded cities and countries and the city currently being edited.
 */
pub struct RecordListView {
    country_service: Arc<dyn CountryService>,
    city_service: Arc<dyn CityService>,
    cities: Vec<City>,
    countries: Vec<Country>,
    /**
     * City shown in the edit form, if any.
     */
    editing: Option<City>,
}

impl RecordListView {
    /**
     * Creates an empty view. Nothing is fetched until `load` is called.
     */
    pub fn new(country_service: Arc<dyn CountryService>, city_service: Arc<dyn CityService>) -> Self {
        RecordListView { country_service, city_service, cities: vec![], countries: vec![], editing: None }
    }

    /**
     * Fetches cities and countries concurrently. A failed fetch leaves that collection empty.
     */
    #[instrument(level = "debug", skip(self))]
    pub async fn load(&mut self) {
        let span = tracing::Span::current();
        let (cities, countries) = futures_util::join!(
            self.city_service.get_cities().instrument(span.clone()),
            self.country_service.get_countries().instrument(span)
        );
        self.cities = or_empty(cities, "cities");
        self.countries = or_empty(countries, "countries");
    }

    /**
     * Fetches the cities again, keeping the loaded countries.
     */
    #[instrument(level = "debug", skip(self))]
    pub async fn reload_cities(&mut self) {
        let cities = self.city_service.get_cities().await;
        self.cities = or_empty(cities, "cities");
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn country_name(&self, country_id: i64) -> &str {
        join(country_id, &self.countries)
    }

    /**
     * The loaded cities in list order with their country names resolved.
     */
    pub fn rows(&self) -> Vec<CityRow> {
        self.cities
            .iter()
            .map(|city| CityRow { id: city.id, name: city.name.clone(), lat: city.lat, lon: city.lon, country_name: self.country_name(city.country_id).to_string() })
            .collect()
    }

    pub fn editing(&self) -> Option<&City> {
        self.editing.as_ref()
    }

    /**
     * Makes the given city the edit target.
     */
    pub fn edit(&mut self, city: City) {
        tracing::debug!("Editing city {}", city.id);
        self.editing = Some(city);
    }

    /**
     * Makes the loaded city with the given id the edit target.
     *
     * # Returns
     * A Result indicating success or a `NotFound` error if the city is not loaded.
     */
    pub fn edit_by_id(&mut self, id: i64) -> Result<(), ApplicationError> {
        let city = self.cities.iter().find(|city| city.id == id).cloned().ok_or_else(|| ApplicationError::new(ErrorType::NotFound, format!("City {id} not found")))?;
        self.edit(city);
        Ok(())
    }

    /**
     * Clears the edit target without writing anything.
     */
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /**
     * Called after the edit form submitted successfully. Clears the edit target and reloads the cities.
     */
    pub async fn complete_edit(&mut self) {
        if let Some(city) = self.editing.take() {
            tracing::debug!("Finished editing city {}", city.id);
        }
        self.reload_cities().await;
    }

    /**
     * Deletes the city with the given id, then reloads the city list whether or not the delete succeeded.
     *
     * # Returns
     * The result of the delete call.
     */
    #[instrument(level = "info", skip(self))]
    pub async fn delete(&mut self, id: i64) -> Result<(), ApplicationError> {
        let result = self.city_service.delete_city(id).await;
        if let Err(err) = &result {
            tracing::error!("Error deleting city {}: {}", id, err);
        }
        if self.editing.as_ref().is_some_and(|city| city.id == id) {
            self.editing = None;
        }
        self.reload_cities().await;
        result
    }
}

fn or_empty<T>(result: Result<Vec<T>, ApplicationError>, collection: &str) -> Vec<T> {
    match result {
        Ok(items) => {
            tracing::debug!("Loaded {} {}", items.len(), collection);
            items
        }
        Err(err) => {
            tracing::error!("Error fetching {}: {}", collection, err);
            vec![]
        }
    }
}
