use async_trait::async_trait;
use serde::Deserialize;

use crate::model::{
    apperror::ApplicationError,
    models::{City, Country},
};

/**
 * Access to the country collection of the backend.
 */
#[async_trait]
pub trait CountryService: Send + Sync {
    /**
     * Retrieves all countries.
     */
    async fn get_countries(&self) -> Result<Vec<Country>, ApplicationError>;

    /**
     * Creates a country and returns the id the backend assigned to it.
     */
    async fn post_country(&self, country: Country) -> Result<i64, ApplicationError>;
}

/**
 * Access to the city collection of the backend.
 */
#[async_trait]
pub trait CityService: Send + Sync {
    /**
     * Retrieves all cities.
     */
    async fn get_cities(&self) -> Result<Vec<City>, ApplicationError>;

    /**
     * Creates a city. The id of the given city is ignored by the backend.
     */
    async fn post_city(&self, city: City) -> Result<(), ApplicationError>;

    /**
     * Replaces the city with the given id.
     */
    async fn update_city(&self, id: i64, city: City) -> Result<(), ApplicationError>;

    /**
     * Deletes the city with the given id.
     */
    async fn delete_city(&self, id: i64) -> Result<(), ApplicationError>;
}

/**
 * List response body of the backend, `{"data": [...]}`.
 */
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    /**
     * A missing or null list is read as empty.
     */
    pub data: Option<Vec<T>>,
}

impl<T> DataEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        self.data.unwrap_or_default()
    }
}

/**
 * Create response body of the backend, `{"id": n}`.
 */
#[derive(Debug, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}
