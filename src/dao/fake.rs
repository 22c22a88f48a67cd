use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    dao::services::{CityService, CountryService},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{City, Country},
    },
};

/**
 * A backend call as seen by the in-memory backend.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    GetCountries,
    PostCountry(Country),
    GetCities,
    PostCity(City),
    UpdateCity(i64, City),
    DeleteCity(i64),
}

#[derive(Default)]
struct Inner {
    countries: Vec<Country>,
    cities: Vec<City>,
    calls: Vec<BackendCall>,
    next_id: i64,
    fail_countries: bool,
    fail_cities: bool,
    fail_post_country: bool,
    /**
     * Zero based index of the city write (post or update) that fails.
     */
    fail_city_write_at: Option<usize>,
    city_writes: usize,
    fail_delete: bool,
}

/**
 * In-memory implementation of both services recording every call.
 */
#[derive(Default)]
pub struct InMemoryBackend {
    inner: Mutex<Inner>,
}

impl InMemoryBackend {
    pub fn new(countries: Vec<Country>, cities: Vec<City>) -> Self {
        let next_id = countries.iter().map(|c| c.id).chain(cities.iter().map(|c| c.id)).max().unwrap_or(0) + 1;
        InMemoryBackend { inner: Mutex::new(Inner { countries, cities, next_id, ..Inner::default() }) }
    }

    pub fn with_next_id(self, next_id: i64) -> Self {
        self.inner.lock().unwrap().next_id = next_id;
        self
    }

    pub fn failing_countries(self) -> Self {
        self.inner.lock().unwrap().fail_countries = true;
        self
    }

    pub fn failing_cities(self) -> Self {
        self.inner.lock().unwrap().fail_cities = true;
        self
    }

    pub fn failing_post_country(self) -> Self {
        self.inner.lock().unwrap().fail_post_country = true;
        self
    }

    pub fn failing_city_write_at(self, index: usize) -> Self {
        self.inner.lock().unwrap().fail_city_write_at = Some(index);
        self
    }

    pub fn failing_delete(self) -> Self {
        self.inner.lock().unwrap().fail_delete = true;
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn cities(&self) -> Vec<City> {
        self.inner.lock().unwrap().cities.clone()
    }

    pub fn countries(&self) -> Vec<Country> {
        self.inner.lock().unwrap().countries.clone()
    }

    fn failure(operation: &str) -> ApplicationError {
        ApplicationError::new(ErrorType::NetworkFailure, format!("Failed to {operation}"))
    }

    fn check_city_write(inner: &mut Inner) -> Result<(), ApplicationError> {
        let index = inner.city_writes;
        inner.city_writes += 1;
        if inner.fail_city_write_at == Some(index) { Err(Self::failure("write city")) } else { Ok(()) }
    }
}

#[async_trait]
impl CountryService for InMemoryBackend {
    async fn get_countries(&self) -> Result<Vec<Country>, ApplicationError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(BackendCall::GetCountries);
        if inner.fail_countries {
            return Err(Self::failure("fetch countries"));
        }
        Ok(inner.countries.clone())
    }

    async fn post_country(&self, country: Country) -> Result<i64, ApplicationError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(BackendCall::PostCountry(country.clone()));
        if inner.fail_post_country {
            return Err(Self::failure("create country"));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.countries.push(Country { id, ..country });
        Ok(id)
    }
}

#[async_trait]
impl CityService for InMemoryBackend {
    async fn get_cities(&self) -> Result<Vec<City>, ApplicationError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(BackendCall::GetCities);
        if inner.fail_cities {
            return Err(Self::failure("fetch cities"));
        }
        Ok(inner.cities.clone())
    }

    async fn post_city(&self, city: City) -> Result<(), ApplicationError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(BackendCall::PostCity(city.clone()));
        Self::check_city_write(&mut inner)?;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.cities.push(City { id, ..city });
        Ok(())
    }

    async fn update_city(&self, id: i64, city: City) -> Result<(), ApplicationError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(BackendCall::UpdateCity(id, city.clone()));
        Self::check_city_write(&mut inner)?;
        match inner.cities.iter_mut().find(|c| c.id == id) {
            Some(existing) => {
                *existing = City { id, ..city };
                Ok(())
            }
            None => Err(ApplicationError::new(ErrorType::NotFound, format!("City {id} not found"))),
        }
    }

    async fn delete_city(&self, id: i64) -> Result<(), ApplicationError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(BackendCall::DeleteCity(id));
        if inner.fail_delete {
            return Err(Self::failure("delete city"));
        }
        inner.cities.retain(|c| c.id != id);
        Ok(())
    }
}
