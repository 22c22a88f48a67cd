use std::time::Duration;

use async_trait::async_trait;
use prometheus::IntCounter;
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::instrument;

use crate::{
    dao::services::{CityService, CountryService, CreatedResponse, DataEnvelope},
    model::{
        apperror::{ApplicationError, ErrorType},
        config::BackendConfig,
        models::{City, Country},
    },
};

/**
 * REST client for the backend holding the country and city collections.
 */
pub struct BackendClient {
    /**
     * Shared http client.
     */
    client: Client,
    /**
     * Base url without trailing slash.
     */
    base_url: String,
    countries_path: String,
    cities_path: String,
    /**
     * Optional bearer token added to every request.
     */
    bearer_token: Option<String>,
    /**
     * Incremented for every failed backend call.
     */
    failure_counter: Option<IntCounter>,
}

impl BackendClient {
    /**
     * Creates a new instance of `BackendClient`.
     *
     * # Arguments
     * `config`: The backend configuration.
     *
     * # Returns
     * A Result containing the client or an `ApplicationError` if the http client could not be built.
     */
    pub fn new(config: &BackendConfig) -> Result<Self, ApplicationError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create http client: {err}")))?;
        Ok(BackendClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            countries_path: config.countries_path.clone(),
            cities_path: config.cities_path.clone(),
            bearer_token: config.bearer_token.clone(),
            failure_counter: None,
        })
    }

    /**
     * Registers a counter incremented on every failed backend call.
     */
    pub fn with_failure_counter(mut self, failure_counter: IntCounter) -> Self {
        self.failure_counter = Some(failure_counter);
        self
    }

    fn countries_url(&self) -> String {
        format!("{}{}", self.base_url, self.countries_path)
    }

    fn cities_url(&self) -> String {
        format!("{}{}", self.base_url, self.cities_path)
    }

    fn city_url(&self, id: i64) -> String {
        format!("{}{}/{id}", self.base_url, self.cities_path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /**
     * Sends the request and turns transport errors and non-2xx statuses into `NetworkFailure`.
     */
    async fn send(&self, builder: RequestBuilder, operation: &str) -> Result<Response, ApplicationError> {
        builder
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|err| self.network_error(operation, &err))
    }

    fn network_error(&self, operation: &str, err: &reqwest::Error) -> ApplicationError {
        if let Some(counter) = &self.failure_counter {
            counter.inc();
        }
        tracing::warn!("Backend call {} failed: {}", operation, err);
        match err.status() {
            Some(status) => ApplicationError::new(ErrorType::NetworkFailure, format!("Failed to {operation}: backend responded {status}")),
            None => ApplicationError::new(ErrorType::NetworkFailure, format!("Failed to {operation}: {err}")),
        }
    }
}

#[async_trait]
impl CountryService for BackendClient {
    #[instrument(level = "debug", skip(self))]
    async fn get_countries(&self) -> Result<Vec<Country>, ApplicationError> {
        let response = self.send(self.request(Method::GET, &self.countries_url()), "fetch countries").await?;
        let envelope: DataEnvelope<Country> = response.json().await.map_err(|err| self.network_error("read countries", &err))?;
        Ok(envelope.into_items())
    }

    #[instrument(level = "debug", skip(self))]
    async fn post_country(&self, country: Country) -> Result<i64, ApplicationError> {
        let response = self.send(self.request(Method::POST, &self.countries_url()).json(&country), "create country").await?;
        let created: CreatedResponse = response.json().await.map_err(|err| self.network_error("read created country", &err))?;
        Ok(created.id)
    }
}

#[async_trait]
impl CityService for BackendClient {
    #[instrument(level = "debug", skip(self))]
    async fn get_cities(&self) -> Result<Vec<City>, ApplicationError> {
        let response = self.send(self.request(Method::GET, &self.cities_url()), "fetch cities").await?;
        let envelope: DataEnvelope<City> = response.json().await.map_err(|err| self.network_error("read cities", &err))?;
        Ok(envelope.into_items())
    }

    #[instrument(level = "debug", skip(self))]
    async fn post_city(&self, city: City) -> Result<(), ApplicationError> {
        self.send(self.request(Method::POST, &self.cities_url()).json(&city), "create city").await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn update_city(&self, id: i64, city: City) -> Result<(), ApplicationError> {
        self.send(self.request(Method::PUT, &self.city_url(id)).json(&city), "update city").await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_city(&self, id: i64) -> Result<(), ApplicationError> {
        self.send(self.request(Method::DELETE, &self.city_url(id)), "delete city").await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn backend_config(base_url: &str) -> BackendConfig {
        BackendConfig { base_url: base_url.to_string(), countries_path: "/countries".to_string(), cities_path: "/cities".to_string(), timeout_ms: 1000, bearer_token: None }
    }

    #[test]
    fn test_urls_without_trailing_slash() {
        let client = BackendClient::new(&backend_config("http://localhost:9000/api/")).unwrap();
        assert_eq!(client.countries_url(), "http://localhost:9000/api/countries");
        assert_eq!(client.cities_url(), "http://localhost:9000/api/cities");
        assert_eq!(client.city_url(42), "http://localhost:9000/api/cities/42");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_failure() {
        let counter = IntCounter::new("test_backend_failures", "Backend failures").unwrap();
        let client = BackendClient::new(&backend_config("http://127.0.0.1:1")).unwrap().with_failure_counter(counter.clone());
        let result = client.get_cities().await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::NetworkFailure);
        assert_eq!(counter.get(), 1);
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;

    #[tokio::test]
    async fn test_list_countries_and_cities() {
        let client = init_client();
        assert!(client.get_countries().await.is_ok());
        assert!(client.get_cities().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_update_then_delete_city() {
        let client = init_client();
        let country = Country::new(0, "Integration Country".to_string(), "IC".to_string(), "ICY".to_string(), 0);
        let country_id = client.post_country(country).await.unwrap();
        let city = City::new(0, "Integration City".to_string(), 10.0, 20.0, country_id);
        client.post_city(city.clone()).await.unwrap();
        let cities = client.get_cities().await.unwrap();
        let created = cities.iter().find(|c| c.name == "Integration City" && c.country_id == country_id).unwrap();
        let updated = City::new(created.id, "Integration City Renamed".to_string(), 11.0, 21.0, country_id);
        client.update_city(created.id, updated).await.unwrap();
        client.delete_city(created.id).await.unwrap();
        let cities = client.get_cities().await.unwrap();
        assert!(cities.iter().all(|c| c.id != created.id));
    }

    /**
     * Initialize the backend client from `.env-test`.
     */
    fn init_client() -> BackendClient {
        dotenv::from_filename("./.env-test").ok();
        let config = BackendConfig {
            base_url: dotenv::var("BACKEND_URL").unwrap(),
            countries_path: "/countries".to_string(),
            cities_path: "/cities".to_string(),
            timeout_ms: 5000,
            bearer_token: dotenv::var("BACKEND_TOKEN").ok(),
        };
        BackendClient::new(&config).unwrap()
    }
}
