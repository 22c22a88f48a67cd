use std::str::FromStr;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Deserialize;

use crate::{
    api::views,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{CityDraft, CountryDraft, CountrySelection, UNSAVED_ID},
    },
};

/***************** City list models *********************/

/**
 * Query parameters of the city list page.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /**
     * Id of the city to show in the edit form.
     */
    pub edit: Option<i64>,
}

/***************** City form models *********************/

/**
 * Which button submitted the city form.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    Save,
    AddCity,
    RemoveCity(usize),
    /**
     * Re-render after the country selection changed.
     */
    Refresh,
}

impl FromStr for FormAction {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "save" => Ok(FormAction::Save),
            "add" => Ok(FormAction::AddCity),
            "refresh" => Ok(FormAction::Refresh),
            _ => value
                .strip_prefix("remove-")
                .and_then(|index| index.parse::<usize>().ok())
                .map(FormAction::RemoveCity)
                .ok_or_else(|| ApplicationError::new(ErrorType::Validation, format!("Unknown form action {value}"))),
        }
    }
}

/**
 * The posted city form.
 *
 * Field names: `countryId` (0 creates a new country), `countryName`, `iso2`, `iso3`,
 * repeated `cityName`, `cityLat`, `cityLon` in entry order and `action`.
 *
 * Parsing never discards the draft. A field that cannot be parsed falls back to its
 * default and the first such problem is kept in `error`.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub selection: CountrySelection,
    pub city_drafts: Vec<CityDraft>,
    pub action: FormAction,
    /**
     * First field that could not be parsed.
     */
    pub error: Option<ApplicationError>,
}

impl From<Vec<(String, String)>> for FormInput {
    fn from(fields: Vec<(String, String)>) -> Self {
        let mut error: Option<ApplicationError> = None;
        let mut country_id = UNSAVED_ID;
        let (mut country_name, mut iso2, mut iso3) = (String::new(), String::new(), String::new());
        let mut action = FormAction::Save;
        let mut names: Vec<String> = vec![];
        let mut lats: Vec<f64> = vec![];
        let mut lons: Vec<f64> = vec![];
        for (key, value) in fields {
            match key.as_str() {
                "countryId" => country_id = keep_first(parse_number("Country", value.trim()), &mut error),
                "countryName" => country_name = value.trim().to_string(),
                "iso2" => iso2 = value.trim().to_string(),
                "iso3" => iso3 = value.trim().to_string(),
                "cityName" => names.push(value.trim().to_string()),
                "cityLat" => {
                    let lat = parse_coordinate(&format!("City {} latitude", lats.len() + 1), value.trim());
                    lats.push(keep_first(lat, &mut error));
                }
                "cityLon" => {
                    let lon = parse_coordinate(&format!("City {} longitude", lons.len() + 1), value.trim());
                    lons.push(keep_first(lon, &mut error));
                }
                "action" => match FormAction::from_str(&value) {
                    Ok(parsed) => action = parsed,
                    Err(err) => {
                        error.get_or_insert(err);
                        action = FormAction::Refresh;
                    }
                },
                _ => tracing::debug!("Ignoring form field {}", key),
            }
        }
        let entries = names.len().max(lats.len()).max(lons.len());
        if names.len() != entries || lats.len() != entries || lons.len() != entries {
            error.get_or_insert(ApplicationError::new(ErrorType::Validation, "Every city needs a name, latitude and longitude".to_string()));
        }
        let city_drafts = (0..entries)
            .map(|index| CityDraft::new(names.get(index).cloned().unwrap_or_default(), lats.get(index).copied().unwrap_or_default(), lons.get(index).copied().unwrap_or_default()))
            .collect();
        let selection = if country_id == UNSAVED_ID { CountrySelection::New(CountryDraft::new(country_name, iso2, iso3)) } else { CountrySelection::Existing(country_id) };
        FormInput { selection, city_drafts, action, error }
    }
}

fn keep_first<T: Default>(result: Result<T, ApplicationError>, error: &mut Option<ApplicationError>) -> T {
    result.unwrap_or_else(|err| {
        error.get_or_insert(err);
        T::default()
    })
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T, ApplicationError> {
    value.parse::<T>().map_err(|_err| ApplicationError::new(ErrorType::Validation, format!("{field} must be a number, got '{value}'")))
}

/**
 * Parses a latitude or longitude. `NaN` and infinities are rejected.
 */
fn parse_coordinate(field: &str, value: &str) -> Result<f64, ApplicationError> {
    let coordinate: f64 = parse_number(field, value)?;
    if coordinate.is_finite() { Ok(coordinate) } else { Err(ApplicationError::new(ErrorType::Validation, format!("{field} must be a finite number, got '{value}'"))) }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error page for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(self.status_code()).content_type("text/html; charset=utf-8").body(views::error_page(&error_response))
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
pub fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::Initialization => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::NetworkFailure => StatusCode::BAD_GATEWAY,
        ErrorType::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::Initialization => 1001,
        ErrorType::NetworkFailure => 1002,
        ErrorType::Validation => 1003,
        ErrorType::NotFound => 1004,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect()
    }

    #[test]
    fn test_form_action_from_str() {
        assert_eq!(FormAction::from_str("save").unwrap(), FormAction::Save);
        assert_eq!(FormAction::from_str("add").unwrap(), FormAction::AddCity);
        assert_eq!(FormAction::from_str("refresh").unwrap(), FormAction::Refresh);
        assert_eq!(FormAction::from_str("remove-2").unwrap(), FormAction::RemoveCity(2));
        assert!(FormAction::from_str("remove-x").is_err());
        assert!(FormAction::from_str("drop").is_err());
    }

    #[test]
    fn test_parse_new_country_form() {
        let input = FormInput::from(fields(&[
            ("countryId", "0"),
            ("countryName", "Spain"),
            ("iso2", "ES"),
            ("iso3", "ESP"),
            ("cityName", "Madrid"),
            ("cityLat", "40.4"),
            ("cityLon", "-3.7"),
            ("cityName", "Sevilla"),
            ("cityLat", "37.4"),
            ("cityLon", "-6"),
            ("action", "save"),
        ]));
        assert_eq!(input.selection, CountrySelection::New(CountryDraft::new("Spain".to_string(), "ES".to_string(), "ESP".to_string())));
        assert_eq!(input.city_drafts, vec![CityDraft::new("Madrid".to_string(), 40.4, -3.7), CityDraft::new("Sevilla".to_string(), 37.4, -6.0)]);
        assert_eq!(input.action, FormAction::Save);
        assert!(input.error.is_none());
    }

    #[test]
    fn test_parse_existing_country_form() {
        let input = FormInput::from(fields(&[("countryId", "10"), ("countryName", "ignored"), ("action", "add")]));
        assert_eq!(input.selection, CountrySelection::Existing(10));
        assert!(input.city_drafts.is_empty());
        assert_eq!(input.action, FormAction::AddCity);
        assert!(input.error.is_none());
    }

    #[test]
    fn test_parse_non_numeric_latitude_keeps_draft() {
        let input = FormInput::from(fields(&[("countryId", "0"), ("countryName", "France"), ("cityName", "Paris"), ("cityLat", "north"), ("cityLon", "2.3"), ("action", "add")]));
        let err = input.error.unwrap();
        assert_eq!(err.error_type, ErrorType::Validation);
        assert!(err.message.contains("City 1 latitude"));
        assert_eq!(input.city_drafts, vec![CityDraft::new("Paris".to_string(), 0.0, 2.3)]);
        assert_eq!(input.selection, CountrySelection::New(CountryDraft::new("France".to_string(), String::new(), String::new())));
        assert_eq!(input.action, FormAction::AddCity);
    }

    #[test]
    fn test_parse_empty_longitude_reports_first_error() {
        let input = FormInput::from(fields(&[("countryId", "10"), ("cityName", "Lyon"), ("cityLat", "45.7"), ("cityLon", ""), ("cityName", "Nice"), ("cityLat", "x"), ("cityLon", "7.2")]));
        let err = input.error.unwrap();
        assert!(err.message.contains("City 1 longitude"));
        assert_eq!(input.city_drafts.len(), 2);
        assert_eq!(input.city_drafts[0].name, "Lyon");
        assert_eq!(input.city_drafts[1].lon, 7.2);
    }

    #[test]
    fn test_parse_rejects_non_finite_coordinates() {
        for value in ["NaN", "inf", "-infinity"] {
            let input = FormInput::from(fields(&[("countryId", "10"), ("cityName", "Paris"), ("cityLat", value), ("cityLon", "2.3")]));
            let err = input.error.unwrap();
            assert_eq!(err.error_type, ErrorType::Validation);
            assert!(err.message.contains("finite"), "{value} accepted");
            assert!(input.city_drafts[0].lat.is_finite());
        }
    }

    #[test]
    fn test_parse_pads_incomplete_entry() {
        let input = FormInput::from(fields(&[("countryId", "10"), ("cityName", "Paris"), ("cityLat", "48.8")]));
        assert_eq!(input.error.unwrap().error_type, ErrorType::Validation);
        assert_eq!(input.city_drafts, vec![CityDraft::new("Paris".to_string(), 48.8, 0.0)]);
    }

    #[test]
    fn test_parse_unknown_action_refreshes() {
        let input = FormInput::from(fields(&[("countryId", "10"), ("action", "drop")]));
        assert_eq!(input.action, FormAction::Refresh);
        assert!(input.error.unwrap().message.contains("Unknown form action drop"));
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(get_statuscode(&ErrorType::NetworkFailure), StatusCode::BAD_GATEWAY);
        assert_eq!(get_statuscode(&ErrorType::Validation), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(get_statuscode(&ErrorType::NotFound), StatusCode::NOT_FOUND);
        let response = ApplicationError::new(ErrorType::NotFound, "City 3 not found".to_string()).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
