use serde::{Deserialize, Serialize};

/**
 * Id used for records the backend has not assigned an id to yet.
 */
pub const UNSAVED_ID: i64 = 0;

/**
 * A country as exchanged with the backend.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub iso2: String,
    pub iso3: String,
    #[serde(default)]
    pub tot_cities: i64,
}

impl Country {
    pub fn new(id: i64, name: String, iso2: String, iso3: String, tot_cities: i64) -> Self {
        Country { id, name, iso2, iso3, tot_cities }
    }
}

/**
 * Converts a draft into a country the backend can create.
 */
impl From<CountryDraft> for Country {
    fn from(draft: CountryDraft) -> Self {
        Country::new(UNSAVED_ID, draft.name, draft.iso2, draft.iso3, 0)
    }
}

/**
 * A city as exchanged with the backend. `country_id` references `Country::id`.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country_id: i64,
}

impl City {
    pub fn new(id: i64, name: String, lat: f64, lon: f64, country_id: i64) -> Self {
        City { id, name, lat, lon, country_id }
    }

    /**
     * Builds a city record from a form entry.
     *
     * # Arguments
     * `id`: Id of the city being edited or `UNSAVED_ID` when creating.
     * `draft`: The form entry.
     * `country_id`: The effective country id of the submission.
     */
    pub fn from_draft(id: i64, draft: &CityDraft, country_id: i64) -> Self {
        City::new(id, draft.name.clone(), draft.lat, draft.lon, country_id)
    }
}

/**
 * Unsaved country fields entered in the form.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryDraft {
    pub name: String,
    pub iso2: String,
    pub iso3: String,
}

impl CountryDraft {
    pub fn new(name: String, iso2: String, iso3: String) -> Self {
        CountryDraft { name, iso2, iso3 }
    }
}

/**
 * One city entry in the form.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityDraft {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl CityDraft {
    pub fn new(name: String, lat: f64, lon: f64) -> Self {
        CityDraft { name, lat, lon }
    }
}

impl From<&City> for CityDraft {
    fn from(city: &City) -> Self {
        CityDraft::new(city.name.clone(), city.lat, city.lon)
    }
}

/**
 * Which country the cities of a submission are attached to.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum CountrySelection {
    /**
     * A country the backend already knows.
     */
    Existing(i64),
    /**
     * A country created as the first step of the submission.
     */
    New(CountryDraft),
}

impl Default for CountrySelection {
    fn default() -> Self {
        CountrySelection::New(CountryDraft::default())
    }
}

/**
 * A city row of the list view with the country name resolved.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct CityRow {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country_name: String,
}
