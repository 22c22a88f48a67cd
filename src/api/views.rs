use std::{borrow::Cow, fmt::Write};

use crate::{
    api::{navigation, rest::ErrorResponse},
    model::models::{CityRow, CountrySelection},
    service::recordform::RecordForm,
};

/**
 * Escapes text for use in html element content and quoted attribute values.
 */
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(text)
}

fn page(title: &str, body: &str) -> String {
    format!("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{body}</body>\n</html>\n", escape(title))
}

/**
 * Renders the city table, followed by the edit form when a city is being edited.
 *
 * # Arguments
 * `rows`: The joined city rows.
 * `form`: The edit form, if any.
 */
pub fn list_page(rows: &[CityRow], form: Option<&RecordForm>) -> String {
    let mut body = String::new();
    body.push_str("<h2>City List</h2>\n");
    let _ = writeln!(body, "<a href=\"{}\">Add New City</a>", navigation::ADD_ROUTE);
    body.push_str("<table>\n<thead><tr><th>ID</th><th>Name</th><th>Latitude</th><th>Longitude</th><th>Country</th><th>Actions</th></tr></thead>\n<tbody>\n");
    if rows.is_empty() {
        body.push_str("<tr><td colspan=\"6\" align=\"center\">No cities available</td></tr>\n");
    }
    for row in rows {
        let _ = writeln!(
            body,
            "<tr><td>{id}</td><td>{name}</td><td>{lat}</td><td>{lon}</td><td>{country}</td><td><a href=\"{list}?edit={id}\">Edit</a> <form method=\"post\" action=\"/cities/{id}/delete\" style=\"display:inline\"><button type=\"submit\">Delete</button></form></td></tr>",
            id = row.id,
            name = escape(&row.name),
            lat = row.lat,
            lon = row.lon,
            country = escape(&row.country_name),
            list = navigation::LIST_ROUTE,
        );
    }
    body.push_str("</tbody>\n</table>\n");
    if let Some(form) = form {
        body.push_str(&form_fragment(form, None));
    }
    page("City List", &body)
}

/**
 * Renders the city form as a page of its own.
 */
pub fn form_page(form: &RecordForm, error: Option<&str>) -> String {
    let title = if form.is_edit() { "Edit City" } else { "Add Cities" };
    page(title, &form_fragment(form, error))
}

/**
 * Renders the city form. The country fields are only shown when a new country is created.
 */
pub fn form_fragment(form: &RecordForm, error: Option<&str>) -> String {
    let (action, cancel) = match form.target() {
        Some(city) => (format!("/cities/{}", city.id), navigation::CANCEL_ROUTE),
        None => (navigation::ADD_ROUTE.to_string(), navigation::LIST_ROUTE),
    };
    let mut html = String::new();
    let _ = writeln!(html, "<form method=\"post\" action=\"{}\">", escape(&action));
    if let Some(error) = error {
        let _ = writeln!(html, "<p class=\"error\">{}</p>", escape(error));
    }
    html.push_str("<h2>Select Country Or Create New Country</h2>\n");
    html.push_str("<label>Country <select name=\"countryId\">\n<option value=\"0\">Create new country</option>\n");
    let selected_id = match form.selection() {
        CountrySelection::Existing(id) => Some(*id),
        CountrySelection::New(_) => None,
    };
    for country in form.countries() {
        let selected = if selected_id == Some(country.id) { " selected" } else { "" };
        let _ = writeln!(html, "<option value=\"{}\"{selected}>{}</option>", country.id, escape(&country.name));
    }
    if let Some(id) = selected_id.filter(|id| form.countries().iter().all(|country| country.id != *id)) {
        let _ = writeln!(html, "<option value=\"{id}\" selected>Country {id}</option>");
    }
    html.push_str("</select></label>\n<button type=\"submit\" name=\"action\" value=\"refresh\">Apply</button>\n");

    if let Some(draft) = form.country_fields() {
        html.push_str("<h3>Creating Country</h3>\n");
        let _ = writeln!(html, "<label>Country Name <input name=\"countryName\" value=\"{}\"></label>", escape(&draft.name));
        let _ = writeln!(html, "<label>Country ISO2 <input name=\"iso2\" value=\"{}\"></label>", escape(&draft.iso2));
        let _ = writeln!(html, "<label>Country ISO3 <input name=\"iso3\" value=\"{}\"></label>", escape(&draft.iso3));
    }

    html.push_str("<hr>\n<h2>Cities</h2>\n");
    for (index, draft) in form.city_drafts().iter().enumerate() {
        let _ = writeln!(
            html,
            "<fieldset><label>City Name <input name=\"cityName\" value=\"{}\"></label> <label>Latitude <input name=\"cityLat\" type=\"number\" step=\"any\" value=\"{}\"></label> <label>Longitude <input name=\"cityLon\" type=\"number\" step=\"any\" value=\"{}\"></label> <button type=\"submit\" name=\"action\" value=\"remove-{index}\">Remove</button></fieldset>",
            escape(&draft.name),
            draft.lat,
            draft.lon,
        );
    }
    html.push_str("<button type=\"submit\" name=\"action\" value=\"add\">Add City</button>\n");
    html.push_str("<button type=\"submit\" name=\"action\" value=\"save\">Save</button>\n");
    let _ = writeln!(html, "<a href=\"{cancel}\">Cancel</a>");
    html.push_str("</form>\n");
    html
}

/**
 * Renders an error page with a link back to the list.
 */
pub fn error_page(error: &ErrorResponse) -> String {
    let body = format!("<h2>Error {}</h2>\n<p>{}</p>\n<a href=\"{}\">Back to list</a>\n", error.code, escape(&error.message), navigation::LIST_ROUTE);
    page("Error", &body)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{
        config::FormPolicy,
        models::{City, CityDraft, Country, CountryDraft},
    };

    fn countries() -> Vec<Country> {
        vec![Country::new(10, "France".to_string(), "FR".to_string(), "FRA".to_string(), 1), Country::new(20, "Spain".to_string(), "ES".to_string(), "ESP".to_string(), 0)]
    }

    #[test]
    fn test_escape() {
        let escaped = escape("<b>\"A&B\"</b> 'x'");
        assert!(escaped.starts_with("&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt; "));
        assert!(!escaped.contains('\''));
        assert!(matches!(escape("Zürich"), Cow::Borrowed("Zürich")));
    }

    #[test]
    fn test_list_page_with_rows() {
        let rows = vec![CityRow { id: 1, name: "Paris".to_string(), lat: 48.8, lon: 2.3, country_name: "France".to_string() }];
        let html = list_page(&rows, None);
        assert!(html.contains("<td>Paris</td>"));
        assert!(html.contains("<td>48.8</td>"));
        assert!(html.contains("<td>France</td>"));
        assert!(html.contains("href=\"/?edit=1\""));
        assert!(html.contains("action=\"/cities/1/delete\""));
        assert!(!html.contains("No cities available"));
        assert!(!html.contains("<select"));
    }

    #[test]
    fn test_list_page_empty() {
        let html = list_page(&[], None);
        assert!(html.contains("No cities available"));
        assert!(html.contains("href=\"/add-country\""));
    }

    #[test]
    fn test_list_page_escapes_names() {
        let rows = vec![CityRow { id: 1, name: "<script>".to_string(), lat: 0.0, lon: 0.0, country_name: "Unknown".to_string() }];
        let html = list_page(&rows, None);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_create_form_shows_country_fields() {
        let mut form = RecordForm::new(FormPolicy::default()).with_countries(countries());
        form.update_country_draft(CountryDraft::new("Italy".to_string(), "IT".to_string(), "ITA".to_string()));
        let html = form_fragment(&form, None);
        assert!(html.contains("action=\"/add-country\""));
        assert!(html.contains("Creating Country"));
        assert!(html.contains("name=\"countryName\" value=\"Italy\""));
        assert!(html.contains("<option value=\"10\">France</option>"));
        assert_eq!(html.matches("name=\"cityName\"").count(), 1);
    }

    #[test]
    fn test_edit_form_selects_country_without_country_fields() {
        let city = City::new(5, "Paris".to_string(), 48.8, 2.3, 10);
        let mut form = RecordForm::for_city(&city, FormPolicy::default()).with_countries(countries());
        form.set_city_drafts(vec![CityDraft::new("Paris".to_string(), 48.8, 2.3), CityDraft::default()]);
        let html = form_fragment(&form, Some("Failed to update city"));
        assert!(html.contains("action=\"/cities/5\""));
        assert!(html.contains("<option value=\"10\" selected>France</option>"));
        assert!(!html.contains("Creating Country"));
        assert!(html.contains("value=\"remove-1\""));
        assert!(html.contains("Failed to update city"));
        assert!(html.contains("href=\"/cancel\""));
    }

    #[test]
    fn test_form_keeps_unlisted_selected_country() {
        let city = City::new(5, "Paris".to_string(), 48.8, 2.3, 77);
        let form = RecordForm::for_city(&city, FormPolicy::default());
        let html = form_fragment(&form, None);
        assert!(html.contains("<option value=\"77\" selected>Country 77</option>"));
    }

    #[test]
    fn test_error_page() {
        let html = error_page(&ErrorResponse { code: 1004, message: "City 3 not found".to_string() });
        assert!(html.contains("Error 1004"));
        assert!(html.contains("City 3 not found"));
    }
}
