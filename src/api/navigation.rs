use actix_web::{HttpResponse, http::header::LOCATION};

/**
 * The city list.
 */
pub const LIST_ROUTE: &str = "/";
/**
 * The create form.
 */
pub const ADD_ROUTE: &str = "/add-country";
/**
 * Leaves the edit form without saving.
 */
pub const CANCEL_ROUTE: &str = "/cancel";

/**
 * Sends the browser to another route with `303 See Other`.
 */
pub fn navigate(route: &str) -> HttpResponse {
    HttpResponse::SeeOther().insert_header((LOCATION, route)).finish()
}
