use actix_web::{
    HttpRequest, HttpResponse, get,
    http::StatusCode,
    post,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        navigation::{self, LIST_ROUTE},
        rest::{FormAction, FormInput, ListQuery, get_statuscode},
        state::AppState,
        views,
    },
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{Country, CountryDraft, CountrySelection},
    },
    service::recordform::RecordForm,
};

/**
 * City list page. `?edit={id}` shows the edit form for that city below the table.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "listCities", trace_id = get_trace_id(&http_request)))]
#[get("/")]
pub async fn city_list(http_request: HttpRequest, query: web::Query<ListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let mut view = app_state.list_view();
    view.load().instrument(span).await;
    match query.edit {
        Some(city_id) => view.edit_by_id(city_id)?,
        None => view.cancel_edit(),
    }
    let form = view.editing().map(|city| app_state.edit_form(city).with_countries(view.countries().to_vec()));
    Ok(html(StatusCode::OK, views::list_page(&view.rows(), form.as_ref())))
}

/**
 * Deletes a city and returns to the list.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "deleteCity", trace_id = get_trace_id(&http_request)))]
#[post("/cities/{cityId}/delete")]
pub async fn city_delete(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let mut view = app_state.list_view();
    view.delete(path.into_inner()).instrument(span).await?;
    Ok(navigation::navigate(LIST_ROUTE))
}

/**
 * Leaves the edit form without saving.
 */
#[get("/cancel")]
pub async fn city_edit_cancel() -> HttpResponse {
    navigation::navigate(LIST_ROUTE)
}

/**
 * Empty create form.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "cityForm", trace_id = get_trace_id(&http_request)))]
#[get("/add-country")]
pub async fn city_form(http_request: HttpRequest, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    let countries = load_countries(&app_state).instrument(span).await;
    let form = app_state.create_form().with_countries(countries);
    html(StatusCode::OK, views::form_page(&form, None))
}

/**
 * Create form action: adds or removes entries, or saves new cities.
 */
#[instrument(level = "info", skip(http_request, form_data, app_state), fields(service = "cityFormSubmit", trace_id = get_trace_id(&http_request)))]
#[post("/add-country")]
pub async fn city_form_submit(http_request: HttpRequest, form_data: web::Form<Vec<(String, String)>>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let input = FormInput::from(form_data.into_inner());
    let countries = load_countries(&app_state).instrument(span.clone()).await;
    let form = app_state.create_form().with_countries(countries);
    match handle_form(form, input, &app_state).instrument(span).await {
        FormOutcome::Saved => Ok(navigation::navigate(LIST_ROUTE)),
        FormOutcome::Page(response) => Ok(response),
    }
}

/**
 * Edit form action: adds or removes entries, or saves the edited city.
 */
#[instrument(level = "info", skip(http_request, form_data, app_state), fields(service = "cityEditSubmit", trace_id = get_trace_id(&http_request)))]
#[post("/cities/{cityId}")]
pub async fn city_edit_submit(path: Path<i64>, http_request: HttpRequest, form_data: web::Form<Vec<(String, String)>>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let input = FormInput::from(form_data.into_inner());
    let mut view = app_state.list_view();
    view.load().instrument(span.clone()).await;
    view.edit_by_id(path.into_inner())?;
    let Some(city) = view.editing() else {
        return Err(ApplicationError::new(ErrorType::NotFound, "No city to edit".to_string()));
    };
    let form = app_state.edit_form(city).with_countries(view.countries().to_vec());
    match handle_form(form, input, &app_state).instrument(span.clone()).await {
        FormOutcome::Saved => {
            view.complete_edit().instrument(span).await;
            Ok(navigation::navigate(LIST_ROUTE))
        }
        FormOutcome::Page(response) => Ok(response),
    }
}

/**
 * Liveness check.
 */
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/**
 * Result of applying a posted form.
 */
enum FormOutcome {
    /**
     * The form was submitted and reset. The caller navigates back to the list.
     */
    Saved,
    /**
     * The form is shown again, with an error message when something went wrong.
     */
    Page(HttpResponse),
}

/**
 * Applies the posted draft to the form and performs the requested action.
 *
 * Input that could not be parsed is shown with a `422` and never saved.
 */
async fn handle_form(mut form: RecordForm, input: FormInput, app_state: &AppState) -> FormOutcome {
    let FormInput { selection, city_drafts, action, error } = input;
    apply_selection(&mut form, selection);
    form.set_city_drafts(city_drafts);
    match action {
        FormAction::AddCity => form.append_city(),
        FormAction::RemoveCity(index) => {
            if !form.remove_city(index) {
                tracing::warn!("No city entry {} to remove", index);
            }
        }
        FormAction::Refresh => {}
        FormAction::Save if error.is_none() => {
            return match form.submit(app_state.country_service.as_ref(), app_state.city_service.as_ref()).await {
                Ok(report) => {
                    tracing::info!("Saved {} cities for country {} (created: {})", report.persisted_entries, report.country_id, report.created_country);
                    app_state.submission_counter.inc();
                    FormOutcome::Saved
                }
                Err(failure) => {
                    tracing::error!("Error saving city form: {}", failure);
                    FormOutcome::Page(html(get_statuscode(&failure.error.error_type), views::form_page(&form, Some(&failure.to_string()))))
                }
            };
        }
        FormAction::Save => {}
    }
    match error {
        Some(err) => {
            tracing::warn!("Invalid city form input: {}", err);
            FormOutcome::Page(html(get_statuscode(&err.error_type), views::form_page(&form, Some(&err.message))))
        }
        None => FormOutcome::Page(html(StatusCode::OK, views::form_page(&form, None))),
    }
}

/**
 * Applies the posted country choice. Choosing "Create new country" from a selected country opens an empty draft.
 */
fn apply_selection(form: &mut RecordForm, selection: CountrySelection) {
    match selection {
        CountrySelection::Existing(country_id) => form.select_country(country_id),
        CountrySelection::New(draft) if draft == CountryDraft::default() && form.country_fields().is_none() => form.clear_selection(),
        CountrySelection::New(draft) => form.update_country_draft(draft),
    }
}

/**
 * Countries for the selector. A failed fetch is logged and leaves the selector empty.
 */
async fn load_countries(app_state: &AppState) -> Vec<Country> {
    app_state.country_service.get_countries().await.unwrap_or_else(|err| {
        tracing::error!("Error fetching countries: {}", err);
        vec![]
    })
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status).content_type("text/html; charset=utf-8").body(body)
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
