use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
    middleware::Next,
};
use tracing::debug;

/**
 * Header carrying the request processing time in milliseconds.
 */
pub const RESPONSE_TIME_HEADER: &str = "x-response-time-ms";

/**
 * Middleware for timing requests. Logs the duration and adds it as a response header.
 */
pub async fn timing_middleware(request: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start_time = std::time::Instant::now();
    let path = request.path().to_owned();
    let method = request.method().to_owned();
    let mut response = next.call(request).await?;
    let duration = start_time.elapsed();
    debug!(target: "performance", "Request for {} {} with status {} processed in {}ms", method, path, response.status().as_u16(), duration.as_millis());
    if let Ok(value) = HeaderValue::from_str(&duration.as_millis().to_string()) {
        response.headers_mut().insert(HeaderName::from_static(RESPONSE_TIME_HEADER), value);
    }
    Ok(response)
}
