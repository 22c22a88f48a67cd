mod api;
mod dao;
mod model;
mod service;

use std::sync::Arc;

use crate::api::endpoints::{city_delete, city_edit_cancel, city_edit_submit, city_form, city_form_submit, city_list, health};
use crate::api::middleware::timing_middleware;
use crate::api::state::AppState;
use crate::dao::backend::BackendClient;
use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::config::{ApplicationArguments, HttpsConfig, LoggingConfig};

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntCounter;
use rustls::pki_types::PrivateKeyDer;
use rustls::{ServerConfig, SupportedProtocolVersion};
use rustls_pemfile::{certs, pkcs8_private_keys};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/**
 * Reads the configuration, connects the backend client and serves the UI.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let prometheus = PrometheusMetricsBuilder::new("city_registry_ui")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    let submission_counter = IntCounter::new("form_submissions", "Successful city form submissions").map_err(|err| std::io::Error::other(format!("Failed to create form_submissions counter: {err}")))?;
    let backend_failure_counter = IntCounter::new("backend_failures", "Failed backend calls").map_err(|err| std::io::Error::other(format!("Failed to create backend_failures counter: {err}")))?;
    register_prometheus_metrics(&prometheus, &submission_counter)?;
    register_prometheus_metrics(&prometheus, &backend_failure_counter)?;

    let backend_client = BackendClient::new(&config.backend).map_err(|err| std::io::Error::other(format!("Failed to create backend client: {err}")))?.with_failure_counter(backend_failure_counter);
    let backend_client = Arc::new(backend_client);
    tracing::info!("Using backend {}", config.backend.base_url);

    let state = web::Data::new(AppState::new(backend_client.clone(), backend_client, config.form.clone(), submission_counter));

    let server_init = HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .wrap(from_fn(timing_middleware))
            .app_data(state.clone())
            .service(city_list)
            .service(city_delete)
            .service(city_edit_cancel)
            .service(city_form)
            .service(city_form_submit)
            .service(city_edit_submit)
            .service(health)
    });

    let server_init = if let Some(http_port) = &config.server.http_port { server_init.bind(("127.0.0.1", *http_port))? } else { server_init };
    let server_init = if let Some(https_config) = &config.server.https_config {
        let ssl_builder = ssl_builder(https_config).map_err(|err| std::io::Error::other(format!("Failed to create SSL/TLS configuration: {err}")))?;
        server_init.bind_rustls_0_23(("127.0.0.1", https_config.port), ssl_builder).map_err(|err| std::io::Error::other(format!("Failed to bind HTTPS server: {err}")))?
    } else {
        server_init
    };

    server_init.workers(config.server.workers).run().await
}

/**
 * Initializes the tracing subscriber for the application.
 *
 * #Arguments
 * `logging`: The logging configuration. `RUST_LOG` is honoured before the configured directives.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let env_filter = logging.directives.iter().try_fold(EnvFilter::from_default_env(), |filter, directive| {
        directive.parse().map(|directive| filter.add_directive(directive)).map_err(|err| std::io::Error::other(format!("Invalid logging directive {directive}: {err}")))
    })?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_ansi(logging.ansi);
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init().map_err(|err| std::io::Error::other(format!("Failed to initialize tracing: {err}")))?;
    Ok(())
}

/**
 * Registers custom Prometheus metrics.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the counter with.
 * `counter`: The counter to register.
 */
fn register_prometheus_metrics(prometheus_metrics: &PrometheusMetrics, counter: &IntCounter) -> Result<(), std::io::Error> {
    prometheus_metrics.registry.register(Box::new(counter.clone())).map_err(|err| std::io::Error::other(format!("Failed to register Prometheus counter: {err}")))?;
    Ok(())
}

/**
 * Initializes the SSL/TLS configuration for the server.
 *
 * #Arguments
 * `https_config`: The HTTPS configuration containing the certificate and private key files.
 *
 * #Returns
 * A `Result` containing the initialized `ServerConfig` or an `ApplicationError` if initialization fails.
 */
fn ssl_builder(https_config: &HttpsConfig) -> Result<ServerConfig, ApplicationError> {
    let config_builder = ServerConfig::builder_with_protocol_versions(&get_protocol_versions());
    let cert_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.certificate_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read certificate file: {err}")))?,
    );
    let key_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.private_key_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read private key file: {err}")))?,
    );
    let cert_chain = certs(cert_file).collect::<Result<Vec<_>, _>>().map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert certificate to der: {err}")))?;
    let key = pkcs8_private_keys(key_file)
        .next()
        .ok_or_else(|| ApplicationError::new(ErrorType::Initialization, "No private key found".to_string()))?
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert private key to der: {err}")))?;
    let config = config_builder
        .with_no_client_auth()
        .with_single_cert(cert_chain, PrivateKeyDer::Pkcs8(key))
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create server config: {err}")))?;
    Ok(config)
}

/**
 * Returns the supported TLS protocol versions.
 */
fn get_protocol_versions() -> Vec<&'static SupportedProtocolVersion> {
    vec![&rustls::version::TLS13]
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<model::config::Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: model::config::Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}
