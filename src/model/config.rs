use clap::{Parser, command};
use serde::{Deserialize, Serialize};

/**
 * Command-line arguments for the application.
 */
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ApplicationArguments {
    /**
     * Path to the configuration file.
     */
    #[arg(short, long)]
    pub config_file: String,
}

/**
 * Represents the configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /**
     * Logging configuration for the application.
     */
    pub logging: LoggingConfig,
    /**
     * Server configuration for the application.
     */
    pub server: Server,
    /**
     * Backend REST API configuration.
     */
    pub backend: BackendConfig,
    /**
     * Form behaviour configuration.
     */
    #[serde(default)]
    pub form: FormPolicy,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /**
     * Whether to log the target of the log message.
     */
    pub target: bool,
    /**
     * Whether to log thread IDs .
     */
    pub thread_ids: bool,
    /**
     * Whether to log thread names.
     */
    pub thread_names: bool,
    /**
     * Whether to log line numbers.
     */
    pub line_number: bool,
    /**
     * Whether to log the log level.
     */
    pub level: bool,
    /**
     * Whether to use ANSI colors in logs.
     */
    pub ansi: bool,
    /**
     * Additional directives for logging configuration.
     */
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { target: true, thread_ids: false, thread_names: false, line_number: true, level: true, ansi: true, directives: vec![] }
    }
}

/**
 * Represents the server configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /**
     * Number of worker threads for the server.
     */
    pub workers: usize,
    /**
     * HTTP port for the server.
     */
    pub http_port: Option<u16>,
    /**
     * HTTPS configuration for the server.
     */
    pub https_config: Option<HttpsConfig>,
}

/**
 * Represents the HTTPS configuration for the server.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpsConfig {
    /**
     * Port for the HTTPS server.
     */
    pub port: u16,
    /**
     * Path to the certificate file.
     */
    pub certificate_file: String,
    /**
     * Path to the private key file.
     */
    pub private_key_file: String,
}

/**
 * Where and how the backend REST API is reached.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /**
     * Base url of the backend, e.g. `http://localhost:8080/api`.
     */
    pub base_url: String,
    /**
     * Path of the countries collection.
     */
    #[serde(default = "default_countries_path")]
    pub countries_path: String,
    /**
     * Path of the cities collection.
     */
    #[serde(default = "default_cities_path")]
    pub cities_path: String,
    /**
     * Request timeout in milliseconds.
     */
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /**
     * Bearer token sent with every backend request.
     */
    pub bearer_token: Option<String>,
}

fn default_countries_path() -> String {
    "/countries".to_string()
}

fn default_cities_path() -> String {
    "/cities".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

/**
 * Validation rules applied to a form before it is submitted.
 */
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormPolicy {
    /**
     * Whether a form without any city entries may be submitted.
     */
    #[serde(default)]
    pub allow_empty_submission: bool,
    /**
     * Whether latitude and longitude are range checked.
     */
    #[serde(default = "default_validate_coordinates")]
    pub validate_coordinates: bool,
}

fn default_validate_coordinates() -> bool {
    true
}

impl Default for FormPolicy {
    fn default() -> Self {
        FormPolicy { allow_empty_submission: false, validate_coordinates: true }
    }
}
