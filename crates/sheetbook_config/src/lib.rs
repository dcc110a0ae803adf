use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::Path;

pub mod models;
pub use models::*;

/// Default prefix for configuration environment variables (`SHEETBOOK__SERVER__PORT`).
pub const DEFAULT_PREFIX: &str = "SHEETBOOK";

/// Loads the application configuration.
///
/// Sources, later ones winning:
/// 1. `{CONFIG_DIR}/default.*`
/// 2. `{CONFIG_DIR}/{RUN_ENV}.*` (RUN_ENV defaults to `debug`)
/// 3. Environment variables with the `PREFIX` (default `SHEETBOOK`) and `__` separator
///
/// Any string value equal to `"secret_from_env"` is then replaced with the
/// environment variable named after its key path, and the result is validated.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    load_config_from(Path::new(&config_dir), &run_env, &prefix)
}

/// Loads configuration from an explicit directory, run environment and env prefix.
pub fn load_config_from(
    config_dir: &Path,
    run_env: &str,
    prefix: &str,
) -> Result<AppConfig, ConfigError> {
    let default_path = config_dir.join("default");
    let env_path = config_dir.join(run_env);

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    let config = apply_env_overrides_from_marker(raw_config)?;
    finalize(config)
}

/// Recursively replaces all "secret_from_env" string values using `lookup`.
/// Markers without a value are left for [`finalize`] to drop or reject.
///
/// The key path is joined with `_` and upper-cased: `stripe.secret_key` -> `STRIPE_SECRET_KEY`.
fn inject_secrets<F>(value: &mut Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    fn walk<F>(path: &mut Vec<String>, obj: &mut Value, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.to_string());
                    walk(path, v, lookup);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_FROM_ENV => {
                let env_key = path.join("_").to_uppercase();
                if let Some(env_val) = lookup(&env_key) {
                    *obj = Value::String(env_val);
                }
            }
            _ => {}
        }
    }

    walk(&mut Vec::new(), value, lookup);
}

/// Applies environment overrides based on "secret_from_env" markers in the config.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    apply_overrides_with(config, &|key: &str| env::var(key).ok())
}

fn apply_overrides_with<F>(config: AppConfig, lookup: &F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    inject_secrets(&mut json, lookup);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}

fn is_unset(value: &str) -> bool {
    value.trim().is_empty() || value == SECRET_FROM_ENV
}

/// Drops unresolved optional secrets and rejects missing mandatory values.
fn finalize(mut config: AppConfig) -> Result<AppConfig, ConfigError> {
    if config.stripe.webhook_secret.as_deref().is_some_and(is_unset) {
        config.stripe.webhook_secret = None;
    }
    if config.sheets.credentials_json.as_deref().is_some_and(is_unset) {
        config.sheets.credentials_json = None;
    }
    if config.sheets.key_path.as_deref().is_some_and(is_unset) {
        config.sheets.key_path = None;
    }

    if is_unset(&config.stripe.secret_key) {
        return Err(ConfigError::Message(
            "stripe.secret_key is missing (set STRIPE_SECRET_KEY)".to_string(),
        ));
    }
    if is_unset(&config.sheets.bookings_spreadsheet_id) {
        return Err(ConfigError::Message(
            "sheets.bookings_spreadsheet_id is missing".to_string(),
        ));
    }
    if config.sheets.credentials_json.is_none() && config.sheets.key_path.is_none() {
        return Err(ConfigError::Message(
            "sheets.credentials_json or sheets.key_path must be provided".to_string(),
        ));
    }
    if is_unset(&config.site.base_url) {
        return Err(ConfigError::Message("site.base_url is missing".to_string()));
    }
    config.site.base_url = config.site.base_url.trim_end_matches('/').to_string();

    Ok(config)
}

/// Conditions worth logging once logging is up. Loading runs before the
/// subscriber exists, so nothing is logged from inside it.
pub fn startup_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.stripe.webhook_secret.is_none() {
        warnings.push(
            "stripe.webhook_secret is not set (STRIPE_WEBHOOK_SECRET); signed webhook events will be rejected"
                .to_string(),
        );
    }
    if config.sheets.credentials_json.is_some() && config.sheets.key_path.is_some() {
        warnings.push("sheets.credentials_json and sheets.key_path both set; using credentials_json".to_string());
    }
    warnings
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// Uses `DOTENV_OVERRIDE` when set, otherwise `.env` in the working directory.
/// A missing file is not an error. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
