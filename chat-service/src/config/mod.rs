use crate::services::providers::gemini::GEMINI_API_BASE;
use crate::upload::AllowedExtensions;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default request body limit (16 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Default Gemini request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub uploads: UploadConfig,
    pub web: WebConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// `None` leaves the model client unavailable; `/chat` then answers 503.
    pub api_key: Option<Secret<String>>,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Multimodal model for `/chat` (e.g., gemini-1.5-flash)
    pub text_model: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Created at startup if missing.
    pub folder: PathBuf,
    pub allowed_extensions: AllowedExtensions,
    /// Maximum request body size in bytes.
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub static_dir: PathBuf,
    /// Answer `/generate-image` with a placeholder URL instead of 501.
    pub image_placeholder_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub otlp_endpoint: Option<String>,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let allowed_extensions = match env::var("ALLOWED_EXTENSIONS") {
            Ok(list) => AllowedExtensions::parse_list(&list),
            Err(_) => AllowedExtensions::default(),
        };
        if allowed_extensions.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS must name at least one extension"
            )));
        }

        Ok(ChatConfig {
            common: common_config,
            google: GoogleConfig {
                api_key: optional_env("GEMINI_API_KEY", is_prod)?.map(Secret::new),
            },
            models: ModelConfig {
                text_model: get_env("GENAI_TEXT_MODEL", Some("gemini-1.5-flash"), is_prod)?,
                api_base: get_env("GENAI_API_BASE", Some(GEMINI_API_BASE), is_prod)?,
                request_timeout_secs: parse_env(
                    "GENAI_REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?,
            },
            uploads: UploadConfig {
                folder: PathBuf::from(get_env("UPLOAD_FOLDER", Some("uploads"), is_prod)?),
                allowed_extensions,
                max_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            web: WebConfig {
                static_dir: PathBuf::from(get_env(
                    "STATIC_DIR",
                    Some("chat-service/static"),
                    is_prod,
                )?),
                image_placeholder_enabled: parse_env("IMAGE_PLACEHOLDER_ENABLED", false)?,
            },
            observability: ObservabilityConfig {
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Like [`get_env`] without a default, except a missing value is `None` outside production.
fn optional_env(key: &str, is_prod: bool) -> Result<Option<String>, AppError> {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(Some(val)),
        _ if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required in production but not set",
            key
        ))),
        _ => Ok(None),
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_to_default() {
        let value: u64 = parse_env("CHAT_SERVICE_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_env_rejects_garbage() {
        env::set_var("CHAT_SERVICE_TEST_BAD_NUMBER", "lots");
        let result: Result<usize, _> = parse_env("CHAT_SERVICE_TEST_BAD_NUMBER", 1);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn optional_env_is_none_outside_prod() {
        env::set_var("CHAT_SERVICE_TEST_BLANK_KEY", "   ");
        assert!(optional_env("CHAT_SERVICE_TEST_BLANK_KEY", false)
            .unwrap()
            .is_none());
        assert!(optional_env("CHAT_SERVICE_TEST_BLANK_KEY", true).is_err());
    }

    #[test]
    fn get_env_requires_value_without_default() {
        assert!(get_env("CHAT_SERVICE_TEST_MISSING", None, false).is_err());
        assert_eq!(
            get_env("CHAT_SERVICE_TEST_MISSING", Some("fallback"), false).unwrap(),
            "fallback"
        );
    }
}
