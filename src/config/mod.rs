use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum ConfigError {
    #[error("window.ENV.FIREBASE_DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("window.ENV.FIREBASE_API_KEY is not set")]
    MissingApiKey,
}

/// Values as found on `window.ENV`, before validation.
#[derive(Clone, Debug, Default)]
pub(crate) struct RawEnv {
    pub api_key: Option<String>,
    pub database_url: Option<String>,
    pub redirect_to_first_note: Option<String>,
}

impl RawEnv {
    pub fn from_window() -> Self {
        let Some(env) = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object())
        else {
            return Self::default();
        };

        let env: JsValue = env.into();
        let get = |key: &str| -> Option<String> {
            let v = js_sys::Reflect::get(&env, &key.into()).ok()?;
            // Flags may be given as real booleans.
            v.as_bool()
                .map(|b| b.to_string())
                .or_else(|| v.as_string())
        };

        Self {
            api_key: get("FIREBASE_API_KEY"),
            database_url: get("FIREBASE_DATABASE_URL"),
            redirect_to_first_note: get("REDIRECT_TO_FIRST_NOTE"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub api_key: String,
    /// Realtime Database root, without a trailing slash.
    pub database_url: String,
    /// Root path on large screens opens the first note instead of an empty editor.
    pub redirect_to_first_note: bool,
}

impl EnvConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_raw(RawEnv::from_window())
    }

    pub fn from_raw(raw: RawEnv) -> Result<Self, ConfigError> {
        let database_url = raw
            .database_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let api_key = raw
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let redirect_to_first_note = raw
            .redirect_to_first_note
            .as_deref()
            .map(parse_flag)
            .unwrap_or(false);

        Ok(Self {
            api_key,
            database_url,
            redirect_to_first_note,
        })
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(api_key: Option<&str>, url: Option<&str>, redirect: Option<&str>) -> RawEnv {
        RawEnv {
            api_key: api_key.map(str::to_string),
            database_url: url.map(str::to_string),
            redirect_to_first_note: redirect.map(str::to_string),
        }
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let c = EnvConfig::from_raw(raw(Some("k"), Some("https://db.example.com/"), None))
            .expect("config should be valid");
        assert_eq!(c.database_url, "https://db.example.com");
        assert_eq!(c.api_key, "k");
        assert!(!c.redirect_to_first_note);
    }

    #[test]
    fn test_config_requires_database_url() {
        let err = EnvConfig::from_raw(raw(Some("k"), Some("  "), None)).unwrap_err();
        assert_eq!(err, ConfigError::MissingDatabaseUrl);
    }

    #[test]
    fn test_config_requires_api_key() {
        let err = EnvConfig::from_raw(raw(None, Some("https://db"), None)).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn test_redirect_flag_parsing() {
        for (v, expected) in [("true", true), ("1", true), ("TRUE", true), ("0", false), ("no", false)] {
            let c = EnvConfig::from_raw(raw(Some("k"), Some("https://db"), Some(v)))
                .expect("config should be valid");
            assert_eq!(c.redirect_to_first_note, expected, "flag value {v}");
        }
    }
}
