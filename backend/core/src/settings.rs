use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, VidlensError};

pub const DEFAULT_MODEL: &str = "qwen-vl-max-latest";
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_FPS: f64 = 1.0;
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Process-wide analysis settings.
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Clone)]
pub struct Settings {
    /// DashScope API key
    pub api_key: String,
    /// Model identifier sent with every call
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Frame sampling rate used when the caller gives none
    pub default_fps: f64,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Upper bound for a single remote call; `None` waits forever
    pub request_timeout: Option<Duration>,
}

impl Settings {
    /// Settings with the given key and every other value at its default.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            default_fps: DEFAULT_FPS,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup (useful for testing).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("DASHSCOPE_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| VidlensError::config("DASHSCOPE_API_KEY is not set"))?;

        let mut settings = Self::new(api_key);
        if let Some(model) = lookup("DASHSCOPE_MODEL").filter(|m| !m.trim().is_empty()) {
            settings.model = model;
        }
        if let Some(v) = parse_var(&lookup, "DASHSCOPE_MAX_TOKENS")? {
            settings.max_tokens = v;
        }
        if let Some(v) = parse_var(&lookup, "DASHSCOPE_TEMPERATURE")? {
            settings.temperature = v;
        }
        if let Some(v) = parse_var(&lookup, "VIDEO_DEFAULT_FPS")? {
            settings.default_fps = v;
        }
        if let Some(url) = lookup("DASHSCOPE_BASE_URL").filter(|u| !u.trim().is_empty()) {
            settings.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "DASHSCOPE_TIMEOUT_SECS")? {
            settings.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the remote service could never accept.
    pub fn validate(&self) -> Result<()> {
        if !(self.default_fps.is_finite() && self.default_fps > 0.0) {
            return Err(VidlensError::config(format!(
                "default fps must be a positive number, got {}",
                self.default_fps
            )));
        }
        if self.max_tokens == 0 {
            return Err(VidlensError::config("max tokens must be greater than zero"));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(VidlensError::config(format!(
                "temperature must be non-negative, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_default_fps(mut self, fps: f64) -> Self {
        self.default_fps = fps;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("default_fps", &self.default_fps)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| VidlensError::config(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_lookup(lookup(&[("DASHSCOPE_API_KEY", "sk-test")])).unwrap();
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.max_tokens, 1500);
        assert!((settings.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(settings.default_fps, 1.0);
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, VidlensError::Configuration(_)));

        let err = Settings::from_lookup(lookup(&[("DASHSCOPE_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, VidlensError::Configuration(_)));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("DASHSCOPE_API_KEY", "sk-test"),
            ("DASHSCOPE_MODEL", "qwen-vl-plus"),
            ("DASHSCOPE_MAX_TOKENS", "800"),
            ("DASHSCOPE_TEMPERATURE", "0.5"),
            ("VIDEO_DEFAULT_FPS", "2.5"),
            ("DASHSCOPE_BASE_URL", "http://localhost:9000/api/v1/"),
            ("DASHSCOPE_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(settings.model, "qwen-vl-plus");
        assert_eq!(settings.max_tokens, 800);
        assert_eq!(settings.default_fps, 2.5);
        assert_eq!(settings.base_url, "http://localhost:9000/api/v1");
        assert_eq!(settings.request_timeout, None);
    }

    #[test]
    fn test_bad_numbers_rejected() {
        let err = Settings::from_lookup(lookup(&[
            ("DASHSCOPE_API_KEY", "sk-test"),
            ("DASHSCOPE_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DASHSCOPE_MAX_TOKENS"));

        let err = Settings::from_lookup(lookup(&[
            ("DASHSCOPE_API_KEY", "sk-test"),
            ("VIDEO_DEFAULT_FPS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, VidlensError::Configuration(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let settings = Settings::new("sk-very-secret");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-very-secret"));
    }
}
