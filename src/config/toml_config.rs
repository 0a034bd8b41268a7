use crate::adapters::{ConfiguredLocation, IpLocation, StaticLocation};
use crate::core::{ConfigProvider, LocationOptions, Position};
use crate::domain::model::{DEFAULT_LOCATION_TIMEOUT, DEFAULT_MAXIMUM_AGE};
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://api.zeitkunst.org/planets_stars_every_moment";

/// One week.
pub const MAX_REFRESH_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub location: LocationSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSection {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// IP geolocation endpoint, used when no fixed coordinates are given.
    pub provider_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_maximum_age_ms")]
    pub maximum_age_ms: u64,
}

impl Default for LocationSection {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            provider_url: None,
            timeout_ms: default_timeout_ms(),
            maximum_age_ms: default_maximum_age_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// Emit an app-message trigger every N minutes, like the watch's own refresh.
    pub refresh_minutes: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_LOCATION_TIMEOUT.as_millis() as u64
}

fn default_maximum_age_ms() -> u64 {
    DEFAULT_MAXIMUM_AGE.as_millis() as u64
}

impl RelayConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RelayError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` placeholders with environment values; unknown
    /// variables are left untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RelayError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Picks the location source: fixed coordinates win over a provider URL.
    pub fn location_source(&self) -> Result<ConfiguredLocation> {
        match (self.location.latitude, self.location.longitude) {
            (Some(latitude), Some(longitude)) => Ok(ConfiguredLocation::Static(
                StaticLocation::new(Position::new(latitude, longitude)),
            )),
            (Some(_), None) => Err(RelayError::MissingConfigError {
                field: "location.longitude".to_string(),
            }),
            (None, Some(_)) => Err(RelayError::MissingConfigError {
                field: "location.latitude".to_string(),
            }),
            (None, None) => {
                let url = validation::validate_required_field(
                    "location.provider_url",
                    &self.location.provider_url,
                )?;
                Ok(ConfiguredLocation::Ip(IpLocation::new(url.clone())))
            }
        }
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.schedule
            .refresh_minutes
            .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)))
    }
}

impl ConfigProvider for RelayConfig {
    fn base_url(&self) -> &str {
        &self.relay.base_url
    }

    fn location_options(&self) -> LocationOptions {
        LocationOptions {
            timeout: Duration::from_millis(self.location.timeout_ms),
            maximum_age: Duration::from_millis(self.location.maximum_age_ms),
        }
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("relay.base_url", &self.relay.base_url)?;

        if let Some(latitude) = self.location.latitude {
            validation::validate_latitude("location.latitude", latitude)?;
        }
        if let Some(longitude) = self.location.longitude {
            validation::validate_longitude("location.longitude", longitude)?;
        }
        if let Some(url) = &self.location.provider_url {
            validation::validate_url("location.provider_url", url)?;
        }
        validation::validate_positive_number("location.timeout_ms", self.location.timeout_ms, 1)?;

        if let Some(minutes) = self.schedule.refresh_minutes {
            validation::validate_range(
                "schedule.refresh_minutes",
                minutes,
                1,
                MAX_REFRESH_MINUTES,
            )?;
        }

        self.location_source().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_constants() {
        let config = RelayConfig::from_toml_str("").unwrap();

        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.location_options(), LocationOptions::default());
        assert_eq!(config.refresh_interval(), None);
    }

    #[test]
    fn test_parse_full_config() {
        let config = RelayConfig::from_toml_str(
            r#"
[relay]
base_url = "http://localhost:9000/poems"

[location]
latitude = 42.294615
longitude = 71.302342
timeout_ms = 5000
maximum_age_ms = 0

[schedule]
refresh_minutes = 30
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.base_url(), "http://localhost:9000/poems");
        assert_eq!(
            config.location_options(),
            LocationOptions {
                timeout: Duration::from_millis(5000),
                maximum_age: Duration::ZERO,
            }
        );
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(1800)));
        assert!(matches!(
            config.location_source().unwrap(),
            ConfiguredLocation::Static(_)
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("EVERY_MOMENT_TEST_HOST", "poems.example.org");
        let config = RelayConfig::from_toml_str(
            r#"
[relay]
base_url = "http://${EVERY_MOMENT_TEST_HOST}/planets_stars_every_moment"
[location]
provider_url = "http://${EVERY_MOMENT_TEST_UNSET_VAR}/json"
"#,
        )
        .unwrap();

        assert_eq!(
            config.base_url(),
            "http://poems.example.org/planets_stars_every_moment"
        );
        assert_eq!(
            config.location.provider_url.as_deref(),
            Some("http://${EVERY_MOMENT_TEST_UNSET_VAR}/json")
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = RelayConfig::default();
        config.location.latitude = Some(10.0);
        config.location.longitude = Some(20.0);
        assert!(config.validate().is_ok());

        config.relay.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.relay.base_url = DEFAULT_BASE_URL.to_string();
        config.location.latitude = Some(95.0);
        assert!(config.validate().is_err());

        config.location.latitude = Some(10.0);
        config.location.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_location_source_requires_a_source() {
        let config = RelayConfig::default();
        assert!(matches!(
            config.location_source(),
            Err(RelayError::MissingConfigError { .. })
        ));

        let mut half = RelayConfig::default();
        half.location.latitude = Some(1.0);
        assert!(matches!(
            half.location_source(),
            Err(RelayError::MissingConfigError { field }) if field == "location.longitude"
        ));

        let mut ip = RelayConfig::default();
        ip.location.provider_url = Some("http://ip-api.com/json".to_string());
        assert!(matches!(
            ip.location_source().unwrap(),
            ConfiguredLocation::Ip(_)
        ));
    }

    #[test]
    fn test_huge_refresh_interval_is_rejected_without_overflow() {
        let mut config = RelayConfig::default();
        config.location.latitude = Some(1.0);
        config.location.longitude = Some(2.0);
        config.schedule.refresh_minutes = Some(MAX_REFRESH_MINUTES);
        assert!(config.validate().is_ok());

        config.schedule.refresh_minutes = Some(u64::MAX);
        assert!(matches!(
            config.validate(),
            Err(RelayError::InvalidConfigValueError { .. })
        ));
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(u64::MAX)));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = RelayConfig::from_toml_str("[relay\nbase_url = 1");
        assert!(matches!(result, Err(RelayError::ConfigError { .. })));
    }
}
