pub mod toml_config;

pub use toml_config::RelayConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "every-moment-relay")]
#[command(about = "Relays location-keyed poems from the poem server to the watch")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Poem server base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Fixed latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Fixed longitude in decimal degrees, passed to the server unmodified
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// IP geolocation endpoint used when no fixed coordinates are given
    #[arg(long)]
    pub location_url: Option<String>,

    /// Location acquisition timeout in milliseconds
    #[arg(long)]
    pub location_timeout_ms: Option<u64>,

    /// Maximum age of a reusable location fix in milliseconds
    #[arg(long)]
    pub maximum_age_ms: Option<u64>,

    /// Request a new poem every N minutes in addition to device messages
    #[arg(long)]
    pub refresh_minutes: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the config file, if any, and applies command-line overrides on top.
    pub fn resolve(&self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::from_file(path)?,
            None => RelayConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.relay.base_url = base_url.clone();
        }
        if self.latitude.is_some() || self.longitude.is_some() {
            config.location.latitude = self.latitude;
            config.location.longitude = self.longitude;
        }
        if let Some(url) = &self.location_url {
            config.location.provider_url = Some(url.clone());
        }
        if let Some(timeout_ms) = self.location_timeout_ms {
            config.location.timeout_ms = timeout_ms;
        }
        if let Some(maximum_age_ms) = self.maximum_age_ms {
            config.location.maximum_age_ms = maximum_age_ms;
        }
        if let Some(minutes) = self.refresh_minutes {
            config.schedule.refresh_minutes = Some(minutes);
        }

        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_parse_negative_coordinates() {
        let cli = CliConfig::try_parse_from([
            "every-moment-relay",
            "--latitude",
            "-33.86",
            "--longitude",
            "-71.302342",
        ])
        .unwrap();

        assert_eq!(cli.latitude, Some(-33.86));
        assert_eq!(cli.longitude, Some(-71.302342));
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[relay]\nbase_url = \"http://file.example/poems\"\n[location]\nprovider_url = \"http://ip.example/json\"\ntimeout_ms = 1000"
        )
        .unwrap();

        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            location_timeout_ms: Some(2500),
            refresh_minutes: Some(15),
            ..CliConfig::default()
        };
        let config = cli.resolve().unwrap();

        assert_eq!(config.base_url(), "http://file.example/poems");
        assert_eq!(config.location_options().timeout, Duration::from_millis(2500));
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(900)));
        assert_eq!(
            config.location.provider_url.as_deref(),
            Some("http://ip.example/json")
        );
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/every-moment.toml")),
            ..CliConfig::default()
        };
        assert!(matches!(
            cli.resolve(),
            Err(crate::utils::error::RelayError::IoError(_))
        ));
    }
}
