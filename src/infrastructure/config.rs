use crate::application::range_controller::RefreshOptions;
use crate::domain::range::DateRange;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub source: SourceSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    /// IANA zone defining calendar days
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Maximum interval samples per query, most recent first
    #[serde(default = "default_interval_sample_limit")]
    pub interval_sample_limit: usize,
    #[serde(default)]
    pub default_range: DateRange,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_interval_sample_limit() -> usize {
    100
}

fn default_export_path() -> PathBuf {
    PathBuf::from("data/health_export.json")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            interval_sample_limit: default_interval_sample_limit(),
            default_range: DateRange::default(),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            export_path: default_export_path(),
        }
    }
}

impl EngineSettings {
    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn refresh_options(&self) -> anyhow::Result<RefreshOptions> {
        if self.interval_sample_limit == 0 {
            anyhow::bail!("engine.interval_sample_limit must be at least 1");
        }

        Ok(RefreshOptions {
            tz: self.timezone()?,
            interval_sample_limit: self.interval_sample_limit,
        })
    }
}

/// Load `config/dashboard.*` (optional) overlaid with `DASHBOARD__SECTION__KEY`
/// environment variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
