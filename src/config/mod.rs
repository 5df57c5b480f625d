use crate::models::ServerId;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

const DEFAULT_RUN_SECONDS: u64 = 300;

fn default_true() -> bool {
    true
}

fn default_run_seconds() -> u64 {
    DEFAULT_RUN_SECONDS
}

fn default_missing_days() -> u32 {
    7
}

fn default_future_days() -> u32 {
    1
}

fn default_influx_port() -> u16 {
    8086
}

fn default_database() -> String {
    "varken".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Configuration {
    pub influxdb: InfluxConfig,
    #[serde(default)]
    pub sonarr: Vec<SonarrConfig>,
    #[serde(default)]
    pub radarr: Vec<RadarrConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InfluxConfig {
    pub url: String,
    #[serde(default = "default_influx_port")]
    pub port: u16,
    #[serde(default)]
    pub ssl: bool,
    #[serde(rename = "verifySsl", default)]
    pub verify_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
}

/// Connection settings shared by every Sonarr/Radarr server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub id: ServerId,
    pub url: String,
    #[serde(rename = "apikey")]
    pub api_key: String,
    #[serde(default)]
    pub ssl: bool,
    #[serde(rename = "verifySsl", default)]
    pub verify_ssl: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SonarrConfig {
    #[serde(flatten)]
    pub server: ServerConfig,
    #[serde(rename = "missingDays", default = "default_missing_days")]
    pub missing_days: u32,
    #[serde(rename = "missingDaysRunSeconds", default = "default_run_seconds")]
    pub missing_days_run_seconds: u64,
    #[serde(rename = "futureDays", default = "default_future_days")]
    pub future_days: u32,
    #[serde(rename = "futureDaysRunSeconds", default = "default_run_seconds")]
    pub future_days_run_seconds: u64,
    #[serde(default = "default_true")]
    pub queue: bool,
    #[serde(rename = "queueRunSeconds", default = "default_run_seconds")]
    pub queue_run_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RadarrConfig {
    #[serde(flatten)]
    pub server: ServerConfig,
    #[serde(rename = "getMissing", default = "default_true")]
    pub get_missing: bool,
    #[serde(rename = "getMissingRunSeconds", default = "default_run_seconds")]
    pub get_missing_run_seconds: u64,
    #[serde(default = "default_true")]
    pub queue: bool,
    #[serde(rename = "queueRunSeconds", default = "default_run_seconds")]
    pub queue_run_seconds: u64,
}

fn with_scheme(url: &str, ssl: bool) -> String {
    let url = url.trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}://{}", if ssl { "https" } else { "http" }, url)
    }
}

impl ServerConfig {
    /// Base URL with a scheme; `ssl` picks it when the configured url has none.
    pub fn base_url(&self) -> String {
        with_scheme(&self.url, self.ssl)
    }
}

impl InfluxConfig {
    pub fn base_url(&self) -> String {
        format!("{}:{}", with_scheme(&self.url, self.ssl), self.port)
    }
}

impl Configuration {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Configuration = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sonarr.is_empty() && self.radarr.is_empty() {
            bail!("No sonarr or radarr servers configured");
        }

        check_servers("sonarr", self.sonarr.iter().map(|s| &s.server))?;
        check_servers("radarr", self.radarr.iter().map(|r| &r.server))?;

        for sonarr in &self.sonarr {
            let intervals = [
                sonarr.missing_days_run_seconds,
                sonarr.future_days_run_seconds,
                sonarr.queue_run_seconds,
            ];
            if intervals.contains(&0) {
                bail!("sonarr server {} has a run interval of 0 seconds", sonarr.server.id);
            }
        }
        for radarr in &self.radarr {
            if radarr.get_missing_run_seconds == 0 || radarr.queue_run_seconds == 0 {
                bail!("radarr server {} has a run interval of 0 seconds", radarr.server.id);
            }
        }

        Ok(())
    }
}

fn check_servers<'a>(service: &str, servers: impl Iterator<Item = &'a ServerConfig>) -> Result<()> {
    let mut ids = HashSet::new();
    for server in servers {
        if !ids.insert(server.id) {
            bail!("Duplicate {} server id {}", service, server.id);
        }
        if server.api_key.trim().is_empty() {
            bail!("{} server {} has an empty apikey", service, server.id);
        }
    }
    Ok(())
}

impl SonarrConfig {
    pub fn missing_interval(&self) -> Duration {
        Duration::from_secs(self.missing_days_run_seconds)
    }

    pub fn future_interval(&self) -> Duration {
        Duration::from_secs(self.future_days_run_seconds)
    }

    pub fn queue_interval(&self) -> Duration {
        Duration::from_secs(self.queue_run_seconds)
    }
}

impl RadarrConfig {
    pub fn missing_interval(&self) -> Duration {
        Duration::from_secs(self.get_missing_run_seconds)
    }

    pub fn queue_interval(&self) -> Duration {
        Duration::from_secs(self.queue_run_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
influxdb:
  url: influx.local
  username: root
  password: secret
sonarr:
  - id: 1
    url: sonarr.local:8989
    apikey: abc
    ssl: true
    missingDays: 14
    queue: false
radarr:
  - id: 2
    url: http://radarr.local:7878/
    apikey: def
    getMissingRunSeconds: 60
"#;

    #[test]
    fn parses_sample_with_defaults() {
        let config = Configuration::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.influxdb.port, 8086);
        assert_eq!(config.influxdb.database, "varken");
        assert_eq!(config.influxdb.base_url(), "http://influx.local:8086");

        let sonarr = &config.sonarr[0];
        assert_eq!(sonarr.server.base_url(), "https://sonarr.local:8989");
        assert_eq!(sonarr.missing_days, 14);
        assert_eq!(sonarr.future_days, 1);
        assert!(!sonarr.queue);
        assert!(!sonarr.server.verify_ssl);
        assert_eq!(sonarr.future_interval(), Duration::from_secs(300));

        let radarr = &config.radarr[0];
        assert_eq!(radarr.server.base_url(), "http://radarr.local:7878");
        assert!(radarr.get_missing);
        assert_eq!(radarr.missing_interval(), Duration::from_secs(60));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = r#"
influxdb: {url: influx.local}
radarr:
  - {id: 1, url: a, apikey: x}
  - {id: 1, url: b, apikey: y}
"#;
        let err = Configuration::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate radarr server id 1"));
    }

    #[test]
    fn rejects_empty_apikey_and_zero_interval() {
        let yaml = "influxdb: {url: i}\nsonarr:\n  - {id: 1, url: a, apikey: ' '}\n";
        assert!(Configuration::from_yaml(yaml).is_err());

        let yaml = "influxdb: {url: i}\n\
                    radarr:\n  - {id: 1, url: a, apikey: k, queueRunSeconds: 0}\n";
        assert!(Configuration::from_yaml(yaml).is_err());
    }

    #[test]
    fn rejects_config_without_servers() {
        assert!(Configuration::from_yaml("influxdb: {url: i}\n").is_err());
    }
}
