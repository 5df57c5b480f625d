//! InfluxDB 1.x writer. Points go out as line protocol over `/write`.

use crate::collector::PointSink;
use crate::config::InfluxConfig;
use crate::models::{MetricPoint, TagValue};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument};

const MAX_BATCH: usize = 5_000;
const MEASUREMENT_SPECIAL: &[char] = &['\\', ',', ' '];
const TAG_SPECIAL: &[char] = &['\\', ',', '=', ' '];
const FIELD_SPECIAL: &[char] = &['\\', '"'];

#[derive(Clone)]
pub struct InfluxClient {
    http: Client,
    config: InfluxConfig,
}

fn escape(text: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            c if special.contains(&c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Renders a tag value the way the Python InfluxDB client did, so existing
/// series keep their keys (`True`/`False` for bools). `None` drops the tag.
fn tag_text(value: &TagValue) -> Option<String> {
    let text = match value {
        TagValue::Bool(true) => "True".to_string(),
        TagValue::Bool(false) => "False".to_string(),
        TagValue::Int(n) => n.to_string(),
        TagValue::Str(s) => s.clone(),
        TagValue::Null => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// One line of line protocol, tags sorted by key.
pub fn to_line(point: &MetricPoint) -> String {
    let mut tags: Vec<(&str, String)> = point
        .tags
        .iter()
        .filter_map(|(key, value)| tag_text(value).map(|text| (key, text)))
        .collect();
    tags.sort_by(|a, b| a.0.cmp(b.0));

    let mut line = escape(point.measurement.as_str(), MEASUREMENT_SPECIAL);
    for (key, value) in tags {
        line.push(',');
        line.push_str(&escape(key, TAG_SPECIAL));
        line.push('=');
        line.push_str(&escape(&value, TAG_SPECIAL));
    }
    line.push_str(" hash=\"");
    line.push_str(&escape(&point.fields.hash, FIELD_SPECIAL));
    line.push('"');
    if let Some(nanos) = point.timestamp.timestamp_nanos_opt() {
        line.push(' ');
        line.push_str(&nanos.to_string());
    }
    line
}

impl InfluxClient {
    pub fn new(config: InfluxConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;
        Ok(Self { http, config })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => builder.basic_auth(user, self.config.password.as_ref()),
            None => builder,
        }
    }

    #[instrument(skip(self), fields(database = %self.config.database))]
    pub async fn ensure_database(&self) -> Result<()> {
        let query = format!("CREATE DATABASE \"{}\"", self.config.database);
        let url = format!(
            "{}/query?q={}",
            self.config.base_url(),
            urlencoding::encode(&query)
        );

        let response = self.authed(self.http.post(&url)).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Creating database failed: {}", response.status()));
        }
        info!("Database ready");
        Ok(())
    }

    async fn write_lines(&self, body: String) -> Result<()> {
        let url = format!(
            "{}/write?db={}",
            self.config.base_url(),
            urlencoding::encode(&self.config.database)
        );

        let response = self.authed(self.http.post(&url)).body(body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("InfluxDB write failed: {} {}", status, text));
        }
        Ok(())
    }
}

#[async_trait]
impl PointSink for InfluxClient {
    async fn write_points(&self, points: Vec<MetricPoint>) -> Result<()> {
        for chunk in points.chunks(MAX_BATCH) {
            let body = chunk.iter().map(to_line).collect::<Vec<_>>().join("\n");
            self.write_lines(body).await?;
            debug!("Wrote {} points to InfluxDB", chunk.len());
        }
        Ok(())
    }
}
