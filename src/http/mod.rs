use crate::collector::{ApiRequest, ConnectionHandler};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

const USER_AGENT: &str = concat!("arrstats/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP transport for every Sonarr/Radarr server.
///
/// TLS verification is a per-server setting, so two clients are built up
/// front and picked per request.
#[derive(Clone)]
pub struct HttpClient {
    verified: Client,
    unverified: Client,
}

fn build_client(accept_invalid_certs: bool) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?)
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            verified: build_client(false)?,
            unverified: build_client(true)?,
        })
    }

    fn client_for(&self, request: &ApiRequest) -> &Client {
        if request.verify_ssl {
            &self.verified
        } else {
            &self.unverified
        }
    }

    #[instrument(skip(self, request), fields(path = %request.path))]
    pub async fn get_json(&self, request: &ApiRequest) -> Result<Value> {
        let url = request_url(request)?;
        debug!("Making GET request");

        let response = self
            .client_for(request)
            .get(url)
            .header("X-Api-Key", &request.api_key)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                return Err(anyhow!("Unauthorized, check the apikey for {}", request.base_url));
            }
            StatusCode::NOT_FOUND => {
                return Err(anyhow!("Endpoint {} not found on {}", request.path, request.base_url));
            }
            status => return Err(anyhow!("HTTP request failed: {}", status)),
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Joins base url, path and query params.
pub fn request_url(request: &ApiRequest) -> Result<Url> {
    let mut url = Url::parse(&request.base_url)?;
    let path = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        request.path.trim_start_matches('/')
    );
    url.set_path(&path);
    if !request.params.is_empty() {
        url.query_pairs_mut().extend_pairs(request.params.iter());
    }
    Ok(url)
}

#[async_trait]
impl ConnectionHandler for HttpClient {
    async fn fetch(&self, request: &ApiRequest) -> Option<Value> {
        match self.get_json(request).await {
            Ok(value) => Some(value),
            Err(e) => {
                error!(base_url = %request.base_url, path = %request.path, "Request failed: {}", e);
                None
            }
        }
    }
}
