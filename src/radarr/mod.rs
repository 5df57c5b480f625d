use crate::collector::{ApiRequest, Collector, Feed};
use crate::config::RadarrConfig;
use tracing::instrument;

const PAGE_SIZE: u32 = 1000;

pub struct RadarrClient {
    collector: Collector,
    config: RadarrConfig,
}

impl RadarrClient {
    pub fn new(collector: Collector, config: RadarrConfig) -> Self {
        Self { collector, config }
    }

    pub fn id(&self) -> u32 {
        self.config.server.id
    }

    fn request(&self, path: &str) -> ApiRequest {
        let server = &self.config.server;
        ApiRequest::new(&server.base_url(), path, &server.api_key, server.verify_ssl)
    }

    pub fn missing_request(&self) -> ApiRequest {
        self.request("/api/v3/movie")
    }

    pub fn queue_request(&self) -> ApiRequest {
        self.request("/api/v3/queue")
            .param("pageSize", PAGE_SIZE)
            .param("includeMovie", true)
    }

    /// Monitored movies without a file.
    #[instrument(skip(self), fields(server = self.config.server.id))]
    pub async fn get_missing(&self) -> usize {
        self.collector
            .collect(self.id(), Feed::RadarrMissing, &self.missing_request())
            .await
    }

    #[instrument(skip(self), fields(server = self.config.server.id))]
    pub async fn get_queue(&self) -> usize {
        self.collector
            .collect(self.id(), Feed::RadarrQueue, &self.queue_request())
            .await
    }
}
