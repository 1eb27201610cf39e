//! Prometheus counters, rendered in the text exposition format at `/metrics`.

use std::fmt;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    pub status: String,
}

#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    http_requests: Family<RequestLabels, Counter>,
    chapter_views: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let http_requests = Family::<RequestLabels, Counter>::default();
        let chapter_views = Counter::default();
        registry.register(
            "http_requests",
            "HTTP requests by method and response status",
            http_requests.clone(),
        );
        registry.register(
            "chapter_views",
            "Chapter views counted for readers",
            chapter_views.clone(),
        );
        Self {
            registry,
            http_requests,
            chapter_views,
        }
    }

    pub fn observe_request(&self, method: &str, status: u16) {
        self.http_requests
            .get_or_create(&RequestLabels {
                method: method.to_owned(),
                status: status.to_string(),
            })
            .inc();
    }

    pub fn chapter_viewed(&self) {
        self.chapter_views.inc();
    }

    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
