//! Downloading stylesheets and images.

use std::time::Duration;

use ureq::Agent;

use crate::error::{ReduceError, Result};

/// Retrieves remote resources.
pub trait Fetch: Send + Sync {
    fn download_text(&self, url: &str) -> Result<String>;
    fn download_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher sharing one connection pool.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    /// Fetcher whose requests give up after `timeout` end to end.
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl Fetch for HttpFetcher {
    fn download_text(&self, url: &str) -> Result<String> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| ReduceError::fetch(url, e))?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|e| ReduceError::fetch(url, e))
    }

    fn download_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| ReduceError::fetch(url, e))?;
        response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ReduceError::fetch(url, e))
    }
}
