use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;

/// Source of raw resource bytes, keyed by URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
  async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP fetcher backed by a shared reqwest client
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new(config: &Config) -> color_eyre::Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(config.http.user_agent.clone())
      .build()
      .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
    let transport = |source: reqwest::Error| {
      if source.is_connect() || source.is_timeout() {
        FetchError::Unreachable {
          url: url.to_string(),
          source,
        }
      } else {
        FetchError::Transport {
          url: url.to_string(),
          source,
        }
      }
    };

    debug!(url, "GET");
    let response = self.client.get(url).send().await.map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    let body = response.bytes().await.map_err(transport)?;
    debug!(url, bytes = body.len(), "response received");

    Ok(body.to_vec())
  }
}

/// In-process fetcher for tests: serves canned bodies and can be switched
/// offline, where every request answers 503.
#[cfg(test)]
pub(crate) mod testing {
  use super::*;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::Mutex;

  #[derive(Default)]
  pub struct ScriptedFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    offline: AtomicBool,
    calls: AtomicUsize,
  }

  impl ScriptedFetcher {
    pub fn new() -> Self {
      Self::default()
    }

    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
      self.bodies.lock().unwrap().insert(url.to_string(), body.into());
    }

    pub fn set_offline(&self, offline: bool) {
      self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.offline.load(Ordering::SeqCst) {
        return Err(FetchError::Status {
          url: url.to_string(),
          status: 503,
        });
      }
      self
        .bodies
        .lock()
        .unwrap()
        .get(url)
        .cloned()
        .ok_or_else(|| FetchError::Status {
          url: url.to_string(),
          status: 404,
        })
    }
  }
}
