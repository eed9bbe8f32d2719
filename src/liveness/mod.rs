//! Liveness oracle: decides whether a work's direct URL is currently
//! reachable.
//!
//! Probing is network-bound and slow relative to everything else in a page
//! construction, so results are cached per oracle for a short, configurable
//! TTL. One pagination sweep at normal client cadence lands inside a single
//! TTL window, which keeps sequential pages consistent with each other.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::debug;

const CONNECT_TIMEOUT_SECS: u64 = 5;
const USER_AGENT: &str = concat!("commons-search/", env!("CARGO_PKG_VERSION"));

/// Outcome of a reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    Dead,
}

/// Reachability probe for a work's direct URL.
#[async_trait]
pub trait LivenessOracle: Send + Sync {
    /// Probe a URL. Failures and timeouts report `Dead` (fail closed); this
    /// never surfaces an error to page construction.
    async fn probe(&self, url: &str) -> Liveness;
}

/// Knobs for the HTTP prober.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout: Duration,
    /// Zero disables caching entirely.
    pub cache_ttl: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(30),
        }
    }
}

/// HEAD-request prober with a short-TTL in-memory result cache.
pub struct HttpProber {
    client: Client,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, (Instant, Liveness)>>,
}

impl HttpProber {
    pub fn new(config: &ProbeConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            cache_ttl: config.cache_ttl,
            cache: Mutex::new(HashMap::new()),
        })
    }

    async fn cached(&self, url: &str) -> Option<Liveness> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let cache = self.cache.lock().await;
        cache
            .get(url)
            .filter(|(probed_at, _)| probed_at.elapsed() < self.cache_ttl)
            .map(|(_, liveness)| *liveness)
    }

    async fn remember(&self, url: &str, liveness: Liveness) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.lock().await;
        cache.insert(url.to_string(), (Instant::now(), liveness));
    }
}

#[async_trait]
impl LivenessOracle for HttpProber {
    async fn probe(&self, url: &str) -> Liveness {
        if let Some(liveness) = self.cached(url).await {
            return liveness;
        }

        let liveness = match self.client.head(url).send().await {
            Ok(response) if response.status().is_success() => Liveness::Live,
            Ok(response) => {
                debug!(url, status = %response.status(), "probe reported dead link");
                Liveness::Dead
            }
            Err(err) => {
                debug!(url, error = %err, "probe failed, treating link as dead");
                Liveness::Dead
            }
        };

        self.remember(url, liveness).await;
        liveness
    }
}
