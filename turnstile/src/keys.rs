//! Sources of signing keys and the cache that sits in front of them

use std::{error::Error as StdError, fmt, sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderName},
    Client, StatusCode,
};
use turnstile_clock::{Clock, System, UnixTime};
use turnstile_jose::Jwks;

use crate::error::{ConfigError, FetchError};

/// A clock that can be shared across tasks
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Values from a previous response that allow the next fetch to be
/// conditional
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CacheValidators {
    etag: Option<String>,
    last_modified: Option<String>,
}

impl CacheValidators {
    /// Constructs validators from an entity tag and a modification date
    #[must_use]
    pub fn new(etag: Option<String>, last_modified: Option<String>) -> Self {
        Self {
            etag,
            last_modified,
        }
    }

    /// The entity tag of the cached document
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// When the cached document was last modified
    #[must_use]
    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    /// Whether there is nothing to make a fetch conditional on
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// The result of a key set fetch
#[derive(Debug)]
pub enum Fetched {
    /// A new key set document
    Modified {
        /// The keys
        jwks: Jwks,
        /// Validators for the next conditional fetch
        validators: CacheValidators,
    },
    /// The previously fetched document is still current
    NotModified,
}

/// A place key sets can be fetched from
#[async_trait]
pub trait KeySetSource: fmt::Debug + Send + Sync {
    /// Fetches the current key set
    ///
    /// A source may answer [`Fetched::NotModified`] only when `validators`
    /// is not empty.
    ///
    /// # Errors
    ///
    /// The key set could not be fetched or decoded.
    async fn fetch(&self, validators: &CacheValidators) -> Result<Fetched, FetchError>;
}

#[async_trait]
impl<T> KeySetSource for Arc<T>
where
    T: KeySetSource + ?Sized,
{
    async fn fetch(&self, validators: &CacheValidators) -> Result<Fetched, FetchError> {
        (**self).fetch(validators).await
    }
}

/// Fetches a key set document over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    url: String,
    client: Client,
    timeout: Duration,
}

impl HttpKeySetSource {
    /// Constructs a source for `url` that gives up on a fetch after `timeout`
    ///
    /// # Errors
    ///
    /// The HTTP client could not be constructed.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(concat!("turnstile/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self::with_client(url, client, timeout))
    }

    /// Constructs a source that uses an existing client
    #[must_use]
    pub fn with_client(url: impl Into<String>, client: Client, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client,
            timeout,
        }
    }

    /// The key set location
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_document(&self, validators: &CacheValidators) -> Result<Fetched, FetchError> {
        let mut request = self.client.get(&self.url);

        if let Some(etag) = validators.etag() {
            request = request.header(header::IF_NONE_MATCH, etag);
        } else if let Some(last_modified) = validators.last_modified() {
            request = request.header(header::IF_MODIFIED_SINCE, last_modified);
        }

        let response = request.send().await.map_err(|err| self.transport(err))?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            tracing::debug!("JWKS not modified");
            return Ok(Fetched::NotModified);
        } else if !status.is_success() {
            tracing::warn!(
                http.status_code = status.as_u16(),
                "JWKS fetch failed; unexpected response status",
            );
            return Err(FetchError::Status(status.as_u16()));
        }

        let validators = CacheValidators {
            etag: header_string(response.headers(), &header::ETAG),
            last_modified: header_string(response.headers(), &header::LAST_MODIFIED),
        };

        let body = response.bytes().await.map_err(|err| self.transport(err))?;

        match serde_json::from_slice::<Jwks>(&body) {
            Ok(jwks) => Ok(Fetched::Modified { jwks, validators }),
            Err(err) => {
                let error: &dyn StdError = &err;
                tracing::warn!(error, "JWKS fetch failed; invalid key set document");
                Err(FetchError::Decode(err))
            }
        }
    }

    fn transport(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            let error: &dyn StdError = &err;
            tracing::warn!(error, "JWKS fetch failed; unexpected error");
            FetchError::transport(err)
        }
    }
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    #[tracing::instrument(skip(self, validators), fields(jwks.url = %self.url))]
    async fn fetch(&self, validators: &CacheValidators) -> Result<Fetched, FetchError> {
        match tokio::time::timeout(self.timeout, self.fetch_document(validators)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "JWKS fetch failed; timed out");
                Err(FetchError::Timeout(self.timeout))
            }
        }
    }
}

/// A key set along with when it was obtained
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySetSnapshot {
    jwks: Jwks,
    fetched_at: UnixTime,
    validators: CacheValidators,
}

impl KeySetSnapshot {
    /// The keys
    #[must_use]
    pub fn jwks(&self) -> &Jwks {
        &self.jwks
    }

    /// When the keys were fetched or last confirmed to be current
    #[must_use]
    pub fn fetched_at(&self) -> UnixTime {
        self.fetched_at
    }

    /// Validators from the response that produced the keys
    #[must_use]
    pub fn validators(&self) -> &CacheValidators {
        &self.validators
    }
}

struct CacheInner {
    source: Box<dyn KeySetSource>,
    snapshot: ArcSwapOption<KeySetSnapshot>,
    ttl: Duration,
    clock: SharedClock,
}

/// A key set that is fetched on first use and refetched once it is older
/// than its time-to-live
///
/// Readers always see a complete snapshot; a refresh replaces the snapshot
/// atomically and a failed refresh leaves it untouched. Clones share the
/// same snapshot.
#[derive(Clone)]
#[must_use]
pub struct KeySetCache {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySetCache")
            .field("source", &self.inner.source)
            .field("ttl", &self.inner.ttl)
            .field("snapshot", &self.inner.snapshot.load_full())
            .finish_non_exhaustive()
    }
}

impl KeySetCache {
    /// Constructs an empty cache in front of `source`
    pub fn new(source: impl KeySetSource + 'static, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, Arc::new(System))
    }

    /// Constructs an empty cache that measures age using `clock`
    pub fn with_clock(source: impl KeySetSource + 'static, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source: Box::new(source),
                snapshot: ArcSwapOption::empty(),
                ttl,
                clock,
            }),
        }
    }

    /// The time-to-live of a snapshot
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// The clock used to measure snapshot age
    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.inner.clock
    }

    /// The held snapshot, whatever its age, without fetching
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<KeySetSnapshot>> {
        self.inner.snapshot.load_full()
    }

    /// Returns a snapshot no older than the time-to-live
    ///
    /// The held snapshot is returned if it is fresh. Otherwise the source is
    /// consulted.
    ///
    /// # Errors
    ///
    /// No fresh snapshot is held and the fetch failed. A stale snapshot is
    /// never returned.
    pub async fn current(&self) -> Result<Arc<KeySetSnapshot>, FetchError> {
        if let Some(snapshot) = self.inner.snapshot.load_full() {
            if self.is_fresh(&snapshot) {
                return Ok(snapshot);
            }

            tracing::debug!(fetched_at = snapshot.fetched_at.0, "JWKS expired");
        }

        self.refresh().await
    }

    fn is_fresh(&self, snapshot: &KeySetSnapshot) -> bool {
        self.inner
            .clock
            .now()
            .saturating_duration_since(snapshot.fetched_at)
            < self.inner.ttl
    }

    /// Fetches from the source unconditionally and installs the result
    ///
    /// The fetch is made conditional on the held snapshot's validators. When
    /// the source reports that nothing changed, the held keys are kept and
    /// their age is reset. No retries are attempted.
    ///
    /// # Errors
    ///
    /// The fetch failed. The held snapshot is left as it was.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<KeySetSnapshot>, FetchError> {
        tracing::debug!("refreshing JWKS");

        let previous = self.inner.snapshot.load_full();
        let validators = previous
            .as_ref()
            .map(|s| s.validators.clone())
            .unwrap_or_default();

        let fetched = self.inner.source.fetch(&validators).await.map_err(|err| {
            let error: &dyn StdError = &err;
            tracing::warn!(error, "JWKS refresh failed; keeping previous keys");
            err
        })?;

        let fetched_at = self.inner.clock.now();

        let snapshot = match (fetched, previous) {
            (Fetched::Modified { jwks, validators }, _) => {
                tracing::info!(jwks.keys = jwks.keys().len(), "JWKS refreshed");
                KeySetSnapshot {
                    jwks,
                    fetched_at,
                    validators,
                }
            }
            (Fetched::NotModified, Some(previous)) => KeySetSnapshot {
                jwks: previous.jwks.clone(),
                fetched_at,
                validators: previous.validators.clone(),
            },
            (Fetched::NotModified, None) => {
                tracing::warn!("JWKS refresh failed; not modified without a cached key set");
                return Err(FetchError::Status(StatusCode::NOT_MODIFIED.as_u16()));
            }
        };

        let snapshot = Arc::new(snapshot);
        self.inner.snapshot.store(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    /// Installs a key set directly, as if it had just been fetched
    pub fn set(&self, jwks: Jwks) {
        let snapshot = KeySetSnapshot {
            jwks,
            fetched_at: self.inner.clock.now(),
            validators: CacheValidators::default(),
        };

        self.inner.snapshot.store(Some(Arc::new(snapshot)));
    }

    /// Spawns a task that refreshes the key set on a fixed interval
    ///
    /// The first refresh happens one interval from now. Failures are logged
    /// and the next attempt is made on the following tick.
    pub fn spawn_refresh(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let this = self.clone();

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.tick().await;

            loop {
                timer.tick().await;
                // Failures are already logged; try again next time
                let _ = this.refresh().await;
            }
        })
    }
}
