use crate::core::errors::{Error, Result};
use crate::core::ip_ranges::IpRanges;
use crate::core::shared::SharedIpRanges;
use log::{info, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::{thread, time};

/*-------------------------------------------------------------------------------------------------
  Simple Interface
-------------------------------------------------------------------------------------------------*/

/// _**Simple library interface**_ quickly retrieves and parses the GitHub IP ranges using the
/// default client configuration. Returns a boxed [IpRanges] object that answers address
/// queries ([is_known](IpRanges::is_known()), [range_for](IpRanges::range_for())) and
/// supports [search](IpRanges::search()) and [filter](IpRanges::filter()).
///
/// ```no_run
/// let ip_ranges = githubipranges::get_ranges()?;
///
/// let addr = "192.30.252.1".parse()?;
/// if let Some(ip_range) = ip_ranges.range_for(addr) {
///     println!("{addr} is in {} ({:?})", ip_range.prefix, ip_range.services);
/// }
/// # Ok::<(), githubipranges::Error>(())
/// ```
pub fn get_ranges() -> Result<Box<IpRanges>> {
    Client::new().get_ranges()
}

/*-------------------------------------------------------------------------------------------------
  Client Builder
-------------------------------------------------------------------------------------------------*/

/// A builder for the [Client] struct that allows you to customize the client configuration. The
/// [ClientBuilder] struct provides setters for each configuration value and a
/// [ClientBuilder::build] method to create a [Client] instance.
///
/// ```
/// let client = githubipranges::ClientBuilder::new()
///     .url("https://api.github.com/meta")
///     .cache_file("/tmp/github-meta.json")
///     .cache_time(60 * 60) // 1 hour
///     .retry_count(4)
///     .retry_initial_delay(200) // 200 ms
///     .retry_backoff_factor(2)
///     .retry_timeout(5000) // 5 seconds
///     .build();
/// ```
///
/// The [ClientBuilder::new] method attempts to source configuration values from environment
/// variables when set and uses default values when the environment variables are not set.
///
/// If you want to use the default configuration values, ignoring any environment variables, use
/// the [ClientBuilder::default] method to create a new [ClientBuilder] instance.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    url: String,
    cache_file: PathBuf,
    cache_time: u64,
    retry_count: u32,
    retry_initial_delay: u64,
    retry_backoff_factor: u64,
    retry_timeout: u64,
    user_agent: String,
}

/*--------------------------------------------------------------------------------------
  Client Builder Implementation
--------------------------------------------------------------------------------------*/

impl Default for ClientBuilder {
    /// Create a new [ClientBuilder] with default configuration values.
    ///
    /// ```
    /// let client = githubipranges::ClientBuilder::default().build();
    ///
    /// assert_eq!(client.url(), "https://api.github.com/meta");
    /// assert!(client.cache_file().ends_with("githubipranges/meta.json"));
    /// assert_eq!(client.cache_time(), 86400);
    /// assert_eq!(client.retry_count(), 4);
    /// assert_eq!(client.retry_initial_delay(), 200);
    /// assert_eq!(client.retry_backoff_factor(), 2);
    /// assert_eq!(client.retry_timeout(), 5000);
    /// ```
    fn default() -> Self {
        Self {
            url: "https://api.github.com/meta".to_string(),
            cache_file: dirs::cache_dir()
                .unwrap_or_else(env::temp_dir)
                .join("githubipranges")
                .join("meta.json"), // ${CACHE_DIR}/githubipranges/meta.json
            cache_time: 24 * 60 * 60, // 24 hours
            retry_count: 4,
            retry_initial_delay: 200, // 200 ms
            retry_backoff_factor: 2,
            retry_timeout: 5000, // 5 seconds
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientBuilder {
    /// Create a new [ClientBuilder] reading initial configuration values from
    /// environment variables when set and default values when the environment
    /// variables are not set.
    ///
    /// The environment variables used to set the initial configuration values
    /// are:
    /// - `GITHUBIPRANGES_URL`
    /// - `GITHUBIPRANGES_CACHE_FILE`
    /// - `GITHUBIPRANGES_CACHE_TIME`
    /// - `GITHUBIPRANGES_RETRY_COUNT`
    /// - `GITHUBIPRANGES_RETRY_INITIAL_DELAY`
    /// - `GITHUBIPRANGES_RETRY_BACKOFF_FACTOR`
    /// - `GITHUBIPRANGES_RETRY_TIMEOUT`
    /// - `GITHUBIPRANGES_USER_AGENT`
    pub fn new() -> Self {
        let default = ClientBuilder::default();

        Self {
            url: get_env_var("GITHUBIPRANGES_URL", default.url),
            cache_file: get_env_var("GITHUBIPRANGES_CACHE_FILE", default.cache_file),
            cache_time: get_env_var("GITHUBIPRANGES_CACHE_TIME", default.cache_time),
            retry_count: get_env_var("GITHUBIPRANGES_RETRY_COUNT", default.retry_count),
            retry_initial_delay: get_env_var(
                "GITHUBIPRANGES_RETRY_INITIAL_DELAY",
                default.retry_initial_delay,
            ),
            retry_backoff_factor: get_env_var(
                "GITHUBIPRANGES_RETRY_BACKOFF_FACTOR",
                default.retry_backoff_factor,
            ),
            retry_timeout: get_env_var("GITHUBIPRANGES_RETRY_TIMEOUT", default.retry_timeout),
            user_agent: get_env_var("GITHUBIPRANGES_USER_AGENT", default.user_agent),
        }
    }

    /*-------------------------------------------------------------------------
      Setters
    -------------------------------------------------------------------------*/

    /// Set the URL used to retrieve the GitHub meta document; defaults to
    /// `https://api.github.com/meta`.
    pub fn url<'s>(&'s mut self, url: &str) -> &'s mut Self {
        self.url = url.to_string();
        self
    }

    /// Set the file path used to cache the GitHub meta JSON; defaults to
    /// `${CACHE_DIR}/githubipranges/meta.json`.
    pub fn cache_file<P: AsRef<Path>>(&mut self, cache_file: P) -> &mut Self {
        self.cache_file = cache_file.as_ref().to_path_buf();
        self
    }

    /// Set the cache-time duration - the amount of time (in seconds) the
    /// locally cached JSON is considered fresh; defaults to 24 hours (`86400`
    /// seconds). A cache file whose age reaches `cache_time` is stale and
    /// calls to `get_ranges()` will attempt to refresh it from the URL; `0`
    /// always refreshes.
    pub fn cache_time(&mut self, cache_time: u64) -> &mut Self {
        self.cache_time = cache_time;
        self
    }

    /// Set the number of attempts to retrieve the JSON from the URL; defaults
    /// to `4` attempts.
    pub fn retry_count(&mut self, retry_count: u32) -> &mut Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the initial delay (in milliseconds) between retry attempts;
    /// defaults to `200` milliseconds.
    ///
    /// The delay between retry attempts is calculated as:
    /// `retry_initial_delay * (retry_backoff_factor ^ attempt)`.
    pub fn retry_initial_delay(&mut self, retry_initial_delay: u64) -> &mut Self {
        self.retry_initial_delay = retry_initial_delay;
        self
    }

    /// Set the backoff factor used to increase the delay between retry
    /// attempts; defaults to `2`.
    pub fn retry_backoff_factor(&mut self, retry_backoff_factor: u64) -> &mut Self {
        self.retry_backoff_factor = retry_backoff_factor;
        self
    }

    /// Set the maximum time (in milliseconds) to spend retrieving the JSON
    /// from the URL; defaults to `5000` milliseconds (5 seconds).
    pub fn retry_timeout(&mut self, retry_timeout: u64) -> &mut Self {
        self.retry_timeout = retry_timeout;
        self
    }

    /// Set the `User-Agent` header sent to the URL; the GitHub API rejects
    /// requests without one. Defaults to `githubipranges/<version>`.
    pub fn user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /*-------------------------------------------------------------------------
      Build Method
    -------------------------------------------------------------------------*/

    pub fn build(&self) -> Client {
        Client {
            url: self.url.clone(),
            cache_file: self.cache_file.clone(),
            cache_time: self.cache_time,
            retry_count: self.retry_count,
            retry_initial_delay: self.retry_initial_delay,
            retry_backoff_factor: self.retry_backoff_factor,
            retry_timeout: self.retry_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Client
-------------------------------------------------------------------------------------------------*/

/// A client for retrieving the GitHub IP ranges from the cached JSON file, when available and
/// fresh, or from the URL when the cache is stale or unavailable. Client implements a simple
/// exponential-backoff retry mechanism to retrieve the JSON from the URL.
///
/// The [Client::new] method attempts to source configuration values from environment variables
/// when set and uses default values when the environment variables are not set.
///
/// ```no_run
/// let client = githubipranges::Client::new();
/// let ip_ranges = client.get_ranges().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    cache_file: PathBuf,
    cache_time: u64,
    retry_count: u32,
    retry_initial_delay: u64,
    retry_backoff_factor: u64,
    retry_timeout: u64,
    user_agent: String,
}

/*--------------------------------------------------------------------------------------
  Client Implementation
--------------------------------------------------------------------------------------*/

impl Default for Client {
    /// Create a new [Client] with default configuration values.
    fn default() -> Self {
        ClientBuilder::default().build()
    }
}

impl Client {
    pub fn new() -> Self {
        ClientBuilder::new().build()
    }

    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    /// Get the URL used to retrieve the GitHub meta document.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the file path used to cache the GitHub meta JSON.
    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Get the cache-time duration (in seconds).
    pub fn cache_time(&self) -> u64 {
        self.cache_time
    }

    /// Get the number of attempts to retrieve the JSON from the URL.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Get the initial delay (in milliseconds) between retry attempts.
    pub fn retry_initial_delay(&self) -> u64 {
        self.retry_initial_delay
    }

    /// Get the backoff factor used to increase the delay between retry attempts.
    pub fn retry_backoff_factor(&self) -> u64 {
        self.retry_backoff_factor
    }

    /// Get the maximum time (in milliseconds) to spend retrieving the JSON from the URL.
    pub fn retry_timeout(&self) -> u64 {
        self.retry_timeout
    }

    /// Get the `User-Agent` header sent to the URL.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /*-------------------------------------------------------------------------
      Get Ranges
    -------------------------------------------------------------------------*/

    /// Retrieves, parses, and returns a boxed [IpRanges] object. Uses locally
    /// cached JSON, when available and fresh. Requests the JSON from the URL
    /// when the local cache is stale or unavailable.
    pub fn get_ranges(&self) -> Result<Box<IpRanges>> {
        let json = self.get_json()?;
        IpRanges::from_json(&json)
    }

    /// Retrieves a new [IpRanges] snapshot and publishes it to `shared`. The
    /// current snapshot is kept when retrieval or parsing fails.
    pub fn refresh(&self, shared: &SharedIpRanges) -> Result<()> {
        let ip_ranges = self.get_ranges()?;
        shared.store(*ip_ranges);
        Ok(())
    }

    /*-------------------------------------------------------------------------
      Private Methods
    -------------------------------------------------------------------------*/

    /// Get the GitHub meta JSON from the cache file or URL.
    fn get_json(&self) -> Result<String> {
        info!("Cache time {} seconds", self.cache_time);
        info!("Cache file path: {:?}", &self.cache_file);

        // Check if cache file exists
        let cache_exists = fs::metadata(&self.cache_file).is_ok();
        if cache_exists {
            info!("Cache file exists");
        } else {
            info!("Cache file not found");
        };

        // Check if cache file is fresh
        let cache_is_fresh = cache_exists
            && self
                .cache_age()
                .map(|age| age.as_secs() < self.cache_time)
                .unwrap_or(false);
        if cache_is_fresh {
            info!("Cache file is fresh");
        } else {
            info!("Cache file is stale or missing; refresh cache");
        };

        // Fresh cached JSON
        if cache_is_fresh {
            let fresh_cached_json = self.get_json_from_file();
            if fresh_cached_json.is_ok() {
                return fresh_cached_json;
            }
        };

        // Fresh URL JSON
        let fresh_url_json = self.get_json_from_url();
        if let Ok(fresh_url_json) = fresh_url_json {
            let _ = self.cache_json_to_file(&fresh_url_json);
            return Ok(fresh_url_json);
        };
        let url_result = fresh_url_json;

        // Stale cached JSON
        if cache_exists && !cache_is_fresh {
            let stale_cache_json = self.get_json_from_file();
            if stale_cache_json.is_ok() {
                warn!("Using stale cached GitHub IP ranges");
                return stale_cache_json;
            }
        };

        // Return result (Err) retrieving the JSON from the URL
        url_result
    }

    /// Get the GitHub meta JSON from the URL.
    fn get_json_from_url(&self) -> Result<String> {
        let start_time = time::Instant::now();
        let max_elapsed_time = time::Duration::from_millis(self.retry_timeout);

        let http_client = reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(max_elapsed_time)
            .build()?;

        let mut attempt: u32 = 0;
        loop {
            info!(
                "Get GitHub IP ranges from URL; Attempt {}: GET {}",
                attempt, self.url
            );
            let json: Result<String> = http_client
                .get(&self.url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.text())
                .map_err(Error::from)
                .and_then(validate_json);

            match json {
                Ok(json) => {
                    info!("Get GitHub IP ranges from URL; Attempt {}: Ok", attempt);
                    break Ok(json);
                }
                Err(error) => {
                    log::error!(
                        "Get GitHub IP ranges from URL; Attempt {}: FAILED: {}",
                        attempt,
                        error
                    );

                    let delay = self.retry_delay(attempt);

                    attempt += 1;

                    if (start_time.elapsed().saturating_add(delay) < max_elapsed_time)
                        && (attempt < self.retry_count)
                    {
                        thread::sleep(delay);
                        continue;
                    } else {
                        break Err(error);
                    }
                }
            }
        }
    }

    /// Age of the cache file; `None` when its modified time is unreadable or in the future.
    fn cache_age(&self) -> Option<time::Duration> {
        let modified = fs::metadata(&self.cache_file)
            .and_then(|metadata| metadata.modified())
            .inspect_err(|error| warn!("Unable to read cache file modified time: {}", error))
            .ok()?;

        modified
            .elapsed()
            .inspect_err(|error| {
                warn!(
                    "Cache file modified time is {:?} in the future; treating cache as stale",
                    error.duration()
                )
            })
            .ok()
    }

    /// Delay before the retry following `attempt`; saturates instead of overflowing.
    fn retry_delay(&self, attempt: u32) -> time::Duration {
        time::Duration::from_millis(
            self.retry_backoff_factor
                .saturating_pow(attempt)
                .saturating_mul(self.retry_initial_delay),
        )
    }

    /// Write the GitHub meta JSON to the cache file.
    fn cache_json_to_file(&self, json: &str) -> Result<()> {
        // Ensure parent directories exist
        if let Some(parent) = self.cache_file.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.cache_file, json)
            .inspect(|_| {
                info!(
                    "Successfully cached GitHub IP ranges to: {:?}",
                    &self.cache_file
                )
            })
            .map_err(Error::from)
            .inspect_err(|error| {
                log::error!(
                    "Failed to cache GitHub IP ranges to `{:?}`: {}",
                    &self.cache_file,
                    error
                )
            })
    }

    /// Get the GitHub meta JSON from the cache file.
    fn get_json_from_file(&self) -> Result<String> {
        fs::read_to_string(&self.cache_file)
            .map_err(Error::from)
            .and_then(validate_json)
            .inspect(|_| {
                info!(
                    "Successfully read GitHub meta JSON from: {:?}",
                    &self.cache_file
                )
            })
            .inspect_err(|error| {
                log::error!(
                    "Failed to read GitHub meta JSON from `{:?}`: {}",
                    &self.cache_file,
                    error
                )
            })
    }
}

/*-------------------------------------------------------------------------------------------------
  Helper Functions
-------------------------------------------------------------------------------------------------*/

/// Get and parse an environment variable value or return a default value.
fn get_env_var<T: std::str::FromStr>(env_var: &str, default: T) -> T {
    env::var(env_var)
        .ok()
        .and_then(|value| {
            value
                .parse::<T>()
                .inspect(|_| info!("Using {}: {}", env_var, value))
                .inspect_err(|_| warn!("Invalid {}: {}", env_var, value))
                .ok()
        })
        .unwrap_or(default)
}

/// Validate a string contains parsable JSON.
fn validate_json(json: String) -> Result<String> {
    serde_json::from_str::<serde::de::IgnoredAny>(&json)
        .and(Ok(json))
        .or(Err("Invalid JSON".into()))
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
