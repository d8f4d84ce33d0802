//! Dashboard configuration: parsing, validation, and loading.
//!
//! The configuration is a TOML document; every section and field is optional
//! and falls back to the defaults below, so an empty file is a valid config.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 8501
//!
//! [series]
//! growth = "1.000918"
//! value = "1.000919"
//! period = "daily"
//! adjustment = "forward"
//! start = "20240101"
//! end = "20991231"
//!
//! [fetch]
//! max_attempts = 3
//! backoff_ms = 1000
//! backoff_mode = "fixed"
//!
//! [[fetch.endpoints]]
//! url = "https://push2his.eastmoney.com/api/qt/stock/kline/get"
//! timeout_ms = 5000
//!
//! [cache]
//! ttl_secs = 600
//! ```
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]
//! - Apply `COMPASS_*` environment overrides: [`CompassConfig::apply_env`]

use std::{ops::RangeInclusive, time::Duration};

use anyhow::{Context, bail};
use index_ingestor::{
    models::{
        index_id::IndexId,
        request_params::{Adjustment, DateRange, Period, SeriesRequest},
    },
    providers::{
        eastmoney::{KLINE_URL, KLINE_URL_PLAIN},
        fallback::{BackoffMode, Endpoint, FetchPolicy, RequestIdentity, RetryPolicy},
    },
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shared_utils::env::env_parse;

use crate::present::PageOptions;

/// Allowed cache lifetimes, in seconds.
pub const CACHE_TTL_RANGE: RangeInclusive<u64> = 300..=600;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct CompassConfig {
    pub server: ServerCfg,
    pub series: SeriesCfg,
    pub fetch: FetchCfg,
    pub cache: CacheCfg,
    pub page: PageCfg,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerCfg {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8501,
        }
    }
}

/// The two indices whose ratio is tracked.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SeriesCfg {
    /// Numerator, e.g. CSI 300 Growth.
    pub growth: String,
    /// Denominator, e.g. CSI 300 Value.
    pub value: String,
    pub period: Period,
    pub adjustment: Adjustment,
    /// `YYYYMMDD`.
    pub start: String,
    /// `YYYYMMDD`; far future means "through latest".
    pub end: String,
}

impl Default for SeriesCfg {
    fn default() -> Self {
        let range = DateRange::default();
        Self {
            growth: "1.000918".to_string(),
            value: "1.000919".to_string(),
            period: Period::Daily,
            adjustment: Adjustment::Forward,
            start: range.start_token(),
            end: range.end_token(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointCfg {
    pub url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct FetchCfg {
    /// Tried in order.
    pub endpoints: Vec<EndpointCfg>,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub backoff_mode: BackoffMode,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub headers: IndexMap<String, String>,
}

impl Default for FetchCfg {
    fn default() -> Self {
        Self {
            endpoints: vec![
                EndpointCfg {
                    url: KLINE_URL.to_string(),
                    timeout_ms: 5_000,
                },
                EndpointCfg {
                    url: KLINE_URL_PLAIN.to_string(),
                    timeout_ms: 10_000,
                },
            ],
            max_attempts: 3,
            backoff_ms: 1_000,
            backoff_mode: BackoffMode::Fixed,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                    .to_string(),
            ),
            referer: Some("https://quote.eastmoney.com/".to_string()),
            headers: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheCfg {
    pub ttl_secs: u64,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PageCfg {
    pub title: String,
    pub subject: String,
}

impl Default for PageCfg {
    fn default() -> Self {
        let options = PageOptions::default();
        Self {
            title: options.title,
            subject: options.subject,
        }
    }
}

impl CompassConfig {
    /// Checks everything that serde can't.
    ///
    /// Errors:
    /// - No endpoints, an empty URL, or a zero timeout
    /// - `max_attempts` of zero
    /// - `cache.ttl_secs` outside [`CACHE_TTL_RANGE`]
    /// - Identifiers that don't parse as `<exchange-code>.<symbol>`
    /// - Date tokens that don't parse, or start after end
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fetch.endpoints.is_empty() {
            bail!("fetch.endpoints must list at least one endpoint");
        }
        for ep in &self.fetch.endpoints {
            if ep.url.trim().is_empty() {
                bail!("fetch.endpoints.url cannot be empty");
            }
            if ep.timeout_ms == 0 {
                bail!("fetch.endpoints.timeout_ms must be > 0 (url {})", ep.url);
            }
        }
        if self.fetch.max_attempts == 0 {
            bail!("fetch.max_attempts must be >= 1");
        }
        if !CACHE_TTL_RANGE.contains(&self.cache.ttl_secs) {
            bail!(
                "cache.ttl_secs must be within {}..={}, got {}",
                CACHE_TTL_RANGE.start(),
                CACHE_TTL_RANGE.end(),
                self.cache.ttl_secs
            );
        }
        self.growth_request()?;
        self.value_request()?;
        Ok(())
    }

    fn request(&self, id: &str, field: &str) -> anyhow::Result<SeriesRequest> {
        let index: IndexId = id
            .parse()
            .with_context(|| format!("series.{field} is not a valid index id"))?;
        let range = DateRange::from_tokens(&self.series.start, &self.series.end)
            .context("series.start/series.end are not a valid date range")?;
        Ok(SeriesRequest {
            index,
            period: self.series.period,
            adjustment: self.series.adjustment,
            range,
        })
    }

    pub fn growth_request(&self) -> anyhow::Result<SeriesRequest> {
        self.request(&self.series.growth, "growth")
    }

    pub fn value_request(&self) -> anyhow::Result<SeriesRequest> {
        self.request(&self.series.value, "value")
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            endpoints: self
                .fetch
                .endpoints
                .iter()
                .map(|ep| Endpoint::new(ep.url.trim(), Duration::from_millis(ep.timeout_ms)))
                .collect(),
            retry: RetryPolicy {
                max_attempts: self.fetch.max_attempts,
                backoff: Duration::from_millis(self.fetch.backoff_ms),
                mode: self.fetch.backoff_mode,
            },
            identity: RequestIdentity {
                user_agent: self.fetch.user_agent.clone(),
                referer: self.fetch.referer.clone(),
                extra_headers: self.fetch.headers.clone(),
            },
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            title: self.page.title.clone(),
            subject: self.page.subject.clone(),
        }
    }

    /// Overrides server and cache settings from `COMPASS_BIND`,
    /// `COMPASS_PORT` and `COMPASS_CACHE_TTL_SECS` when set.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(bind) = env_parse::<String>("COMPASS_BIND")? {
            self.server.bind = bind;
        }
        if let Some(port) = env_parse::<u16>("COMPASS_PORT")? {
            self.server.port = port;
        }
        if let Some(ttl) = env_parse::<u64>("COMPASS_CACHE_TTL_SECS")? {
            self.cache.ttl_secs = ttl;
        }
        Ok(())
    }
}

/// Parse and validate a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<CompassConfig> {
    let cfg: CompassConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

/// Read a configuration file from disk, parse, and validate it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<CompassConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn empty_document_is_the_default_config() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg, CompassConfig::default());
        assert_eq!(cfg.growth_request().unwrap().index.to_string(), "1.000918");
        assert_eq!(cfg.value_request().unwrap().index.to_string(), "1.000919");
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(600));

        let policy = cfg.fetch_policy();
        assert_eq!(policy.endpoints.len(), 2);
        assert!(policy.endpoints[0].url.starts_with("https://"));
        assert!(policy.endpoints[0].timeout < policy.endpoints[1].timeout);
        assert_eq!(policy.retry.max_attempts, 3);
    }

    #[test]
    fn parses_a_full_document() {
        let cfg = load_config_str(
            r#"
            [server]
            port = 9000

            [series]
            growth = "1.000918"
            value = "1.000919"
            period = "weekly"
            adjustment = "none"
            start = "20240301"

            [fetch]
            max_attempts = 2
            backoff_ms = 250
            backoff_mode = "linear"
            user_agent = "compass"

            [fetch.headers]
            Accept-Language = "zh-CN"

            [[fetch.endpoints]]
            url = "https://mirror.example/kline"
            timeout_ms = 3000

            [cache]
            ttl_secs = 300

            [page]
            title = "Compass"
            subject = "601088"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        let req = cfg.growth_request().unwrap();
        assert_eq!(req.period, Period::Weekly);
        assert_eq!(req.adjustment, Adjustment::None);
        assert_eq!(req.range.start_token(), "20240301");
        assert_eq!(req.range.end_token(), "20991231");

        let policy = cfg.fetch_policy();
        assert_eq!(
            policy.endpoints,
            vec![Endpoint::new("https://mirror.example/kline", Duration::from_secs(3))]
        );
        assert_eq!(policy.retry.mode, BackoffMode::Linear);
        assert_eq!(policy.identity.user_agent.as_deref(), Some("compass"));
        assert_eq!(policy.identity.extra_headers["Accept-Language"], "zh-CN");
        assert_eq!(cfg.page_options().subject, "601088");
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = load_config_str("[cache]\nttl = 600\n").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
    }

    #[test]
    fn rejects_invalid_values() {
        for (doc, needle) in [
            ("[cache]\nttl_secs = 60\n", "ttl_secs"),
            ("[fetch]\nendpoints = []\n", "at least one endpoint"),
            ("[fetch]\nmax_attempts = 0\n", "max_attempts"),
            (
                "[[fetch.endpoints]]\nurl = \"http://x\"\ntimeout_ms = 0\n",
                "timeout_ms",
            ),
            ("[series]\ngrowth = \"000918\"\n", "series.growth"),
            ("[series]\nstart = \"20250101\"\nend = \"20240101\"\n", "date range"),
        ] {
            let err = load_config_str(doc).unwrap_err();
            let msg = format!("{err:#}");
            assert!(msg.contains(needle), "{doc:?} -> {msg}");
        }
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[server]\nport = 8080\n").unwrap();
        let cfg = load_config_path(file.path()).unwrap();
        assert_eq!(cfg.server.port, 8080);

        let err = load_config_path("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("read config file"));
    }

    // SAFETY (for the env mutations below): env tests are serialized.
    #[test]
    #[serial]
    fn env_overrides_server_and_cache() {
        unsafe {
            std::env::set_var("COMPASS_PORT", "9100");
            std::env::set_var("COMPASS_CACHE_TTL_SECS", "300");
            std::env::remove_var("COMPASS_BIND");
        }
        let mut cfg = CompassConfig::default();
        cfg.apply_env().unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.cache.ttl_secs, 300);

        unsafe { std::env::set_var("COMPASS_PORT", "not-a-port") };
        assert!(cfg.apply_env().is_err());

        unsafe {
            std::env::remove_var("COMPASS_PORT");
            std::env::remove_var("COMPASS_CACHE_TTL_SECS");
        }
    }
}
