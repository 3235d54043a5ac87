use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    pub fmp_base_url: String,
    pub fmp_api_key: String,
    pub finnhub_base_url: String,
    pub finnhub_api_key: String,
    /// Upstream request timeout in seconds.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.port", 4000)?
            .set_default("market.fmp_base_url", "https://financialmodelingprep.com/stable")?
            .set_default("market.fmp_api_key", "demo")?
            .set_default("market.finnhub_base_url", "https://finnhub.io/api/v1")?
            .set_default("market.finnhub_api_key", "demo")?
            .set_default("market.request_timeout_secs", 10)?
            .set_default("cache.ttl_secs", 60)?
            .set_default("rate_limit.max_requests", 120)?
            .set_default("rate_limit.window_secs", 3600)?
            // PORTFOLIAI__MARKET__FMP_API_KEY etc. override the defaults.
            .add_source(Environment::with_prefix("PORTFOLIAI").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
