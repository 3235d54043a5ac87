use crate::cache::{Cache, CacheStatus};
use crate::config::MarketConfig;
use crate::error::{AppError, Result};
use crate::models::{CompanyNewsArticle, CompanyNewsResponse, ProfileResponse, QuoteResponse};
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Thin normalizing proxy over the market-data upstreams: FMP for quotes and
/// profiles, Finnhub for company news. Responses are cached for the
/// configured TTL and the hit/miss outcome is surfaced for the `X-Cache`
/// header.
pub struct MarketDataService {
    client: Client,
    cache: Arc<Cache>,
    config: MarketConfig,
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= 10
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(AppError::Validation(format!(
            "Invalid symbol: {}",
            symbol
        )));
    }
    Ok(symbol)
}

fn parse_quote(data: &Value, symbol: &str) -> Result<QuoteResponse> {
    let quote = data
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| AppError::NotFound(format!("No quote data found for {}", symbol)))?;

    Ok(QuoteResponse {
        symbol: quote
            .get("symbol")
            .and_then(|v| v.as_str())
            .unwrap_or(symbol)
            .to_string(),
        price: quote.get("price").and_then(|v| v.as_f64()).unwrap_or(0.0),
        change: quote.get("change").and_then(|v| v.as_f64()).unwrap_or(0.0),
        volume: quote.get("volume").and_then(|v| v.as_u64()).unwrap_or(0),
        timestamp: Utc::now().timestamp_millis(),
    })
}

fn parse_profile(data: &Value, symbol: &str) -> Result<ProfileResponse> {
    let profile = data
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| AppError::NotFound(format!("No profile data found for {}", symbol)))?;

    let text = |field: &str| -> String {
        profile
            .get(field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let number = |field: &str| -> f64 { profile.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0) };

    Ok(ProfileResponse {
        company_name: text("companyName"),
        symbol: profile
            .get("symbol")
            .and_then(|v| v.as_str())
            .unwrap_or(symbol)
            .to_string(),
        image: text("image"),
        exchange_full_name: text("exchangeFullName"),
        industry: text("industry"),
        sector: text("sector"),
        ceo: text("ceo"),
        price: number("price"),
        change_percentage: number("changePercentage"),
        market_cap: number("marketCap"),
        description: text("description"),
        website: text("website"),
    })
}

fn parse_news(data: &Value, symbol: &str, from: &str, to: &str) -> Result<CompanyNewsResponse> {
    let items = data
        .as_array()
        .ok_or_else(|| AppError::ExternalService("Unexpected news payload shape".to_string()))?;

    let mut articles: Vec<CompanyNewsArticle> = items
        .iter()
        .filter_map(|item| {
            let headline = item.get("headline")?.as_str()?.to_string();
            let url = item.get("url")?.as_str()?.to_string();
            Some(CompanyNewsArticle {
                headline,
                url,
                source: item
                    .get("source")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                datetime: item.get("datetime").and_then(|v| v.as_i64()).unwrap_or(0),
                summary: item
                    .get("summary")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                related: item
                    .get("related")
                    .and_then(|v| v.as_str())
                    .unwrap_or(symbol)
                    .to_string(),
            })
        })
        .collect();

    articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));

    Ok(CompanyNewsResponse {
        total_count: articles.len(),
        articles,
        symbol: symbol.to_string(),
        from_date: from.to_string(),
        to_date: to.to_string(),
    })
}

impl MarketDataService {
    pub fn new(cache: Arc<Cache>, config: MarketConfig) -> Self {
        Self {
            client: Client::new(),
            cache,
            config,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    async fn fetch_json(&self, url: &str, upstream: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("{} request failed: {}", upstream, e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "{} returned status {}",
                upstream,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("{} JSON parse error: {}", upstream, e)))
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<(QuoteResponse, CacheStatus)> {
        let symbol = normalize_symbol(symbol)?;
        let cache_key = format!("quote_{}", symbol);

        if let Some(cached) = self.cache.get::<QuoteResponse>(&cache_key).await? {
            return Ok((cached, CacheStatus::Hit));
        }

        let url = format!(
            "{}/quote?symbol={}&apikey={}",
            self.config.fmp_base_url, symbol, self.config.fmp_api_key
        );
        let data = self.fetch_json(&url, "FMP").await?;
        let quote = parse_quote(&data, &symbol)?;

        self.cache.set(&cache_key, &quote, None).await?;
        tracing::debug!(%symbol, "quote fetched from upstream");
        Ok((quote, CacheStatus::Miss))
    }

    pub async fn get_profile(&self, symbol: &str) -> Result<(ProfileResponse, CacheStatus)> {
        let symbol = normalize_symbol(symbol)?;
        let cache_key = format!("profile_{}", symbol);

        if let Some(cached) = self.cache.get::<ProfileResponse>(&cache_key).await? {
            return Ok((cached, CacheStatus::Hit));
        }

        let url = format!(
            "{}/profile?symbol={}&apikey={}",
            self.config.fmp_base_url, symbol, self.config.fmp_api_key
        );
        let data = self.fetch_json(&url, "FMP").await?;
        let profile = parse_profile(&data, &symbol)?;

        self.cache.set(&cache_key, &profile, None).await?;
        tracing::debug!(%symbol, "profile fetched from upstream");
        Ok((profile, CacheStatus::Miss))
    }

    /// Company news over `[from, to]` (YYYY-MM-DD), defaulting to the last
    /// seven days, sorted newest first.
    pub async fn get_company_news(
        &self,
        symbol: &str,
        from: Option<String>,
        to: Option<String>,
    ) -> Result<(CompanyNewsResponse, CacheStatus)> {
        let symbol = normalize_symbol(symbol)?;
        let to = to.unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
        let from = from.unwrap_or_else(|| {
            (Utc::now() - ChronoDuration::days(7))
                .format("%Y-%m-%d")
                .to_string()
        });
        let cache_key = format!("news_{}_{}_{}", symbol, from, to);

        if let Some(cached) = self.cache.get::<CompanyNewsResponse>(&cache_key).await? {
            return Ok((cached, CacheStatus::Hit));
        }

        let url = format!(
            "{}/company-news?symbol={}&from={}&to={}&token={}",
            self.config.finnhub_base_url, symbol, from, to, self.config.finnhub_api_key
        );
        let data = self.fetch_json(&url, "Finnhub").await?;
        let news = parse_news(&data, &symbol, &from, &to)?;

        self.cache.set(&cache_key, &news, None).await?;
        tracing::debug!(%symbol, %from, %to, "company news fetched from upstream");
        Ok((news, CacheStatus::Miss))
    }
}
