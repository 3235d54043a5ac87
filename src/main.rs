mod api;
mod cache;
mod chat;
mod composer;
mod config;
mod error;
mod intent;
mod market;
mod models;
mod portfolio;
mod providers;
mod rate_limit;
mod ticker;
mod trade;

use axum::{
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::handlers,
    cache::Cache,
    chat::ChatService,
    config::AppConfig,
    market::MarketDataService,
    portfolio::PortfolioService,
    providers::DemoMarketProvider,
    rate_limit::RateLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub market: Arc<MarketDataService>,
    pub chat: Arc<ChatService>,
    pub portfolio: Arc<PortfolioService>,
    pub rate_limiter: Arc<RateLimiter>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfoliai_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::new()?);

    let cache = Arc::new(Cache::new(Duration::from_secs(config.cache.ttl_secs)));
    let market = Arc::new(MarketDataService::new(cache.clone(), config.market.clone()));
    let portfolio = Arc::new(PortfolioService::new());
    let chat = Arc::new(ChatService::new(
        portfolio.clone(),
        Arc::new(DemoMarketProvider),
    ));
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
    ));

    let app_state = AppState {
        config: config.clone(),
        market,
        chat,
        portfolio,
        rate_limiter,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let api_routes = Router::new()
        // Market-data proxy
        .route("/api/quote/:symbol", get(handlers::get_quote))
        .route("/api/profile/:symbol", get(handlers::get_profile))
        .route("/api/news/:symbol", get(handlers::get_company_news))
        // Chat sessions
        .route("/api/chat/sessions", post(handlers::create_session))
        .route("/api/chat/sessions", get(handlers::list_sessions))
        .route(
            "/api/chat/sessions/:id/messages",
            get(handlers::get_session_messages),
        )
        .route(
            "/api/chat/sessions/:id/messages",
            post(handlers::send_message),
        )
        .route(
            "/api/chat/sessions/:id/idea-choice",
            post(handlers::idea_choice),
        )
        // Portfolio
        .route("/api/portfolio", get(handlers::get_portfolio))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            rate_limit::enforce,
        ));

    let app = Router::new()
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state);

    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("PortfoliAI backend listening on port {}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
