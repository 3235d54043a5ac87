use crate::{
    error::Result,
    models::{CreateSessionRequest, IdeaChoiceRequest, SendMessageRequest},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

// Market-data proxy

pub async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse> {
    let (quote, cache_status) = state.market.get_quote(&symbol).await?;
    Ok((
        [("x-cache", cache_status.as_header_value())],
        Json(quote),
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse> {
    let (profile, cache_status) = state.market.get_profile(&symbol).await?;
    Ok((
        [("x-cache", cache_status.as_header_value())],
        Json(profile),
    ))
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn get_company_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<NewsQuery>,
) -> Result<impl IntoResponse> {
    let (news, cache_status) = state
        .market
        .get_company_news(&symbol, query.from, query.to)
        .await?;
    Ok((
        [("x-cache", cache_status.as_header_value())],
        Json(news),
    ))
}

// Chat sessions

pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse> {
    let summary = state.chat.create_session(payload.kind, payload.title).await;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn list_sessions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.chat.list_sessions().await))
}

pub async fn get_session_messages(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let messages = state.chat.session_messages(session_id).await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    let turn = state.chat.handle_message(session_id, &payload.content).await?;
    Ok(Json(turn))
}

pub async fn idea_choice(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<IdeaChoiceRequest>,
) -> Result<impl IntoResponse> {
    let turn = state.chat.handle_idea_choice(session_id, payload.choice).await?;
    Ok(Json(turn))
}

// Portfolio

pub async fn get_portfolio(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let holdings = state.portfolio.holdings().await;
    let activity = state.portfolio.recent_activity().await;
    Ok(Json(json!({
        "holdings": holdings,
        "activity": activity,
    })))
}
