use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Chat types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A message body is either plain text or one of the structured card
/// payloads. Modelling it as a tagged enum makes a kind/payload mismatch
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum MessageBody {
    Text(String),
    CompanyCard(Company),
    ComparisonCard(ComparisonData),
    MarketMoversCard(MarketMoversData),
    FinancialHealthCard(FinancialHealthData),
    NewsCard(NewsData),
}

impl MessageBody {
    pub fn text(content: impl Into<String>) -> Self {
        MessageBody::Text(content.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    #[serde(flatten)]
    pub body: MessageBody,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            body,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            body,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadKind {
    Chat,
    Idea,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub title: String,
    pub kind: ThreadKind,
    /// Once locked, `kind` is immutable for the rest of the session.
    pub thread_kind_locked: bool,
    /// The idea-promotion banner is offered at most once per session.
    pub idea_prompt_shown: bool,
    /// Set while an idea prompt awaits a choice; names the message that
    /// triggered it. Cleared on resolution, so a choice cannot be replayed.
    pub pending_idea_trigger: Option<Uuid>,
    pub messages: Vec<Message>,
    pub pending_trade: Option<PendingTrade>,
    /// Bumped on every handled command; a reply composed against an earlier
    /// revision is discarded instead of being committed.
    pub revision: u64,
    pub last_activity: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(kind: ThreadKind, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            // Idea threads are locked from the moment they are created.
            thread_kind_locked: kind == ThreadKind::Idea,
            idea_prompt_shown: false,
            pending_idea_trigger: None,
            messages: Vec::new(),
            pending_trade: None,
            revision: 0,
            last_activity: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub kind: ThreadKind,
    pub message_count: usize,
    pub last_activity: DateTime<Utc>,
}

impl From<&ChatSession> for SessionSummary {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id,
            title: session.title.clone(),
            kind: session.kind,
            message_count: session.messages.len(),
            last_activity: session.last_activity,
        }
    }
}

// Trading types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTrade {
    pub action: TradeAction,
    pub ticker: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_cost: Decimal,
}

// Card payloads

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockData {
    pub current_price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub market_cap: Decimal,
    pub pe_ratio: Decimal,
    pub dividend_yield: Decimal,
    pub volume: u64,
    pub avg_volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationMetrics {
    pub pe: String,
    pub ps: String,
    pub industry_pe: String,
    pub industry_ps: String,
    pub margin_of_safety: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub ticker: String,
    pub name: String,
    pub snapshot: String,
    pub moat: String,
    pub risks: Vec<String>,
    pub valuation_metrics: ValuationMetrics,
    pub fit: String,
    pub stock_data: StockData,
    pub industry: String,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSegment {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyComparison {
    pub ticker: String,
    pub name: String,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub investor_fit: String,
    pub revenue_data: Vec<RevenueSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRow {
    pub metric: String,
    pub value_a: Decimal,
    pub value_b: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonData {
    pub company_a: CompanyComparison,
    pub company_b: CompanyComparison,
    pub valuation_data: Vec<ValuationRow>,
    pub verdict: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMover {
    pub ticker: String,
    pub name: String,
    pub current_price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: u64,
    pub avg_volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMoversData {
    pub gainers: Vec<MarketMover>,
    pub losers: Vec<MarketMover>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetric {
    pub name: String,
    pub value: Decimal,
    pub unit: String,
    pub benchmark: Decimal,
    pub is_higher_better: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialHealthData {
    pub ticker: String,
    pub name: String,
    pub metrics: Vec<FinancialMetric>,
    pub overall_score: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsSentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub sentiment: NewsSentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsData {
    pub ticker: String,
    pub name: String,
    pub news: Vec<NewsItem>,
    pub last_updated: DateTime<Utc>,
}

// Portfolio types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub name: String,
    pub shares: Decimal,
    pub avg_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub text: String,
    pub ticker: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

// Proxy types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub volume: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub company_name: String,
    pub symbol: String,
    pub image: String,
    pub exchange_full_name: String,
    pub industry: String,
    pub sector: String,
    pub ceo: String,
    pub price: f64,
    pub change_percentage: f64,
    pub market_cap: f64,
    pub description: String,
    pub website: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyNewsArticle {
    pub headline: String,
    pub source: String,
    pub datetime: i64,
    pub summary: String,
    pub related: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyNewsResponse {
    pub articles: Vec<CompanyNewsArticle>,
    pub total_count: usize,
    pub symbol: String,
    pub from_date: String,
    pub to_date: String,
}

// Chat API request/response types

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub kind: Option<ThreadKind>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaChoice {
    ContinueChat,
    StartIdea,
}

#[derive(Debug, Deserialize)]
pub struct IdeaChoiceRequest {
    pub choice: IdeaChoice,
}

/// What one handled user message produced: the replies appended to the
/// transcript, or an idea-prompt marker when response generation was
/// suspended for the turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub session_id: Uuid,
    pub messages: Vec<Message>,
    pub idea_prompt: bool,
    pub pending_trade: Option<PendingTrade>,
}
