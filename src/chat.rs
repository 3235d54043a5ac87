use crate::composer;
use crate::error::{AppError, Result};
use crate::intent;
use crate::models::{
    ChatSession, ChatTurn, IdeaChoice, Message, MessageBody, PendingTrade, SessionSummary,
    ThreadKind, TradeAction,
};
use crate::portfolio::PortfolioService;
use crate::providers::MarketProvider;
use crate::ticker;
use crate::trade;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

static SINGLE_STOCK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^analyze\s+([a-z]{1,5})$",
        r"^([a-z]{1,5})\s+analysis$",
        r"^show\s+me\s+([a-z]{1,5})$",
        r"^tell\s+me\s+about\s+([a-z]{1,5})$",
        r"^what\s+about\s+([a-z]{1,5})$",
        r"^([a-z]{1,5})\s+stock$",
        r"^([a-z]{1,5})\s+investment$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("idea pattern must compile"))
    .collect()
});

static COMPARISON_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"compare\s+\w+\s+(?:and|vs|versus|or)\s+\w+",
        r"\w+\s+(?:vs|versus)\s+\w+",
        r"\w+\s+or\s+\w+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("idea pattern must compile"))
    .collect()
});

/// Does this message look like the start of focused research rather than a
/// one-off question? Single-stock analysis phrasings, comparisons, and bare
/// ticker mentions qualify, but only when a known ticker actually resolves.
fn is_idea_candidate(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();

    if SINGLE_STOCK_PATTERNS.iter().any(|p| p.is_match(&lowered))
        && !ticker::extract_all(text).is_empty()
    {
        return true;
    }

    if COMPARISON_PATTERNS.iter().any(|p| p.is_match(&lowered))
        && ticker::extract_all(text).len() >= 2
    {
        return true;
    }

    for symbol in ticker::KNOWN_SYMBOLS {
        let lower_symbol = symbol.to_lowercase();
        if lowered == lower_symbol
            || lowered == format!("${}", lower_symbol)
            || lowered.starts_with(&format!("{} ", lower_symbol))
            || lowered.ends_with(&format!(" {}", lower_symbol))
        {
            return true;
        }
    }

    false
}

/// Title for a promoted idea session, derived from the triggering message.
fn idea_title(text: &str) -> String {
    let tickers = ticker::extract_all(text);
    match tickers.as_slice() {
        [a, b, ..] => format!("{} vs {}", a, b),
        [a] => format!("{} Analysis", a),
        [] => {
            let trimmed = text.trim();
            if trimmed.chars().count() > 40 {
                let cut: String = trimmed.chars().take(40).collect();
                format!("{}…", cut.trim_end())
            } else {
                trimmed.to_string()
            }
        }
    }
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// How a committed reply changes the session's pending trade.
enum TradeEffect {
    None,
    Propose(PendingTrade),
    Execute(PendingTrade),
    Cancel,
}

/// Replies plus their side effect, computed against a snapshot of the
/// session. Nothing here touches shared state; the commit step applies it.
struct ResponsePlan {
    replies: Vec<Message>,
    trade_effect: TradeEffect,
}

fn plan_response(
    pending: Option<&PendingTrade>,
    content: &str,
    provider: &dyn MarketProvider,
) -> ResponsePlan {
    if let Some(pending) = pending {
        if trade::is_affirmative(content) {
            let verb = match pending.action {
                TradeAction::Buy => "Purchased",
                TradeAction::Sell => "Sold",
            };
            return ResponsePlan {
                replies: vec![Message::assistant(MessageBody::text(format!(
                    "Trade confirmed! {} {} {} shares for ${}. Your portfolio and recent \
                     activity have been updated.",
                    verb,
                    pending.quantity,
                    pending.ticker,
                    money(pending.total_cost)
                )))],
                trade_effect: TradeEffect::Execute(pending.clone()),
            };
        }

        if trade::is_negative(content) {
            return ResponsePlan {
                replies: vec![Message::assistant(MessageBody::text(
                    "Trade cancelled. Is there anything else I can help you with?",
                ))],
                trade_effect: TradeEffect::Cancel,
            };
        }

        // A second order never displaces the one awaiting confirmation.
        if trade::parse(content).is_some() {
            return ResponsePlan {
                replies: vec![Message::assistant(MessageBody::text(format!(
                    "You already have a trade awaiting confirmation: {} {} {} shares for ${}. \
                     Reply 'yes' to confirm or 'no' to cancel it before placing another order.",
                    match pending.action {
                        TradeAction::Buy => "buy",
                        TradeAction::Sell => "sell",
                    },
                    pending.quantity,
                    pending.ticker,
                    money(pending.total_cost)
                )))],
                trade_effect: TradeEffect::None,
            };
        }
    } else if let Some(proposal) = trade::parse(content) {
        let text = confirmation_request(&proposal);
        return ResponsePlan {
            replies: vec![Message::assistant(MessageBody::text(text))],
            trade_effect: TradeEffect::Propose(proposal),
        };
    }

    let intent = intent::classify(content);
    let tickers = ticker::extract_all(content);
    let body = composer::compose(provider, intent, &tickers, content);
    ResponsePlan {
        replies: vec![Message::assistant(body)],
        trade_effect: TradeEffect::None,
    }
}

fn confirmation_request(proposal: &PendingTrade) -> String {
    let verb = match proposal.action {
        TradeAction::Buy => "Purchasing",
        TradeAction::Sell => "Selling",
    };
    format!(
        "Trade confirmation required: {} {} {} shares at ${} per share. Total: ${} (demo \
         prices, simulation only). Reply 'yes' to confirm or 'no' to cancel.",
        verb,
        proposal.quantity,
        proposal.ticker,
        money(proposal.unit_price),
        money(proposal.total_cost)
    )
}

/// State captured when a user message is appended: the revision that commit
/// must still see, and the snapshot the reply is composed against.
struct TurnStart {
    generation: u64,
    user_message: Message,
    pending_trade: Option<PendingTrade>,
    idea_prompt: bool,
}

/// In-memory conversation engine. A turn appends the user message under the
/// store's write lock, composes the reply against that snapshot with the lock
/// released, and commits only if the session's revision is unchanged; a reply
/// composed against an older revision is discarded.
pub struct ChatService {
    sessions: RwLock<HashMap<Uuid, ChatSession>>,
    portfolio: Arc<PortfolioService>,
    provider: Arc<dyn MarketProvider>,
}

impl ChatService {
    pub fn new(portfolio: Arc<PortfolioService>, provider: Arc<dyn MarketProvider>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            portfolio,
            provider,
        }
    }

    pub async fn create_session(
        &self,
        kind: Option<ThreadKind>,
        title: Option<String>,
    ) -> SessionSummary {
        let kind = kind.unwrap_or(ThreadKind::Chat);
        let title = title.unwrap_or_else(|| {
            match kind {
                ThreadKind::Chat => "New chat",
                ThreadKind::Idea => "New idea",
            }
            .to_string()
        });

        let session = ChatSession::new(kind, title);
        let summary = SessionSummary::from(&session);

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, session);
        summary
    }

    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> =
            sessions.values().map(SessionSummary::from).collect();
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }

    pub async fn session_messages(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&session_id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;
        Ok(session.messages.clone())
    }

    /// Handles one user message end to end: append it, maybe offer idea
    /// promotion, otherwise compose a reply and commit it.
    pub async fn handle_message(&self, session_id: Uuid, content: &str) -> Result<ChatTurn> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Message content must not be empty".to_string(),
            ));
        }

        let start = self.begin_turn(session_id, content).await?;

        if start.idea_prompt {
            return Ok(ChatTurn {
                session_id,
                messages: vec![start.user_message],
                idea_prompt: true,
                pending_trade: start.pending_trade,
            });
        }

        let plan = plan_response(start.pending_trade.as_ref(), content, self.provider.as_ref());
        self.commit_turn(session_id, start.generation, start.user_message, plan)
            .await
    }

    /// Appends the user message, runs the promotion heuristic, and captures
    /// the revision the eventual commit must match.
    async fn begin_turn(&self, session_id: Uuid, content: &str) -> Result<TurnStart> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

        session.revision += 1;
        session.last_activity = Utc::now();

        let user_message = Message::user(MessageBody::text(content));
        session.messages.push(user_message.clone());

        // Promotion heuristic runs before any reply, at most once per session.
        let idea_prompt = session.kind == ThreadKind::Chat
            && !session.thread_kind_locked
            && !session.idea_prompt_shown
            && is_idea_candidate(content);
        if idea_prompt {
            session.idea_prompt_shown = true;
            session.pending_idea_trigger = Some(user_message.id);
            tracing::info!(session = %session_id, "idea prompt offered, reply suspended");
        }

        Ok(TurnStart {
            generation: session.revision,
            user_message,
            pending_trade: session.pending_trade.clone(),
            idea_prompt,
        })
    }

    /// Applies a composed reply if the session revision is still the one the
    /// plan was computed against; otherwise the reply is dropped.
    async fn commit_turn(
        &self,
        session_id: Uuid,
        generation: u64,
        user_message: Message,
        plan: ResponsePlan,
    ) -> Result<ChatTurn> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

        if session.revision != generation {
            tracing::warn!(
                session = %session_id,
                expected = generation,
                found = session.revision,
                "discarding reply composed against a stale session revision"
            );
            return Ok(ChatTurn {
                session_id,
                messages: vec![user_message],
                idea_prompt: false,
                pending_trade: session.pending_trade.clone(),
            });
        }

        let replies = self.apply_plan(session, plan).await;
        session.last_activity = Utc::now();

        let mut messages = vec![user_message];
        messages.extend(replies);
        Ok(ChatTurn {
            session_id,
            messages,
            idea_prompt: false,
            pending_trade: session.pending_trade.clone(),
        })
    }

    async fn apply_plan(&self, session: &mut ChatSession, plan: ResponsePlan) -> Vec<Message> {
        match plan.trade_effect {
            TradeEffect::Execute(executed) => {
                self.portfolio.apply_trade(&executed).await;
                session.pending_trade = None;
            }
            TradeEffect::Propose(proposal) => session.pending_trade = Some(proposal),
            TradeEffect::Cancel => session.pending_trade = None,
            TradeEffect::None => {}
        }
        session.messages.extend(plan.replies.iter().cloned());
        plan.replies
    }

    /// Resolves a pending idea prompt against the message that triggered it,
    /// regardless of what arrived since. A session with no pending prompt
    /// rejects the choice, so a resolution cannot be replayed.
    pub async fn handle_idea_choice(
        &self,
        session_id: Uuid,
        choice: IdeaChoice,
    ) -> Result<ChatTurn> {
        let mut sessions = self.sessions.write().await;

        let trigger = {
            let session = sessions
                .get(&session_id)
                .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;
            let trigger_id = session.pending_idea_trigger.ok_or_else(|| {
                AppError::Validation(
                    "No idea prompt awaiting a choice in this session".to_string(),
                )
            })?;
            session
                .messages
                .iter()
                .find(|m| m.id == trigger_id)
                .and_then(|m| match &m.body {
                    MessageBody::Text(text) => Some(text.clone()),
                    _ => None,
                })
                .ok_or_else(|| {
                    AppError::Internal("Idea trigger message missing from transcript".to_string())
                })?
        };

        match choice {
            IdeaChoice::ContinueChat => {
                let session = sessions
                    .get_mut(&session_id)
                    .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;
                session.revision += 1;
                session.pending_idea_trigger = None;
                session.thread_kind_locked = true;
                session.last_activity = Utc::now();

                let plan =
                    plan_response(session.pending_trade.as_ref(), &trigger, self.provider.as_ref());
                let replies = self.apply_plan(session, plan).await;

                Ok(ChatTurn {
                    session_id,
                    messages: replies,
                    idea_prompt: false,
                    pending_trade: session.pending_trade.clone(),
                })
            }
            IdeaChoice::StartIdea => {
                if let Some(session) = sessions.get_mut(&session_id) {
                    session.revision += 1;
                    session.pending_idea_trigger = None;
                    session.last_activity = Utc::now();
                }

                let mut idea = ChatSession::new(ThreadKind::Idea, idea_title(&trigger));
                idea.revision = 1;

                let user_message = Message::user(MessageBody::text(trigger.clone()));
                idea.messages.push(user_message.clone());

                let plan = plan_response(None, &trigger, self.provider.as_ref());
                let replies = self.apply_plan(&mut idea, plan).await;

                let new_id = idea.id;
                let pending_trade = idea.pending_trade.clone();
                sessions.insert(new_id, idea);
                tracing::info!(from = %session_id, to = %new_id, "chat promoted to idea session");

                let mut messages = vec![user_message];
                messages.extend(replies);
                Ok(ChatTurn {
                    session_id: new_id,
                    messages,
                    idea_prompt: false,
                    pending_trade,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::providers::DemoMarketProvider;
    use rust_decimal_macros::dec;

    fn service() -> ChatService {
        ChatService::new(
            Arc::new(PortfolioService::new()),
            Arc::new(DemoMarketProvider),
        )
    }

    async fn chat_session(service: &ChatService) -> Uuid {
        service.create_session(Some(ThreadKind::Chat), None).await.id
    }

    #[tokio::test]
    async fn price_question_appends_company_card_reply() {
        let service = service();
        let id = chat_session(&service).await;

        let turn = service
            .handle_message(id, "What's the price of AAPL?")
            .await
            .unwrap();

        assert!(!turn.idea_prompt);
        assert_eq!(turn.messages.len(), 2);
        assert!(matches!(turn.messages[1].body, MessageBody::CompanyCard(_)));
    }

    #[tokio::test]
    async fn trade_command_sets_pending_and_yes_executes_it() {
        let service = service();
        let id = chat_session(&service).await;

        let turn = service.handle_message(id, "buy 5 AAPL shares").await.unwrap();
        let pending = turn.pending_trade.as_ref().unwrap();
        assert_eq!(pending.action, TradeAction::Buy);
        assert_eq!(pending.ticker, "AAPL");
        assert_eq!(pending.quantity, dec!(5));
        assert_eq!(pending.unit_price, dec!(180));
        assert_eq!(pending.total_cost, dec!(900));

        let turn = service.handle_message(id, "yes").await.unwrap();
        assert!(turn.pending_trade.is_none());
        let holdings = service.portfolio.holdings().await;
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].ticker, "AAPL");
    }

    #[tokio::test]
    async fn unknown_ticker_trade_falls_through_to_clarification() {
        let service = service();
        let id = chat_session(&service).await;

        let turn = service.handle_message(id, "buy 5 ZZZZ shares").await.unwrap();
        assert!(turn.pending_trade.is_none());
        assert!(matches!(turn.messages[1].body, MessageBody::Text(_)));
    }

    #[tokio::test]
    async fn negative_reply_cancels_the_pending_trade() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "sell 2 TSLA shares").await.unwrap();
        let turn = service.handle_message(id, "no").await.unwrap();

        assert!(turn.pending_trade.is_none());
        assert!(service.portfolio.holdings().await.is_empty());
    }

    #[tokio::test]
    async fn new_trade_command_does_not_displace_a_pending_one() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "buy 5 AAPL shares").await.unwrap();
        let turn = service.handle_message(id, "buy 1 MSFT share").await.unwrap();

        let pending = turn.pending_trade.unwrap();
        assert_eq!(pending.ticker, "AAPL");
        assert_eq!(pending.quantity, dec!(5));
    }

    #[tokio::test]
    async fn unrelated_message_leaves_pending_trade_in_place() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "buy 5 AAPL shares").await.unwrap();
        let turn = service
            .handle_message(id, "what's the price of MSFT?")
            .await
            .unwrap();

        assert!(turn.pending_trade.is_some());
        assert!(matches!(turn.messages[1].body, MessageBody::CompanyCard(_)));
    }

    #[tokio::test]
    async fn analysis_message_offers_idea_prompt_and_suspends_reply() {
        let service = service();
        let id = chat_session(&service).await;

        let turn = service.handle_message(id, "Tesla analysis").await.unwrap();

        assert!(turn.idea_prompt);
        // Only the user message lands; no assistant reply this turn.
        assert_eq!(turn.messages.len(), 1);
        assert_eq!(turn.messages[0].role, Role::User);

        let transcript = service.session_messages(id).await.unwrap();
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test]
    async fn idea_prompt_is_offered_at_most_once() {
        let service = service();
        let id = chat_session(&service).await;

        let first = service.handle_message(id, "Tesla analysis").await.unwrap();
        assert!(first.idea_prompt);

        let choice = service
            .handle_idea_choice(id, IdeaChoice::ContinueChat)
            .await
            .unwrap();
        assert!(!choice.idea_prompt);

        let second = service.handle_message(id, "NVDA analysis").await.unwrap();
        assert!(!second.idea_prompt);
        assert_eq!(second.messages.len(), 2);
    }

    #[tokio::test]
    async fn continue_chat_locks_the_session_as_chat() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "Tesla analysis").await.unwrap();
        let turn = service
            .handle_idea_choice(id, IdeaChoice::ContinueChat)
            .await
            .unwrap();

        assert_eq!(turn.session_id, id);
        assert_eq!(turn.messages.len(), 1);
        assert_eq!(turn.messages[0].role, Role::Assistant);

        let summaries = service.list_sessions().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].kind, ThreadKind::Chat);
    }

    #[tokio::test]
    async fn start_idea_creates_a_locked_idea_session_with_a_derived_title() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "Tesla analysis").await.unwrap();
        let turn = service
            .handle_idea_choice(id, IdeaChoice::StartIdea)
            .await
            .unwrap();

        assert_ne!(turn.session_id, id);
        assert_eq!(turn.messages.len(), 2);

        let summaries = service.list_sessions().await;
        let idea = summaries
            .iter()
            .find(|s| s.id == turn.session_id)
            .unwrap();
        assert_eq!(idea.kind, ThreadKind::Idea);
        assert_eq!(idea.title, "TSLA Analysis");
    }

    #[tokio::test]
    async fn idea_choice_resolves_the_triggering_message_even_after_later_messages() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "Tesla analysis").await.unwrap();
        // The banner is ignored and the conversation moves on.
        service
            .handle_message(id, "what is a dividend?")
            .await
            .unwrap();

        let turn = service
            .handle_idea_choice(id, IdeaChoice::StartIdea)
            .await
            .unwrap();

        let summaries = service.list_sessions().await;
        let idea = summaries
            .iter()
            .find(|s| s.id == turn.session_id)
            .unwrap();
        assert_eq!(idea.title, "TSLA Analysis");
        assert_eq!(
            turn.messages[0].body,
            MessageBody::text("Tesla analysis")
        );
    }

    #[tokio::test]
    async fn idea_choice_cannot_be_replayed_after_resolution() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "Tesla analysis").await.unwrap();
        service
            .handle_idea_choice(id, IdeaChoice::StartIdea)
            .await
            .unwrap();

        let err = service
            .handle_idea_choice(id, IdeaChoice::StartIdea)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Exactly one idea session came out of the prompt.
        let summaries = service.list_sessions().await;
        assert_eq!(
            summaries.iter().filter(|s| s.kind == ThreadKind::Idea).count(),
            1
        );
    }

    #[tokio::test]
    async fn idea_choice_without_a_prompt_is_rejected() {
        let service = service();
        let id = chat_session(&service).await;

        let err = service
            .handle_idea_choice(id, IdeaChoice::ContinueChat)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn idea_sessions_never_offer_the_prompt() {
        let service = service();
        let id = service
            .create_session(Some(ThreadKind::Idea), Some("NVDA deep dive".to_string()))
            .await
            .id;

        let turn = service.handle_message(id, "NVDA analysis").await.unwrap();
        assert!(!turn.idea_prompt);
        assert_eq!(turn.messages.len(), 2);
    }

    #[tokio::test]
    async fn transcript_preserves_append_order() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "hello there").await.unwrap();
        service
            .handle_message(id, "what's the price of AAPL?")
            .await
            .unwrap();

        let transcript = service.session_messages(id).await.unwrap();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[2].role, Role::User);
        assert_eq!(transcript[3].role, Role::Assistant);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let service = service();
        let err = service
            .handle_message(Uuid::new_v4(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let service = service();
        let id = chat_session(&service).await;
        let err = service.handle_message(id, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn idea_candidates_cover_analysis_comparison_and_bare_mentions() {
        assert!(is_idea_candidate("Tesla analysis"));
        assert!(is_idea_candidate("analyze NVDA"));
        assert!(is_idea_candidate("compare AAPL and MSFT"));
        assert!(is_idea_candidate("AAPL"));
        assert!(is_idea_candidate("$nvda"));
        assert!(!is_idea_candidate("hello there"));
        // Pattern shape alone is not enough without a resolvable ticker.
        assert!(!is_idea_candidate("ZZZZ analysis"));
    }

    #[test]
    fn idea_titles_derive_from_resolved_tickers() {
        assert_eq!(idea_title("Tesla analysis"), "TSLA Analysis");
        assert_eq!(idea_title("compare AAPL and MSFT"), "AAPL vs MSFT");
        assert_eq!(idea_title("thoughts on the market"), "thoughts on the market");
    }

    #[tokio::test]
    async fn every_command_bumps_the_session_revision() {
        let service = service();
        let id = chat_session(&service).await;

        service.handle_message(id, "hello there").await.unwrap();
        service.handle_message(id, "any news for TSLA?").await.unwrap();

        let sessions = service.sessions.read().await;
        assert_eq!(sessions.get(&id).unwrap().revision, 2);
    }

    #[tokio::test]
    async fn replies_composed_against_a_stale_revision_are_discarded() {
        let service = service();
        let id = chat_session(&service).await;

        let start = service.begin_turn(id, "any news for TSLA?").await.unwrap();
        // Another command lands before the first reply is committed.
        service.handle_message(id, "hello there").await.unwrap();

        let plan = plan_response(
            start.pending_trade.as_ref(),
            "any news for TSLA?",
            service.provider.as_ref(),
        );
        let turn = service
            .commit_turn(id, start.generation, start.user_message, plan)
            .await
            .unwrap();

        // The stale reply is dropped, not appended.
        assert_eq!(turn.messages.len(), 1);
        let transcript = service.session_messages(id).await.unwrap();
        assert_eq!(transcript.len(), 3);
        assert!(!transcript
            .iter()
            .any(|m| matches!(m.body, MessageBody::NewsCard(_))));
    }
}
