use crate::models::{ActivityItem, ActivityKind, Holding, PendingTrade, TradeAction};
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct PortfolioState {
    holdings: Vec<Holding>,
    activity: Vec<ActivityItem>,
}

/// Demo portfolio: receives confirmed trades from the chat pipeline and keeps
/// holdings plus an activity feed, newest first.
pub struct PortfolioService {
    state: RwLock<PortfolioState>,
}

impl PortfolioService {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PortfolioState::default()),
        }
    }

    pub async fn apply_trade(&self, trade: &PendingTrade) {
        let mut state = self.state.write().await;

        match trade.action {
            TradeAction::Buy => {
                if let Some(holding) = state
                    .holdings
                    .iter_mut()
                    .find(|h| h.ticker == trade.ticker)
                {
                    let old_cost = holding.shares * holding.avg_price;
                    holding.shares += trade.quantity;
                    holding.avg_price = (old_cost + trade.total_cost) / holding.shares;
                } else {
                    state.holdings.push(Holding {
                        ticker: trade.ticker.clone(),
                        name: trade.ticker.clone(),
                        shares: trade.quantity,
                        avg_price: trade.unit_price,
                    });
                }
            }
            TradeAction::Sell => {
                if let Some(index) = state.holdings.iter().position(|h| h.ticker == trade.ticker)
                {
                    let holding = &mut state.holdings[index];
                    holding.shares -= trade.quantity;
                    if holding.shares <= Decimal::ZERO {
                        state.holdings.remove(index);
                    }
                }
            }
        }

        let kind = match trade.action {
            TradeAction::Buy => ActivityKind::Buy,
            TradeAction::Sell => ActivityKind::Sell,
        };
        let verb = match trade.action {
            TradeAction::Buy => "Bought",
            TradeAction::Sell => "Sold",
        };
        let item = ActivityItem {
            id: Uuid::new_v4(),
            kind,
            text: format!(
                "{} {} {} shares at ${}",
                verb, trade.quantity, trade.ticker, trade.unit_price
            ),
            ticker: trade.ticker.clone(),
            amount: trade.total_cost,
            date: Utc::now(),
        };
        state.activity.insert(0, item);
    }

    pub async fn holdings(&self) -> Vec<Holding> {
        self.state.read().await.holdings.clone()
    }

    pub async fn recent_activity(&self) -> Vec<ActivityItem> {
        self.state.read().await.activity.clone()
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
