use crate::models::{PendingTrade, TradeAction};
use crate::providers::demo_price;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

struct TradePattern {
    regex: Regex,
    action: TradeAction,
    /// Capture-group order: `buy AAPL 5 shares` puts the ticker first,
    /// the other surface forms put the quantity first.
    ticker_first: bool,
}

fn pattern(action: TradeAction, ticker_first: bool, source: &str) -> TradePattern {
    TradePattern {
        regex: Regex::new(source).expect("trade pattern must compile"),
        action,
        ticker_first,
    }
}

static PATTERNS: Lazy<Vec<TradePattern>> = Lazy::new(|| {
    vec![
        pattern(
            TradeAction::Buy,
            false,
            r"(?i)buy\s+(\d+(?:\.\d+)?)\s+([a-z]{1,5})\s*shares?",
        ),
        pattern(
            TradeAction::Buy,
            true,
            r"(?i)buy\s+([a-z]{1,5})\s+(\d+(?:\.\d+)?)\s*shares?",
        ),
        pattern(
            TradeAction::Buy,
            false,
            r"(?i)purchase\s+(\d+(?:\.\d+)?)\s+([a-z]{1,5})\s*shares?",
        ),
        pattern(
            TradeAction::Buy,
            false,
            r"(?i)(\d+(?:\.\d+)?)\s+([a-z]{1,5})\s*shares?\s+buy",
        ),
        pattern(
            TradeAction::Sell,
            false,
            r"(?i)sell\s+(\d+(?:\.\d+)?)\s+([a-z]{1,5})\s*shares?",
        ),
        pattern(
            TradeAction::Sell,
            true,
            r"(?i)sell\s+([a-z]{1,5})\s+(\d+(?:\.\d+)?)\s*shares?",
        ),
        pattern(
            TradeAction::Sell,
            false,
            r"(?i)(\d+(?:\.\d+)?)\s+([a-z]{1,5})\s*shares?\s+sell",
        ),
    ]
});

/// Recognizes a buy/sell instruction embedded in chat text and freezes its
/// terms into a proposal. A command naming a ticker without a demo price, or
/// a non-positive quantity, is not a trade command: it returns `None` and the
/// message falls through to normal handling.
pub fn parse(text: &str) -> Option<PendingTrade> {
    let trimmed = text.trim();

    for pattern in PATTERNS.iter() {
        let Some(captures) = pattern.regex.captures(trimmed) else {
            continue;
        };

        let (ticker_raw, quantity_raw) = if pattern.ticker_first {
            (captures.get(1), captures.get(2))
        } else {
            (captures.get(2), captures.get(1))
        };
        let (Some(ticker_raw), Some(quantity_raw)) = (ticker_raw, quantity_raw) else {
            continue;
        };

        let ticker = ticker_raw.as_str().to_uppercase();
        let Ok(quantity) = Decimal::from_str(quantity_raw.as_str()) else {
            continue;
        };
        if quantity <= Decimal::ZERO {
            continue;
        }

        let Some(unit_price) = demo_price(&ticker) else {
            continue;
        };

        return Some(PendingTrade {
            action: pattern.action,
            ticker,
            quantity,
            unit_price,
            // Price is frozen here; confirmation later settles at these terms.
            total_cost: quantity * unit_price,
        });
    }

    None
}

fn contains_word(text: &str, words: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

/// Whole-word confirmation check, so "I know a guy" neither confirms nor
/// cancels anything.
pub fn is_affirmative(text: &str) -> bool {
    contains_word(&text.trim().to_lowercase(), &["yes", "confirm", "y"])
}

pub fn is_negative(text: &str) -> bool {
    contains_word(&text.trim().to_lowercase(), &["no", "cancel", "n"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn buy_quantity_first_parses() {
        let trade = parse("buy 5 AAPL shares").unwrap();
        assert_eq!(trade.action, TradeAction::Buy);
        assert_eq!(trade.ticker, "AAPL");
        assert_eq!(trade.quantity, dec!(5));
        assert_eq!(trade.unit_price, dec!(180.00));
        assert_eq!(trade.total_cost, dec!(900.00));
    }

    #[test]
    fn buy_ticker_first_parses() {
        let trade = parse("buy tsla 2 shares").unwrap();
        assert_eq!(trade.ticker, "TSLA");
        assert_eq!(trade.quantity, dec!(2));
        assert_eq!(trade.total_cost, dec!(500.00));
    }

    #[test]
    fn purchase_and_trailing_verb_forms_parse() {
        assert_eq!(parse("purchase 3 MSFT shares").unwrap().ticker, "MSFT");
        assert_eq!(
            parse("10 NVDA shares buy").unwrap().action,
            TradeAction::Buy
        );
        assert_eq!(
            parse("4 NFLX shares sell").unwrap().action,
            TradeAction::Sell
        );
    }

    #[test]
    fn sell_forms_parse() {
        let trade = parse("sell 1.5 GOOGL shares").unwrap();
        assert_eq!(trade.action, TradeAction::Sell);
        assert_eq!(trade.quantity, dec!(1.5));
        assert_eq!(trade.total_cost, dec!(187.500));
    }

    #[test]
    fn unknown_ticker_is_not_a_trade() {
        assert!(parse("buy 5 ZZZZ shares").is_none());
    }

    #[test]
    fn zero_quantity_is_not_a_trade() {
        assert!(parse("buy 0 AAPL shares").is_none());
    }

    #[test]
    fn ordinary_text_is_not_a_trade() {
        assert!(parse("should I buy Apple?").is_none());
        assert!(parse("what's the price of AAPL").is_none());
    }

    #[test]
    fn confirmation_tokens_match_whole_words_only() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("Yes please, confirm it"));
        assert!(is_affirmative("y"));
        assert!(!is_affirmative("eyes on the market"));

        assert!(is_negative("no"));
        assert!(is_negative("cancel that"));
        assert!(is_negative("n"));
        assert!(!is_negative("I know"));
        assert!(!is_negative("nothing yet"));
    }
}
