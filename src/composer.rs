use crate::intent::Intent;
use crate::models::MessageBody;
use crate::providers::MarketProvider;

/// Turns a classified message into a reply body, pulling card data from the
/// injected provider. Every path returns something to say; missing entities
/// produce a clarification, never an error.
pub fn compose(
    provider: &dyn MarketProvider,
    intent: Intent,
    tickers: &[String],
    raw_text: &str,
) -> MessageBody {
    match intent {
        Intent::Price | Intent::CompanyInfo => match tickers.first() {
            Some(ticker) => match provider.company(ticker) {
                Some(company) => MessageBody::CompanyCard(company),
                None => MessageBody::text(format!(
                    "I don't have detailed data for {} yet. Try one of the covered large caps \
                     like AAPL, MSFT or TSLA.",
                    ticker
                )),
            },
            None => MessageBody::text(
                "Which company are you asking about? Give me a ticker like AAPL or a company \
                 name and I'll pull it up.",
            ),
        },

        Intent::News => match tickers.first() {
            Some(ticker) => match provider.news(ticker) {
                Some(news) => MessageBody::NewsCard(news),
                None => MessageBody::text(format!(
                    "No recent coverage for {} in my demo feed.",
                    ticker
                )),
            },
            None => MessageBody::text("Whose news are you after? Name a company or ticker."),
        },

        Intent::Comparison | Intent::IndustryComparison => {
            if tickers.len() < 2 {
                return MessageBody::text(
                    "I need two companies to compare. Try something like \"compare AAPL and \
                     MSFT\".",
                );
            }
            match provider.comparison(&tickers[0], &tickers[1]) {
                Some(comparison) => MessageBody::ComparisonCard(comparison),
                None => MessageBody::text(
                    "I couldn't match both of those to companies I cover. Try two well-known \
                     tickers.",
                ),
            }
        }

        Intent::ForwardLooking => match tickers.first() {
            Some(ticker) => MessageBody::text(format!(
                "Nothing on the {} calendar in the demo data set. Earnings dates and events \
                 land here once a live events feed is wired up.",
                ticker
            )),
            None => MessageBody::text(
                "Which company's upcoming events are you interested in?",
            ),
        },

        Intent::Fundamentals => match tickers.first() {
            Some(ticker) => match provider.financial_health(ticker) {
                Some(health) => MessageBody::FinancialHealthCard(health),
                None => MessageBody::text(format!(
                    "I don't have fundamentals for {} in the demo data set.",
                    ticker
                )),
            },
            None => MessageBody::text("Whose financials should I break down? Name a ticker."),
        },

        Intent::Sentiment => match tickers.first() {
            Some(ticker) => MessageBody::text(format!(
                "Institutional flow for {} is flat in the demo data: no unusual insider or \
                 fund activity on record.",
                ticker
            )),
            None => MessageBody::text("Which stock's sentiment do you want me to check?"),
        },

        Intent::TradingOpportunity => MessageBody::MarketMoversCard(provider.market_movers()),

        Intent::Educational => MessageBody::text(educational_answer(raw_text)),

        Intent::None => MessageBody::text(
            "I can help with stock prices, company overviews, news, comparisons and simple \
             buy/sell orders. What would you like to look at?",
        ),
    }
}

fn educational_answer(raw_text: &str) -> String {
    let lowered = raw_text.to_lowercase();

    if lowered.contains("dividend") {
        "A dividend is a portion of a company's profit paid out to shareholders, usually \
         quarterly. The dividend yield is that payout as a percentage of the share price."
            .to_string()
    } else if lowered.contains("market cap") {
        "Market capitalization is the total value of a company's shares: share price times \
         shares outstanding. It's the quickest way to compare company sizes."
            .to_string()
    } else if lowered.contains("diversification") {
        "Diversification means spreading your money across assets that don't move together, \
         so one bad position can't sink the whole portfolio."
            .to_string()
    } else {
        "Happy to explain investing concepts like dividends, market cap, diversification or \
         risk management. Which one?"
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::DemoMarketProvider;

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn price_question_with_ticker_yields_company_card() {
        let body = compose(
            &DemoMarketProvider,
            Intent::Price,
            &tickers(&["AAPL"]),
            "What's the price of AAPL?",
        );
        match body {
            MessageBody::CompanyCard(company) => {
                assert_eq!(company.ticker, "AAPL");
            }
            other => panic!("expected company card, got {:?}", other),
        }
    }

    #[test]
    fn price_question_without_ticker_asks_for_one() {
        let body = compose(&DemoMarketProvider, Intent::Price, &[], "what's the price");
        assert!(matches!(body, MessageBody::Text(_)));
    }

    #[test]
    fn comparison_with_two_tickers_yields_comparison_card() {
        let body = compose(
            &DemoMarketProvider,
            Intent::Comparison,
            &tickers(&["TSLA", "F"]),
            "Compare Tesla vs Ford",
        );
        assert!(matches!(body, MessageBody::ComparisonCard(_)));
    }

    #[test]
    fn comparison_with_one_ticker_asks_for_two() {
        let body = compose(
            &DemoMarketProvider,
            Intent::Comparison,
            &tickers(&["TSLA"]),
            "compare tesla",
        );
        assert!(matches!(body, MessageBody::Text(_)));
    }

    #[test]
    fn news_yields_news_card() {
        let body = compose(
            &DemoMarketProvider,
            Intent::News,
            &tickers(&["NVDA"]),
            "latest news about NVDA",
        );
        assert!(matches!(body, MessageBody::NewsCard(_)));
    }

    #[test]
    fn fundamentals_yields_financial_health_card() {
        let body = compose(
            &DemoMarketProvider,
            Intent::Fundamentals,
            &tickers(&["MSFT"]),
            "MSFT financial health",
        );
        assert!(matches!(body, MessageBody::FinancialHealthCard(_)));
    }

    #[test]
    fn resolved_symbols_without_detailed_profiles_still_get_cards() {
        let body = compose(
            &DemoMarketProvider,
            Intent::Price,
            &tickers(&["F"]),
            "current price of Ford",
        );
        assert!(matches!(body, MessageBody::CompanyCard(_)));

        let body = compose(
            &DemoMarketProvider,
            Intent::News,
            &tickers(&["KO"]),
            "latest news about coca cola",
        );
        assert!(matches!(body, MessageBody::NewsCard(_)));

        let body = compose(
            &DemoMarketProvider,
            Intent::Fundamentals,
            &tickers(&["GM"]),
            "how is GM's financial health",
        );
        assert!(matches!(body, MessageBody::FinancialHealthCard(_)));
    }

    #[test]
    fn trading_opportunity_yields_movers_card_without_entities() {
        let body = compose(&DemoMarketProvider, Intent::TradingOpportunity, &[], "market movers");
        assert!(matches!(body, MessageBody::MarketMoversCard(_)));
    }

    #[test]
    fn educational_answers_are_keyword_selected() {
        let body = compose(&DemoMarketProvider, Intent::Educational, &[], "what is a dividend?");
        match body {
            MessageBody::Text(text) => assert!(text.contains("dividend")),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn unclassified_input_gets_a_nonempty_reply() {
        let body = compose(&DemoMarketProvider, Intent::None, &[], "hello there");
        match body {
            MessageBody::Text(text) => assert!(!text.is_empty()),
            other => panic!("expected text, got {:?}", other),
        }
    }
}
