use crate::models::{
    Company, CompanyComparison, ComparisonData, FinancialHealthData, FinancialMetric, MarketMover,
    MarketMoversData, NewsData, NewsItem, NewsSentiment, RevenueSegment, StockData,
    ValuationMetrics, ValuationRow,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Source of the market data the composer renders into cards. The chat
/// pipeline only ever talks to this trait, so swapping the demo data for a
/// live feed touches nothing above it.
pub trait MarketProvider: Send + Sync {
    fn price(&self, ticker: &str) -> Option<Decimal>;
    fn company(&self, ticker: &str) -> Option<Company>;
    fn comparison(&self, ticker_a: &str, ticker_b: &str) -> Option<ComparisonData>;
    fn market_movers(&self) -> MarketMoversData;
    fn financial_health(&self, ticker: &str) -> Option<FinancialHealthData>;
    fn news(&self, ticker: &str) -> Option<NewsData>;
}

/// Demo unit prices. These also gate the trade parser: a command naming a
/// ticker outside this table is not a trade command at all.
pub fn demo_price(ticker: &str) -> Option<Decimal> {
    let price = match ticker {
        "AAPL" => dec!(180.00),
        "AMZN" => dec!(140.00),
        "MSFT" => dec!(320.00),
        "GOOGL" => dec!(125.00),
        "TSLA" => dec!(250.00),
        "NVDA" => dec!(420.00),
        "META" => dec!(285.00),
        "NFLX" => dec!(380.00),
        _ => return None,
    };
    Some(price)
}

struct DemoProfile {
    name: &'static str,
    industry: &'static str,
    sector: &'static str,
    snapshot: &'static str,
    moat: &'static str,
    fit: &'static str,
    risks: [&'static str; 3],
    change: Decimal,
    pe: Decimal,
    dividend_yield: Decimal,
    market_cap_billions: Decimal,
}

fn demo_profile(ticker: &str) -> Option<DemoProfile> {
    let profile = match ticker {
        "AAPL" => DemoProfile {
            name: "Apple Inc.",
            industry: "Consumer Electronics",
            sector: "Technology",
            snapshot: "Designs and sells iPhone, Mac, wearables and a fast-growing services business.",
            moat: "Ecosystem lock-in and premium brand support industry-leading margins.",
            fit: "Core holding for quality-focused investors comfortable with hardware cyclicality.",
            risks: [
                "iPhone revenue concentration",
                "Regulatory pressure on App Store economics",
                "China supply-chain exposure",
            ],
            change: dec!(2.15),
            pe: dec!(29.4),
            dividend_yield: dec!(0.52),
            market_cap_billions: dec!(2800),
        },
        "AMZN" => DemoProfile {
            name: "Amazon.com, Inc.",
            industry: "Internet Retail",
            sector: "Consumer Cyclical",
            snapshot: "E-commerce and logistics giant whose profits increasingly come from AWS cloud.",
            moat: "Fulfillment scale and AWS switching costs.",
            fit: "Growth investors tolerant of thin retail margins.",
            risks: [
                "Retail margin compression",
                "Cloud competition from Microsoft and Google",
                "Antitrust scrutiny",
            ],
            change: dec!(-1.20),
            pe: dec!(52.1),
            dividend_yield: dec!(0.00),
            market_cap_billions: dec!(1450),
        },
        "MSFT" => DemoProfile {
            name: "Microsoft Corporation",
            industry: "Software - Infrastructure",
            sector: "Technology",
            snapshot: "Enterprise software and Azure cloud franchise with entrenched Office and Windows estates.",
            moat: "Enterprise switching costs and bundled distribution.",
            fit: "Defensive growth at a reasonable premium.",
            risks: [
                "Azure growth deceleration",
                "Large acquisitions integration risk",
                "Enterprise IT spending cycles",
            ],
            change: dec!(4.02),
            pe: dec!(34.8),
            dividend_yield: dec!(0.88),
            market_cap_billions: dec!(2380),
        },
        "GOOGL" => DemoProfile {
            name: "Alphabet Inc.",
            industry: "Internet Content & Information",
            sector: "Communication Services",
            snapshot: "Search and YouTube advertising leader with a scaled cloud and AI research arm.",
            moat: "Search distribution defaults and data advantage.",
            fit: "Advertising-cycle exposure at a below-megacap-average multiple.",
            risks: [
                "Ad spending cyclicality",
                "Antitrust remedies against default deals",
                "AI-driven search disruption",
            ],
            change: dec!(0.85),
            pe: dec!(24.6),
            dividend_yield: dec!(0.00),
            market_cap_billions: dec!(1580),
        },
        "TSLA" => DemoProfile {
            name: "Tesla, Inc.",
            industry: "Auto Manufacturers",
            sector: "Consumer Cyclical",
            snapshot: "Vertically integrated electric-vehicle and energy-storage maker.",
            moat: "Manufacturing cost lead and charging network.",
            fit: "High-volatility growth position, sized accordingly.",
            risks: [
                "EV price-war margin pressure",
                "Key-person dependence",
                "Competition from legacy automakers",
            ],
            change: dec!(-3.40),
            pe: dec!(68.2),
            dividend_yield: dec!(0.00),
            market_cap_billions: dec!(790),
        },
        "NVDA" => DemoProfile {
            name: "NVIDIA Corporation",
            industry: "Semiconductors",
            sector: "Technology",
            snapshot: "Dominant supplier of accelerators for AI training and inference.",
            moat: "CUDA software ecosystem on top of a hardware lead.",
            fit: "Concentrated AI-infrastructure exposure with elevated expectations baked in.",
            risks: [
                "Order concentration among hyperscalers",
                "Export restrictions to China",
                "Custom-silicon competition",
            ],
            change: dec!(8.90),
            pe: dec!(61.5),
            dividend_yield: dec!(0.03),
            market_cap_billions: dec!(1040),
        },
        "META" => DemoProfile {
            name: "Meta Platforms, Inc.",
            industry: "Internet Content & Information",
            sector: "Communication Services",
            snapshot: "Family-of-apps advertising business funding long-dated Reality Labs bets.",
            moat: "Social-graph network effects across Facebook, Instagram and WhatsApp.",
            fit: "Advertising recovery play with an optional AI/metaverse kicker.",
            risks: [
                "Reality Labs losses",
                "Ad-targeting regulation",
                "Engagement shift to short-form rivals",
            ],
            change: dec!(1.75),
            pe: dec!(27.9),
            dividend_yield: dec!(0.00),
            market_cap_billions: dec!(730),
        },
        "NFLX" => DemoProfile {
            name: "Netflix, Inc.",
            industry: "Entertainment",
            sector: "Communication Services",
            snapshot: "Largest paid streaming service, now monetizing password sharing and ads.",
            moat: "Content scale and recommendation data.",
            fit: "Subscriber-growth story transitioning to margin expansion.",
            risks: [
                "Content cost inflation",
                "Streaming competition",
                "Saturation in mature markets",
            ],
            change: dec!(-0.95),
            pe: dec!(43.3),
            dividend_yield: dec!(0.00),
            market_cap_billions: dec!(168),
        },
        _ => return None,
    };
    Some(profile)
}

fn demo_stock_data(ticker: &str) -> Option<StockData> {
    let price = demo_price(ticker)?;
    let profile = demo_profile(ticker)?;
    let change_percent = (profile.change / (price - profile.change) * dec!(100)).round_dp(2);
    Some(StockData {
        current_price: price,
        change: profile.change,
        change_percent,
        market_cap: profile.market_cap_billions * dec!(1000000000),
        pe_ratio: profile.pe,
        dividend_yield: profile.dividend_yield,
        volume: 52_000_000,
        avg_volume: 58_000_000,
    })
}

// Display names for the known symbols without a detailed profile, so that
// single-entity cards and comparisons can cover the whole universe.
fn fallback_name(ticker: &str) -> Option<&'static str> {
    let name = match ticker {
        "AMD" => "Advanced Micro Devices, Inc.",
        "INTC" => "Intel Corporation",
        "KO" => "The Coca-Cola Company",
        "F" => "Ford Motor Company",
        "GM" => "General Motors Company",
        "GME" => "GameStop Corp.",
        "AMC" => "AMC Entertainment Holdings, Inc.",
        "ZM" => "Zoom Video Communications, Inc.",
        "PTON" => "Peloton Interactive, Inc.",
        _ => return None,
    };
    Some(name)
}

fn display_name(ticker: &str) -> Option<String> {
    demo_profile(ticker)
        .map(|p| p.name.to_string())
        .or_else(|| fallback_name(ticker).map(|n| n.to_string()))
}

// Indicative prices for card display only. The trade parser stays gated on
// `demo_price`, so these symbols are still not tradeable.
fn display_price(ticker: &str) -> Option<Decimal> {
    if let Some(price) = demo_price(ticker) {
        return Some(price);
    }
    let price = match ticker {
        "AMD" => dec!(110.00),
        "INTC" => dec!(35.00),
        "KO" => dec!(60.00),
        "F" => dec!(12.00),
        "GM" => dec!(38.00),
        "GME" => dec!(15.00),
        "AMC" => dec!(5.00),
        "ZM" => dec!(65.00),
        "PTON" => dec!(7.00),
        _ => return None,
    };
    Some(price)
}

// Comparison works for every known symbol, not just the ones with a detailed
// profile, so sides without one get a generic entry.
fn demo_comparison_side(ticker: &str) -> Option<CompanyComparison> {
    if !crate::ticker::is_known_symbol(ticker) {
        return None;
    }

    let revenue_data = vec![
        RevenueSegment {
            name: "Core".to_string(),
            value: 70,
        },
        RevenueSegment {
            name: "Other".to_string(),
            value: 30,
        },
    ];

    let side = match demo_profile(ticker) {
        Some(profile) => CompanyComparison {
            ticker: ticker.to_string(),
            name: profile.name.to_string(),
            strengths: vec![profile.moat.to_string(), profile.snapshot.to_string()],
            risks: profile.risks.iter().map(|r| r.to_string()).collect(),
            investor_fit: profile.fit.to_string(),
            revenue_data,
        },
        None => CompanyComparison {
            ticker: ticker.to_string(),
            name: display_name(ticker).unwrap_or_else(|| ticker.to_string()),
            strengths: vec![format!("Established business behind the {} listing", ticker)],
            risks: vec!["Limited demo coverage for this symbol".to_string()],
            investor_fit: "Review fundamentals before sizing a position.".to_string(),
            revenue_data,
        },
    };
    Some(side)
}

pub struct DemoMarketProvider;

impl MarketProvider for DemoMarketProvider {
    fn price(&self, ticker: &str) -> Option<Decimal> {
        demo_price(ticker)
    }

    fn company(&self, ticker: &str) -> Option<Company> {
        if let Some(profile) = demo_profile(ticker) {
            let stock_data = demo_stock_data(ticker)?;
            return Some(Company {
                ticker: ticker.to_string(),
                name: profile.name.to_string(),
                snapshot: profile.snapshot.to_string(),
                moat: profile.moat.to_string(),
                risks: profile.risks.iter().map(|r| r.to_string()).collect(),
                valuation_metrics: ValuationMetrics {
                    pe: profile.pe.to_string(),
                    ps: "6.8".to_string(),
                    industry_pe: "25.0".to_string(),
                    industry_ps: "4.2".to_string(),
                    margin_of_safety: "Fairly valued against its five-year range".to_string(),
                },
                fit: profile.fit.to_string(),
                stock_data,
                industry: profile.industry.to_string(),
                sector: profile.sector.to_string(),
            });
        }

        // Generic card for the rest of the known universe, so a resolved
        // entity always gets a card rather than a clarification.
        let name = fallback_name(ticker)?.to_string();
        let price = display_price(ticker)?;
        Some(Company {
            ticker: ticker.to_string(),
            name: name.clone(),
            snapshot: format!(
                "{} trades on US exchanges as {}; detailed demo coverage for this symbol is \
                 limited.",
                name, ticker
            ),
            moat: "Established market position in its segment.".to_string(),
            risks: vec!["Limited demo coverage for this symbol".to_string()],
            valuation_metrics: ValuationMetrics {
                pe: "n/a".to_string(),
                ps: "n/a".to_string(),
                industry_pe: "n/a".to_string(),
                industry_ps: "n/a".to_string(),
                margin_of_safety: "Insufficient demo data".to_string(),
            },
            fit: "Review fundamentals before sizing a position.".to_string(),
            stock_data: StockData {
                current_price: price,
                change: Decimal::ZERO,
                change_percent: Decimal::ZERO,
                market_cap: Decimal::ZERO,
                pe_ratio: Decimal::ZERO,
                dividend_yield: Decimal::ZERO,
                volume: 0,
                avg_volume: 0,
            },
            industry: "General".to_string(),
            sector: "General".to_string(),
        })
    }

    fn comparison(&self, ticker_a: &str, ticker_b: &str) -> Option<ComparisonData> {
        let company_a = demo_comparison_side(ticker_a)?;
        let company_b = demo_comparison_side(ticker_b)?;

        let profile_a = demo_profile(ticker_a);
        let profile_b = demo_profile(ticker_b);

        // Valuation rows only where both sides have demo numbers.
        let mut valuation_data = Vec::new();
        if let (Some(a), Some(b)) = (&profile_a, &profile_b) {
            valuation_data.push(ValuationRow {
                metric: "P/E".to_string(),
                value_a: a.pe,
                value_b: b.pe,
            });
            valuation_data.push(ValuationRow {
                metric: "Dividend yield %".to_string(),
                value_a: a.dividend_yield,
                value_b: b.dividend_yield,
            });
        }
        if let (Some(a), Some(b)) = (display_price(ticker_a), display_price(ticker_b)) {
            valuation_data.push(ValuationRow {
                metric: "Price".to_string(),
                value_a: a,
                value_b: b,
            });
        }

        let verdict = match (&profile_a, &profile_b) {
            (Some(a), Some(b)) => format!(
                "{} trades at a {} multiple than {}; the better fit depends on whether you \
                 prioritize {} or {}.",
                ticker_a,
                if a.pe > b.pe { "richer" } else { "cheaper" },
                ticker_b,
                a.industry.to_lowercase(),
                b.industry.to_lowercase(),
            ),
            _ => format!(
                "{} and {} serve different investor profiles; weigh the strengths and risks \
                 above against your goals.",
                ticker_a, ticker_b
            ),
        };

        Some(ComparisonData {
            company_a,
            company_b,
            valuation_data,
            verdict,
        })
    }

    fn market_movers(&self) -> MarketMoversData {
        let mover = |ticker: &str, change: Decimal| -> MarketMover {
            let price = demo_price(ticker).unwrap_or(dec!(100));
            let name = demo_profile(ticker)
                .map(|p| p.name.to_string())
                .unwrap_or_else(|| ticker.to_string());
            MarketMover {
                ticker: ticker.to_string(),
                name,
                current_price: price,
                change,
                change_percent: (change / price * dec!(100)).round_dp(2),
                volume: 80_000_000,
                avg_volume: 55_000_000,
            }
        };

        MarketMoversData {
            gainers: vec![
                mover("NVDA", dec!(18.40)),
                mover("MSFT", dec!(9.10)),
                mover("META", dec!(6.30)),
            ],
            losers: vec![
                mover("TSLA", dec!(-11.25)),
                mover("NFLX", dec!(-7.60)),
                mover("AMZN", dec!(-3.05)),
            ],
            date: Utc::now(),
        }
    }

    fn financial_health(&self, ticker: &str) -> Option<FinancialHealthData> {
        let name = display_name(ticker)?;
        let metrics = vec![
            FinancialMetric {
                name: "Debt to equity".to_string(),
                value: dec!(0.45),
                unit: "x".to_string(),
                benchmark: dec!(1.0),
                is_higher_better: false,
                description: "Total debt relative to shareholder equity.".to_string(),
            },
            FinancialMetric {
                name: "Current ratio".to_string(),
                value: dec!(1.6),
                unit: "x".to_string(),
                benchmark: dec!(1.2),
                is_higher_better: true,
                description: "Short-term assets covering short-term liabilities.".to_string(),
            },
            FinancialMetric {
                name: "Net margin".to_string(),
                value: dec!(21.0),
                unit: "%".to_string(),
                benchmark: dec!(10.0),
                is_higher_better: true,
                description: "Net income as a share of revenue.".to_string(),
            },
            FinancialMetric {
                name: "Return on equity".to_string(),
                value: dec!(28.0),
                unit: "%".to_string(),
                benchmark: dec!(15.0),
                is_higher_better: true,
                description: "Profit generated per dollar of equity.".to_string(),
            },
        ];
        Some(FinancialHealthData {
            ticker: ticker.to_string(),
            name,
            metrics,
            overall_score: 78,
            last_updated: Utc::now(),
        })
    }

    fn news(&self, ticker: &str) -> Option<NewsData> {
        let name = display_name(ticker)?;
        let segment = demo_profile(ticker)
            .map(|p| p.industry.to_lowercase())
            .unwrap_or_else(|| "core".to_string());
        let now = Utc::now();
        let item = |offset_hours: i64, title: String, summary: String, sentiment: NewsSentiment| {
            NewsItem {
                id: format!("{}-{}", ticker.to_lowercase(), offset_hours),
                title,
                summary,
                source: "Demo Newswire".to_string(),
                published_at: now - Duration::hours(offset_hours),
                url: format!(
                    "https://news.example.com/{}/{}",
                    ticker.to_lowercase(),
                    offset_hours
                ),
                sentiment,
            }
        };

        let news = vec![
            item(
                3,
                format!("{} beats quarterly revenue estimates", name),
                format!(
                    "{} reported revenue ahead of consensus, driven by its {} segment.",
                    name, segment
                ),
                NewsSentiment::Positive,
            ),
            item(
                26,
                format!("Analysts split on {} valuation", ticker),
                format!(
                    "Sell-side targets for {} diverge after the latest guidance update.",
                    name
                ),
                NewsSentiment::Neutral,
            ),
            item(
                50,
                format!("{} faces fresh regulatory questions", name),
                "Regulators requested additional disclosures, with no timeline given.".to_string(),
                NewsSentiment::Negative,
            ),
        ];

        Some(NewsData {
            ticker: ticker.to_string(),
            name,
            news,
            last_updated: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_prices_match_the_published_table() {
        assert_eq!(demo_price("AAPL"), Some(dec!(180.00)));
        assert_eq!(demo_price("TSLA"), Some(dec!(250.00)));
        assert_eq!(demo_price("ZZZZ"), None);
    }

    #[test]
    fn company_card_carries_stock_data() {
        let provider = DemoMarketProvider;
        let company = provider.company("AAPL").unwrap();
        assert_eq!(company.ticker, "AAPL");
        assert_eq!(company.stock_data.current_price, dec!(180.00));
        assert!(!company.risks.is_empty());
    }

    #[test]
    fn comparison_requires_both_sides_known() {
        let provider = DemoMarketProvider;
        assert!(provider.comparison("TSLA", "AAPL").is_some());
        assert!(provider.comparison("TSLA", "ZZZZ").is_none());
    }

    #[test]
    fn comparison_covers_known_symbols_without_detailed_profiles() {
        let provider = DemoMarketProvider;
        let data = provider.comparison("TSLA", "F").unwrap();
        assert_eq!(data.company_b.ticker, "F");
        assert_eq!(data.company_b.name, "Ford Motor Company");
        // No detailed demo numbers for F: only the indicative price pairs up.
        assert_eq!(data.valuation_data.len(), 1);
        assert_eq!(data.valuation_data[0].metric, "Price");
    }

    #[test]
    fn every_known_symbol_yields_single_entity_cards() {
        let provider = DemoMarketProvider;
        for symbol in crate::ticker::KNOWN_SYMBOLS {
            let company = provider.company(symbol).unwrap();
            assert_eq!(company.ticker, *symbol);
            assert!(company.stock_data.current_price > Decimal::ZERO);
            assert!(provider.news(symbol).is_some());
            assert!(provider.financial_health(symbol).is_some());
        }
    }

    #[test]
    fn fallback_company_card_uses_the_display_name_and_indicative_price() {
        let provider = DemoMarketProvider;
        let company = provider.company("F").unwrap();
        assert_eq!(company.name, "Ford Motor Company");
        assert_eq!(company.stock_data.current_price, dec!(12.00));
        // Still not tradeable: the trade parser gate is unchanged.
        assert_eq!(demo_price("F"), None);
    }

    #[test]
    fn movers_have_both_gainers_and_losers() {
        let provider = DemoMarketProvider;
        let movers = provider.market_movers();
        assert!(!movers.gainers.is_empty());
        assert!(!movers.losers.is_empty());
    }

    #[test]
    fn news_is_present_for_known_tickers_only() {
        let provider = DemoMarketProvider;
        assert!(provider.news("NVDA").is_some());
        assert!(provider.news("ZZZZ").is_none());
    }
}
