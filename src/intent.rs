use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Price,
    CompanyInfo,
    News,
    Comparison,
    ForwardLooking,
    Fundamentals,
    Sentiment,
    IndustryComparison,
    TradingOpportunity,
    Educational,
    None,
}

struct Rule {
    intent: Intent,
    patterns: Vec<Regex>,
}

fn rule(intent: Intent, patterns: &[&str]) -> Rule {
    Rule {
        intent,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(p).expect("intent pattern must compile"))
            .collect(),
    }
}

/// Dispatch table for `classify`. Evaluated top to bottom, first match wins,
/// so broader categories lower in the list never shadow the ones above.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(
            Intent::Price,
            &[
                r"what.*price.*(of|for)",
                r"how much.*(stock|share)",
                r"current.*price",
                r"stock.*price.*now",
            ],
        ),
        rule(
            Intent::CompanyInfo,
            &[
                r"tell me about",
                r"what.*company",
                r"company.*overview",
                r"business.*summary",
                r"about",
            ],
        ),
        rule(
            Intent::News,
            &[
                r"news.*(for|about)",
                r"headlines",
                r"latest.*news",
                r"what.*happening",
                r"news",
            ],
        ),
        rule(
            Intent::Comparison,
            &[r"compare", r"versus|vs", r"which.*better", r"difference.*between"],
        ),
        rule(
            Intent::ForwardLooking,
            &[
                r"upcoming.*events",
                r"earnings.*date",
                r"future.*outlook",
                r"sentiment.*around",
            ],
        ),
        rule(
            Intent::Fundamentals,
            &[
                r"financial.*health",
                r"debt.*equity",
                r"net income",
                r"fundamental.*analysis",
            ],
        ),
        rule(
            Intent::Sentiment,
            &[
                r"buying.*selling",
                r"institutional.*activity",
                r"insider.*trading",
                r"market.*sentiment",
            ],
        ),
        rule(
            Intent::IndustryComparison,
            &[r"industry.*peers", r"competitor.*analysis", r"sector.*comparison"],
        ),
        rule(
            Intent::TradingOpportunity,
            &[
                r"high.*volume",
                r"unusual.*activity",
                r"trading.*opportunity",
                r"market.*movers",
                r"high.*value",
                r"value.*stocks",
            ],
        ),
        rule(
            Intent::Educational,
            &[
                r"what.*dividend",
                r"explain.*market cap",
                r"diversification",
                r"risk.*management",
                r"how.*invest",
            ],
        ),
    ]
});

/// Classifies a user message into one of the fixed intents. Matching is
/// case-insensitive over the trimmed text and depends on nothing but the
/// text itself.
pub fn classify(text: &str) -> Intent {
    let normalized = text.trim().to_lowercase();

    for rule in RULES.iter() {
        if rule.patterns.iter().any(|p| p.is_match(&normalized)) {
            return rule.intent;
        }
    }

    Intent::None
}
