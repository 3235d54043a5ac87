use once_cell::sync::Lazy;
use regex::Regex;

/// Symbols the assistant knows how to talk about. Uppercase tokens outside
/// this universe are ignored so ordinary words like "I" or "CEO" never get
/// mistaken for tickers.
pub const KNOWN_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "TSLA", "NVDA", "AMZN", "GOOGL", "META", "NFLX", "AMD", "INTC", "KO", "F",
    "GM", "GME", "AMC", "ZM", "PTON",
];

/// Company-name fallbacks, matched case-insensitively by substring in this
/// order. Multi-word names come before their abbreviations so "general
/// motors" wins over a bare "gm".
static NAME_TO_TICKER: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("tesla", "TSLA"),
    ("nvidia", "NVDA"),
    ("amazon", "AMZN"),
    ("google", "GOOGL"),
    ("meta", "META"),
    ("netflix", "NFLX"),
    ("amd", "AMD"),
    ("intel", "INTC"),
    ("coca-cola", "KO"),
    ("coca cola", "KO"),
    ("coke", "KO"),
    ("ford", "F"),
    ("general motors", "GM"),
    ("gm", "GM"),
    ("gamestop", "GME"),
    ("amc", "AMC"),
    ("zoom", "ZM"),
    ("peloton", "PTON"),
];

static UPPERCASE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{1,5}\b").unwrap());

pub fn is_known_symbol(symbol: &str) -> bool {
    KNOWN_SYMBOLS.contains(&symbol)
}

/// Extracts the first ticker mentioned in `text`. Uppercase tokens that are
/// known symbols win over company-name matches.
pub fn extract(text: &str) -> Option<String> {
    extract_all(text).into_iter().next()
}

/// Extracts every ticker mentioned in `text`, deduplicated in first-seen
/// order. Uppercase symbol tokens are collected first, then company names
/// from the fallback table.
pub fn extract_all(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for token in UPPERCASE_TOKEN.find_iter(text) {
        let symbol = token.as_str();
        if is_known_symbol(symbol) && !found.iter().any(|t| t == symbol) {
            found.push(symbol.to_string());
        }
    }

    let lowered = text.to_lowercase();
    for (name, symbol) in NAME_TO_TICKER {
        if lowered.contains(name) && !found.iter().any(|t| t == symbol) {
            found.push((*symbol).to_string());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_symbol_is_extracted() {
        assert_eq!(extract("What's the price of AAPL?"), Some("AAPL".to_string()));
    }

    #[test]
    fn unknown_uppercase_token_is_ignored() {
        assert_eq!(extract("I think ZZZZ will moon"), None);
    }

    #[test]
    fn common_uppercase_words_are_not_tickers() {
        assert_eq!(extract("THE CEO SAID SO"), None);
    }

    #[test]
    fn company_name_falls_back_to_ticker() {
        assert_eq!(extract("how is tesla doing"), Some("TSLA".to_string()));
        assert_eq!(extract("Tell me about Coca Cola"), Some("KO".to_string()));
    }

    #[test]
    fn symbol_beats_name_mention() {
        // Both forms of the same company dedup to one entry.
        assert_eq!(extract_all("TSLA tesla"), vec!["TSLA"]);
    }

    #[test]
    fn extract_all_preserves_first_seen_order() {
        assert_eq!(extract_all("Compare Tesla vs Ford"), vec!["TSLA", "F"]);
        assert_eq!(extract_all("compare MSFT and AAPL"), vec!["MSFT", "AAPL"]);
    }

    #[test]
    fn general_motors_wins_over_bare_gm_prefix() {
        assert_eq!(extract("thoughts on general motors?"), Some("GM".to_string()));
    }

    #[test]
    fn lowercase_symbol_alone_is_not_extracted() {
        // Lowercase tokens only match through the name table.
        assert_eq!(extract("is aapl a buy"), None);
    }
}
