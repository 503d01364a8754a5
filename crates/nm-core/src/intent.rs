//! Keyword heuristics mapping free text to intents.
//!
//! Stateless: the text is lower-cased, every rule is tried in declaration
//! order, and each rule that matches contributes one intent. Several rules
//! may produce the same action with different claims.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[#@]?\w[\w\-._:]*").unwrap());

static RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    vec![
        // multilingual verbs, whole words only
        IntentRule::words(&["deploy", "despleg", "publicar", "publish"], "deploy", "deploy.web"),
        IntentRule::words(&["connect", "conectar", "vincular"], "connect", "connect.generic"),
        IntentRule::words(&["scan", "qr", "escanear", "escanea"], "scan", "sensor.qr"),
        IntentRule::words(&["learn", "aprender", "aprende"], "learn", "reason.learn"),
        IntentRule::words(&["analyze", "analizar", "analiza"], "analyze", "reason.analyze"),
        IntentRule::words(&["run", "execute", "ejecutar", "ejecuta"], "run", "exec.generic"),
        // ecosystem hints, anywhere in the text
        IntentRule::substrings(&["evm", "ethereum"], "connect", "connect.evm"),
        IntentRule::substrings(&["ipfs"], "deploy", "ipfs.pin"),
        IntentRule::substrings(&["wasm"], "deploy", "deploy.wasm"),
        IntentRule::substrings(&["qr"], "scan", "sensor.qr"),
        IntentRule::substrings(&["sensor"], "sense", "sensor.any"),
    ]
});

/// An action the text appears to ask for, with capability claims that
/// could serve it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
    pub claims: Vec<String>,
}

/// Outcome of understanding a piece of text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Heuristic signal strength in [0, 1].
    pub confidence: f64,
    pub intents: Vec<Intent>,
    /// Distinct tokens, sorted.
    pub tokens: Vec<String>,
}

enum Trigger {
    Words(Regex),
    Substrings(&'static [&'static str]),
}

struct IntentRule {
    trigger: Trigger,
    action: &'static str,
    claim: &'static str,
}

impl IntentRule {
    fn words(words: &[&str], action: &'static str, claim: &'static str) -> Self {
        let pattern = format!(r"\b(?:{})\b", words.join("|"));
        Self {
            trigger: Trigger::Words(Regex::new(&pattern).unwrap()),
            action,
            claim,
        }
    }

    fn substrings(needles: &'static [&'static str], action: &'static str, claim: &'static str) -> Self {
        Self {
            trigger: Trigger::Substrings(needles),
            action,
            claim,
        }
    }

    fn matches(&self, text: &str) -> bool {
        match &self.trigger {
            Trigger::Words(re) => re.is_match(text),
            Trigger::Substrings(needles) => needles.iter().any(|n| text.contains(n)),
        }
    }

    fn intent(&self) -> Intent {
        Intent {
            action: self.action.to_string(),
            claims: vec![self.claim.to_string()],
        }
    }
}

/// Distinct tokens of `text` (already lower-cased by the caller), sorted.
///
/// A token is a word character optionally prefixed by `#` or `@`, followed
/// by word characters, `-`, `.`, `_` or `:`.
pub fn extract_tokens(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Extract intents, tokens and a confidence score from free text.
pub fn understand(text: &str) -> IntentResult {
    let lowered = text.to_lowercase();

    let intents: Vec<Intent> = RULES
        .iter()
        .filter(|rule| rule.matches(&lowered))
        .map(IntentRule::intent)
        .collect();
    let tokens = extract_tokens(&lowered);

    let token_bonus = if tokens.is_empty() { 0.0 } else { 0.1 };
    let confidence = (0.2 + 0.2 * intents.len() as f64 + token_bonus).min(1.0);

    IntentResult {
        confidence,
        intents,
        tokens,
    }
}
