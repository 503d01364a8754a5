//! Reasoning over the symbol store: explanations, merge suggestions,
//! resonance, rule application and symbolic block interpretation.
//!
//! The engine owns its [`SymbolStore`]. Callers construct one per process
//! (or per test) and thread it through every request; nothing here logs or
//! performs I/O, results are returned for the caller to report.

use serde::{Deserialize, Serialize};

use crate::similarity::similarity;
use crate::store::{MergeSummary, RemoteMemory, SymbolStore};
use crate::symbol::{Kind, SymbolRecord};

/// Name similarity a candidate must exceed to be suggested for merging.
pub const SUGGEST_THRESHOLD: f64 = 0.6;

/// Meaning similarity another symbol must exceed to be reported as related
/// right after a learn.
pub const RELATED_THRESHOLD: f64 = 0.5;

/// Tunable thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub suggest_threshold: f64,
    pub related_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suggest_threshold: SUGGEST_THRESHOLD,
            related_threshold: RELATED_THRESHOLD,
        }
    }
}

/// What a suggestion proposes to do with the two symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    MergeWith,
}

/// A probable duplicate of the queried symbol.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Suggestion {
    pub base: String,
    pub related: String,
    pub meaning: String,
    pub action: SuggestedAction,
}

/// Module configuration produced by a sensor block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleBlock {
    #[serde(rename = "type")]
    pub module_type: String,
    pub config: String,
}

/// A symbolic block mapped onto a manifest slot.
///
/// Serializes as `{"key": ..., "value": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "key", content = "value", rename_all = "lowercase")]
pub enum InterpretedBlock {
    Modules(ModuleBlock),
    Metadata(String),
    Custom(String),
}

/// Summary of what the engine currently knows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngineState {
    pub total: usize,
    #[serde(rename = "simbolos")]
    pub symbols: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ReasoningEngine {
    store: SymbolStore,
    config: EngineConfig,
}

impl ReasoningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            store: SymbolStore::new(),
            config,
        }
    }

    pub fn store(&self) -> &SymbolStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Learn a symbol, then look for existing symbols whose meaning is
    /// close to the new one.
    ///
    /// Returns an advisory sentence naming them, if any.
    pub fn learn(&mut self, symbol: &str, meaning: &str) -> Option<String> {
        if !self.store.learn(symbol, meaning) {
            return None;
        }
        self.find_related_on_learn(symbol, meaning)
            .map(|related| format!("{symbol} podría estar relacionado con {related}"))
    }

    /// Other symbols whose meaning resembles `meaning`, as
    /// `"name (meaning), ..."`.
    pub fn find_related_on_learn(&self, symbol: &str, meaning: &str) -> Option<String> {
        let related: Vec<String> = self
            .store
            .iter()
            .filter(|(name, record)| *name != symbol && !record.meaning.is_empty())
            .filter(|(_, record)| {
                similarity(&record.meaning, meaning) > self.config.related_threshold
            })
            .map(|(name, record)| format!("{name} ({})", record.meaning))
            .collect();

        if related.is_empty() {
            None
        } else {
            Some(related.join(", "))
        }
    }

    pub fn explain(&self, symbol: &str) -> String {
        match self.store.lookup(symbol) {
            Some(record) => {
                let mut detail = format!("{symbol} significa: {}", record.meaning);
                if let Some(kind) = record.kind() {
                    detail.push_str(&format!(" (tipo: {kind})"));
                }
                detail
            }
            None => format!("No conozco el símbolo: {symbol}"),
        }
    }

    /// First other symbol, in store order, whose *name* is similar enough
    /// to `symbol` to be a merge candidate.
    ///
    /// This is the first qualifying match, not the best one.
    pub fn suggest(&self, symbol: &str) -> Option<Suggestion> {
        self.store
            .iter()
            .filter(|(name, _)| *name != symbol)
            .find(|(name, _)| similarity(symbol, name) > self.config.suggest_threshold)
            .map(|(name, record)| Suggestion {
                base: symbol.to_string(),
                related: name.to_string(),
                meaning: record.meaning.clone(),
                action: SuggestedAction::MergeWith,
            })
    }

    /// Combine a known symbol's meaning with a context and intensity into a
    /// new emergent label.
    pub fn resonate(&self, symbol: &str, intensity: f64, context: &str) -> String {
        match self.store.lookup(symbol) {
            Some(record) => {
                let combined = format!(
                    "{} @ {context} (intensidad {})",
                    record.meaning,
                    float_literal(intensity)
                );
                format!("Nueva idea simbiótica: {symbol}* ({combined})")
            }
            None => format!("No conozco el símbolo resonante: {symbol}"),
        }
    }

    /// Symbols classified as `meta`. The only rule so far; callers report
    /// each hit.
    pub fn apply_rules(&self) -> Vec<&str> {
        self.store
            .iter()
            .filter(|(_, record)| record.kind() == Some(&Kind::Meta))
            .map(|(name, _)| name)
            .collect()
    }

    /// Map a symbolic block onto a manifest slot according to the symbol's
    /// kind. Unknown symbols yield `None`.
    pub fn interpret_block(&self, symbol: &str, payload: Option<&str>) -> Option<InterpretedBlock> {
        let record = self.store.lookup(symbol)?;
        let content = payload.unwrap_or_default().trim().to_string();
        let block = match record.kind() {
            Some(Kind::Sensor) => InterpretedBlock::Modules(ModuleBlock {
                module_type: Kind::Sensor.to_string(),
                config: content,
            }),
            Some(Kind::Meta) => InterpretedBlock::Metadata(content),
            Some(Kind::Other(_)) | None => InterpretedBlock::Custom(content),
        };
        Some(block)
    }

    pub fn knows(&self, symbol: &str) -> bool {
        self.store.contains(symbol)
    }

    pub fn lookup(&self, symbol: &str) -> Option<&SymbolRecord> {
        self.store.lookup(symbol)
    }

    pub fn merge(&mut self, remote: RemoteMemory) -> MergeSummary {
        self.store.merge(remote)
    }

    pub fn tag(&mut self, symbol: &str, kind: Kind) -> bool {
        self.store.tag(symbol, kind)
    }

    pub fn seed_dictionary<I, K, V>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.store.seed_dictionary(entries)
    }

    /// Learn a node-identity fact (name, description) as a `meta` symbol.
    pub fn seed_meta(&mut self, symbol: &str, meaning: &str) -> bool {
        self.store.learn(symbol, meaning) && self.store.tag(symbol, Kind::Meta)
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            total: self.store.len(),
            symbols: self.store.names().map(str::to_string).collect(),
        }
    }
}

/// Render a float the way the orchestrator prints it: `0.5`, `2.0`,
/// `1e+16`, `1.5e-05`, `nan`, `inf`.
fn float_literal(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let repr = format!("{value:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine_with(entries: &[(&str, &str)]) -> ReasoningEngine {
        let mut engine = ReasoningEngine::new();
        for (symbol, meaning) in entries {
            engine.learn(symbol, meaning);
        }
        engine
    }

    #[test]
    fn test_learn_then_explain() {
        let mut engine = ReasoningEngine::new();
        engine.learn("🔥", "fuego");
        assert_eq!(engine.explain("🔥"), "🔥 significa: fuego");

        engine.learn("🔥", "energía");
        assert_eq!(engine.explain("🔥"), "🔥 significa: energía");
    }

    #[test]
    fn test_explain_with_kind() {
        let mut engine = engine_with(&[("🌡️", "temperatura")]);
        engine.tag("🌡️", Kind::Sensor);
        assert_eq!(engine.explain("🌡️"), "🌡️ significa: temperatura (tipo: sensor)");
    }

    #[test]
    fn test_explain_unknown() {
        let engine = ReasoningEngine::new();
        assert_eq!(engine.explain("x"), "No conozco el símbolo: x");
    }

    #[test]
    fn test_learn_reports_related_meanings() {
        let mut engine = engine_with(&[("a", "temperatura ambiente"), ("b", "zzz")]);
        let advisory = engine.learn("c", "temperatura ambiental").unwrap();
        assert_eq!(
            advisory,
            "c podría estar relacionado con a (temperatura ambiente)"
        );
    }

    #[test]
    fn test_learn_without_related_meanings() {
        let mut engine = engine_with(&[("a", "abc")]);
        assert_eq!(engine.learn("b", "xyz"), None);
        assert_eq!(engine.learn("", "abc"), None);
    }

    #[test]
    fn test_find_related_ignores_self_and_empty_meanings() {
        let mut engine = engine_with(&[("a", "luz")]);
        engine.merge(RemoteMemory::from([("sin".to_string(), SymbolRecord::default())]));

        assert_eq!(engine.find_related_on_learn("a", "luz"), None);
        assert_eq!(engine.find_related_on_learn("b", ""), None);
    }

    #[test]
    fn test_find_related_joins_all_matches() {
        let engine = engine_with(&[("a", "sensor de luz"), ("b", "sensor de luces"), ("c", "otro")]);
        assert_eq!(
            engine.find_related_on_learn("d", "sensor de luz"),
            Some("a (sensor de luz), b (sensor de luces)".to_string())
        );
    }

    #[test]
    fn test_suggest_near_identical_name() {
        let engine = engine_with(&[("colour", "hue")]);
        let suggestion = engine.suggest("color").unwrap();
        assert_eq!(suggestion.base, "color");
        assert_eq!(suggestion.related, "colour");
        assert_eq!(suggestion.meaning, "hue");
        assert_eq!(suggestion.action, SuggestedAction::MergeWith);
    }

    #[test]
    fn test_suggest_nothing_below_threshold() {
        let engine = engine_with(&[("abc", "x"), ("color", "y")]);
        assert_eq!(engine.suggest("xyz"), None);
        // the symbol itself is never its own suggestion
        assert_eq!(engine.suggest("color"), None);
    }

    #[test]
    fn test_suggest_compares_names_not_meanings() {
        let engine = engine_with(&[("qqq", "color")]);
        assert_eq!(engine.suggest("color"), None);
    }

    #[test]
    fn test_suggest_returns_first_match_not_best() {
        // against "colr": "colo" scores 0.75, "color" about 0.89; "colo"
        // comes first in store order and wins.
        let engine = engine_with(&[("colo", "a"), ("color", "b")]);
        let suggestion = engine.suggest("colr").unwrap();
        assert_eq!(suggestion.related, "colo");
    }

    #[test]
    fn test_suggest_threshold_is_configurable() {
        let mut engine = ReasoningEngine::with_config(EngineConfig {
            suggest_threshold: 0.95,
            ..EngineConfig::default()
        });
        engine.learn("colour", "hue");
        assert_eq!(engine.suggest("color"), None);
    }

    #[test]
    fn test_suggestion_wire_shape() {
        let engine = engine_with(&[("colour", "hue")]);
        let value = serde_json::to_value(engine.suggest("color").unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"base": "color", "related": "colour", "meaning": "hue", "action": "merge_with"})
        );
    }

    #[test]
    fn test_resonate_known_symbol() {
        let engine = engine_with(&[("🌊", "ola")]);
        assert_eq!(
            engine.resonate("🌊", 0.8, "playa"),
            "Nueva idea simbiótica: 🌊* (ola @ playa (intensidad 0.8))"
        );
        assert_eq!(
            engine.resonate("🌊", 2.0, ""),
            "Nueva idea simbiótica: 🌊* (ola @  (intensidad 2.0))"
        );
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(0.5), "0.5");
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(1e15), "1000000000000000.0");
        assert_eq!(float_literal(1e16), "1e+16");
        assert_eq!(float_literal(-2.5e20), "-2.5e+20");
        assert_eq!(float_literal(0.0001), "0.0001");
        assert_eq!(float_literal(1.5e-5), "1.5e-05");
        assert_eq!(float_literal(1e-300), "1e-300");
        assert_eq!(float_literal(f64::NAN), "nan");
        assert_eq!(float_literal(f64::INFINITY), "inf");
        assert_eq!(float_literal(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_resonate_large_intensity() {
        let mut engine = ReasoningEngine::new();
        engine.learn("🌊", "ola");
        assert_eq!(
            engine.resonate("🌊", 1e16, "mar"),
            "Nueva idea simbiótica: 🌊* (ola @ mar (intensidad 1e+16))"
        );
    }

    #[test]
    fn test_resonate_unknown_symbol() {
        let engine = ReasoningEngine::new();
        assert_eq!(
            engine.resonate("?", 0.5, "x"),
            "No conozco el símbolo resonante: ?"
        );
    }

    #[test]
    fn test_apply_rules_lists_meta_symbols() {
        let mut engine = engine_with(&[("a", "1"), ("b", "2")]);
        engine.tag("b", Kind::Meta);
        engine.tag("c", Kind::Sensor);
        engine.seed_meta("nombre", "nodo demo");
        assert_eq!(engine.apply_rules(), vec!["b", "nombre"]);
    }

    #[test]
    fn test_interpret_sensor_block() {
        let mut engine = engine_with(&[("📡", "radio")]);
        engine.tag("📡", Kind::Sensor);

        let block = engine.interpret_block("📡", Some("  baud=9600  ")).unwrap();
        assert_eq!(
            block,
            InterpretedBlock::Modules(ModuleBlock {
                module_type: "sensor".into(),
                config: "baud=9600".into(),
            })
        );
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"key": "modules", "value": {"type": "sensor", "config": "baud=9600"}})
        );
    }

    #[test]
    fn test_interpret_meta_and_custom_blocks() {
        let mut engine = engine_with(&[("📝", "nota"), ("🎨", "arte"), ("❓", "duda")]);
        engine.tag("📝", Kind::Meta);
        engine.tag("🎨", Kind::Other("module".into()));

        assert_eq!(
            engine.interpret_block("📝", Some("\nmi nodo\n")),
            Some(InterpretedBlock::Metadata("mi nodo".into()))
        );
        assert_eq!(
            engine.interpret_block("🎨", Some(" x ")),
            Some(InterpretedBlock::Custom("x".into()))
        );
        assert_eq!(
            engine.interpret_block("❓", None),
            Some(InterpretedBlock::Custom(String::new()))
        );
        assert_eq!(
            serde_json::to_value(engine.interpret_block("📝", Some("v")).unwrap()).unwrap(),
            json!({"key": "metadata", "value": "v"})
        );
    }

    #[test]
    fn test_interpret_unknown_symbol() {
        let engine = ReasoningEngine::new();
        assert_eq!(engine.interpret_block("nada", Some("x")), None);
    }

    #[test]
    fn test_state_lists_symbols() {
        let engine = engine_with(&[("b", "2"), ("a", "1")]);
        let state = engine.state();
        assert_eq!(state.total, 2);
        assert_eq!(state.symbols, vec!["a", "b"]);
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"total": 2, "simbolos": ["a", "b"]})
        );
    }

    #[test]
    fn test_seed_meta() {
        let mut engine = ReasoningEngine::new();
        assert!(engine.seed_meta("descripción", "un nodo"));
        assert!(!engine.seed_meta("", "x"));
        let record = engine.lookup("descripción").unwrap();
        assert_eq!(record.kind(), Some(&Kind::Meta));
        assert_eq!(record.history, vec!["un nodo"]);
    }
}
