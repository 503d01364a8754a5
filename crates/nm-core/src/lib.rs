//! NodeMind symbolic memory and resonance engine.
//!
//! Keeps a growable dictionary of symbols (meanings, relations, history),
//! reconciles it with remote memories, scores fuzzy similarity between
//! symbols and text, and extracts intents from free text with keyword
//! heuristics.
//!
//! Zero I/O: transport, logging and persistence belong to the caller.

pub mod engine;
pub mod intent;
pub mod similarity;
pub mod store;
pub mod symbol;
pub mod wire;

pub use engine::{
    EngineConfig, EngineState, InterpretedBlock, ModuleBlock, RELATED_THRESHOLD,
    ReasoningEngine, SUGGEST_THRESHOLD, SuggestedAction, Suggestion,
};
pub use intent::{Intent, IntentResult, extract_tokens, understand};
pub use similarity::similarity;
pub use store::{MergeSummary, RemoteMemory, SymbolStore};
pub use symbol::{Kind, Relations, SymbolRecord};
pub use wire::{export_json, export_value, import_json, parse_remote};
