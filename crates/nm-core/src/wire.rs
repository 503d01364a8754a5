//! JSON exchange of whole memories with the orchestrator.
//!
//! A memory is an object keyed by symbol name whose values use the record
//! shape in [`crate::symbol`]. Remote memories may carry partial records;
//! every field is optional.

use serde_json::Value;

use crate::store::{RemoteMemory, SymbolStore};

/// Decode a remote memory from an already-parsed JSON value.
/// `null` is an empty memory.
pub fn parse_remote(value: Value) -> serde_json::Result<RemoteMemory> {
    if value.is_null() {
        return Ok(RemoteMemory::new());
    }
    serde_json::from_value(value)
}

/// Decode a remote memory from JSON text.
pub fn import_json(json: &str) -> serde_json::Result<RemoteMemory> {
    parse_remote(serde_json::from_str(json)?)
}

/// The whole store as a JSON value.
pub fn export_value(store: &SymbolStore) -> serde_json::Result<Value> {
    serde_json::to_value(store.as_map())
}

/// The whole store as pretty-printed JSON text.
pub fn export_json(store: &SymbolStore) -> serde_json::Result<String> {
    serde_json::to_string_pretty(store.as_map())
}
