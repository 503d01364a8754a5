//! Symbol records: the unit of knowledge held by the store.
//!
//! The serialized form keeps the field names the orchestrator already
//! speaks (`significado`, `relaciones`, `historial`, ...). English names are
//! accepted as aliases when decoding.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Free-form classification tag for a symbol.
///
/// `Sensor` and `Meta` drive dispatch in the engine; anything else is kept
/// verbatim in `Other` and handled by the default branch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Sensor,
    Meta,
    Other(String),
}

impl Kind {
    /// Parse a wire tag. The empty string means "no kind".
    pub fn parse(tag: &str) -> Option<Kind> {
        match tag {
            "" => None,
            "sensor" => Some(Kind::Sensor),
            "meta" => Some(Kind::Meta),
            other => Some(Kind::Other(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Kind::Sensor => "sensor",
            Kind::Meta => "meta",
            Kind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn deserialize_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Kind>, D::Error> {
    let tag = Option::<String>::deserialize(deserializer)?;
    Ok(tag.as_deref().and_then(Kind::parse))
}

/// Relations of a symbol to other vocabulary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relations {
    #[serde(rename = "sinónimos", alias = "sinonimos", alias = "synonyms", default)]
    pub synonyms: BTreeSet<String>,
    #[serde(rename = "aplicaciones", alias = "applications", default)]
    pub applications: BTreeSet<String>,
    #[serde(
        rename = "tipo",
        alias = "kind",
        default,
        deserialize_with = "deserialize_kind"
    )]
    pub kind: Option<Kind>,
}

/// Everything known about one symbol.
///
/// Also used as the partial record of a remote memory during merge: every
/// field defaults, and an empty `meaning` reads as "not supplied".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Current canonical meaning (most recent learn).
    #[serde(rename = "significado", alias = "meaning", default)]
    pub meaning: String,
    #[serde(rename = "relaciones", alias = "relations", default)]
    pub relations: Relations,
    /// Every meaning ever assigned, oldest first.
    #[serde(rename = "historial", alias = "history", default)]
    pub history: Vec<String>,
}

impl SymbolRecord {
    /// A record whose history already holds its meaning.
    pub fn with_meaning(meaning: &str) -> Self {
        Self {
            meaning: meaning.to_string(),
            relations: Relations::default(),
            history: vec![meaning.to_string()],
        }
    }

    pub fn kind(&self) -> Option<&Kind> {
        self.relations.kind.as_ref()
    }
}
