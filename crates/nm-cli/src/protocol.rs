//! Line-delimited JSON protocol spoken with the orchestrator.
//!
//! Each input line is `{"type": <command>, "payload": {...}, "id": ...}`
//! and decodes into one [`Request`] variant with typed fields. Output lines
//! are [`Response`] values of type `respuesta` or `sugerencia`, echoing the
//! request id when one was given.

use std::collections::BTreeMap;
use std::fmt;

use nm_core::{RemoteMemory, parse_remote};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Intensity used when a resonance request does not give one.
pub const DEFAULT_INTENSITY: f64 = 0.5;

#[derive(Debug)]
pub enum ProtocolError {
    Json(serde_json::Error),
    MissingField(&'static str),
    InvalidField { field: &'static str, reason: String },
    UnknownCommand(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Json(e) => write!(f, "malformed JSON: {e}"),
            ProtocolError::MissingField(field) => write!(f, "missing field `{field}`"),
            ProtocolError::InvalidField { field, reason } => {
                write!(f, "invalid field `{field}`: {reason}")
            }
            ProtocolError::UnknownCommand(command) => write!(f, "unknown message type: {command}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::Json(e)
    }
}

/// One decoded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `symbol`: learn a symbol.
    Learn { symbol: String, meaning: String },
    /// `explain`
    Explain { symbol: String },
    /// `resonance`
    Resonance {
        symbol: String,
        intensity: f64,
        context: String,
    },
    /// `suggest`
    Suggest { symbol: String },
    /// `rules`
    Rules,
    /// `fusionar_memoria`: the payload is the remote memory itself.
    MergeMemory(RemoteMemory),
    /// `interpretar_bloque`
    InterpretBlock { symbol: String, payload: String },
    /// `understand`
    Understand { text: String },
    /// `etiquetar`: set a symbol's kind.
    Tag { symbol: String, kind: String },
    /// `diccionario`: seed symbols not known yet.
    Dictionary(BTreeMap<String, String>),
    /// `comprende_bloque`: is the symbol known?
    Knows { symbol: String },
    /// `exportar_memoria`
    ExportMemory,
    /// `estado`
    State,
    /// `exit`
    Exit,
}

/// A request plus the id to echo back.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Option<Value>,
    pub request: Request,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    id: Value,
}

/// Decode one protocol line.
pub fn decode(line: &str) -> Result<Message, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(line)?;
    let kind = envelope.kind.ok_or(ProtocolError::MissingField("type"))?;
    let payload = envelope.payload;

    let request = match kind.as_str() {
        "symbol" => Request::Learn {
            symbol: required_str(&payload, "symbol")?,
            meaning: required_str(&payload, "meaning")?,
        },
        "explain" => Request::Explain {
            symbol: required_str(&payload, "symbol")?,
        },
        "resonance" => Request::Resonance {
            symbol: required_str(&payload, "symbol")?,
            intensity: intensity(&payload)?,
            context: optional_str(&payload, "contexto")?.unwrap_or_default(),
        },
        "suggest" => Request::Suggest {
            symbol: required_str(&payload, "symbol")?,
        },
        "rules" => Request::Rules,
        "fusionar_memoria" => Request::MergeMemory(parse_remote(payload).map_err(|e| {
            ProtocolError::InvalidField {
                field: "payload",
                reason: e.to_string(),
            }
        })?),
        "interpretar_bloque" => Request::InterpretBlock {
            symbol: required_str(&payload, "symbol")?,
            payload: optional_str(&payload, "payload")?.unwrap_or_default(),
        },
        "understand" => Request::Understand {
            text: required_str(&payload, "text")?,
        },
        "etiquetar" => Request::Tag {
            symbol: required_str(&payload, "symbol")?,
            kind: required_str(&payload, "tipo")?,
        },
        "diccionario" => Request::Dictionary(dictionary(payload)?),
        "comprende_bloque" => Request::Knows {
            symbol: required_str(&payload, "symbol")?,
        },
        "exportar_memoria" => Request::ExportMemory,
        "estado" => Request::State,
        "exit" => Request::Exit,
        _ => return Err(ProtocolError::UnknownCommand(kind)),
    };

    Ok(Message {
        id: echo_id(envelope.id),
        request,
    })
}

/// Ids are echoed only when present and non-empty.
fn echo_id(id: Value) -> Option<Value> {
    match id {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(other),
    }
}

fn optional_str(payload: &Value, field: &'static str) -> Result<Option<String>, ProtocolError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ProtocolError::InvalidField {
            field,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

fn required_str(payload: &Value, field: &'static str) -> Result<String, ProtocolError> {
    optional_str(payload, field)?.ok_or(ProtocolError::MissingField(field))
}

/// `intensidad` accepts a number, a numeric string or a boolean (1.0/0.0).
fn intensity(payload: &Value) -> Result<f64, ProtocolError> {
    let invalid = |reason: String| ProtocolError::InvalidField {
        field: "intensidad",
        reason,
    };
    match payload.get("intensidad") {
        None | Some(Value::Null) => Ok(DEFAULT_INTENSITY),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid(format!("{n} is not representable as a float"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(format!("{s:?}: {e}"))),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(other) => Err(invalid(format!("expected a number, got {other}"))),
    }
}

fn dictionary(payload: Value) -> Result<BTreeMap<String, String>, ProtocolError> {
    if payload.is_null() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_value(payload).map_err(|e| ProtocolError::InvalidField {
        field: "payload",
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// A definitive answer.
    Respuesta,
    /// A probabilistic suggestion.
    Sugerencia,
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl Response {
    pub fn answer(payload: impl Serialize, id: Option<Value>) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: ResponseKind::Respuesta,
            payload: serde_json::to_value(payload)?,
            id,
        })
    }

    pub fn suggestion(payload: impl Serialize, id: Option<Value>) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: ResponseKind::Sugerencia,
            payload: serde_json::to_value(payload)?,
            id,
        })
    }

    /// The response as a single protocol line (no trailing newline).
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
