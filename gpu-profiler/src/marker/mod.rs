//! Structured framework markers
//!
//! The framework instrumentation annotates every intercepted call with a
//! marker naming the operation, the module/class it belongs to and the call
//! arguments. Those three fields are the whole contract: anything else in the
//! marker is a fault in the instrumentation and rejects the record.

pub mod literal;

use kernscope_shared::RawFrameworkMarker;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use literal::{parse_literal, LiteralError};

const OP: &str = "op";
const MODULE: &str = "mod";
const ARGS: &str = "args";

/// Why a framework marker was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkerError {
    #[error("marker text is not a plain literal ({0})")]
    Syntax(#[from] LiteralError),

    #[error("marker is not a dictionary")]
    NotADictionary,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unexpected field `{0}`")]
    UnexpectedField(String),

    #[error("field `{0}` must be a string")]
    NotAString(&'static str),
}

/// A validated framework marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkMarker {
    pub op: String,
    #[serde(rename = "mod")]
    pub module: String,
    pub args: Value,
}

impl FrameworkMarker {
    /// Parse and validate one raw marker
    pub fn parse(raw: &RawFrameworkMarker) -> Result<Self, MarkerError> {
        match raw {
            RawFrameworkMarker::Literal(text) => match parse_literal(text)? {
                Value::Object(map) => Self::from_fields(map),
                _ => Err(MarkerError::NotADictionary),
            },
            RawFrameworkMarker::Object(map) => Self::from_fields(map.clone()),
        }
    }

    fn from_fields(mut map: Map<String, Value>) -> Result<Self, MarkerError> {
        let op = take_string(&mut map, OP)?;
        let module = take_string(&mut map, MODULE)?;
        let args = map.remove(ARGS).ok_or(MarkerError::MissingField(ARGS))?;

        if let Some(extra) = map.keys().next() {
            return Err(MarkerError::UnexpectedField(extra.clone()));
        }

        Ok(Self { op, module, args })
    }
}

fn take_string(map: &mut Map<String, Value>, field: &'static str) -> Result<String, MarkerError> {
    match map.remove(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(MarkerError::NotAString(field)),
        None => Err(MarkerError::MissingField(field)),
    }
}
