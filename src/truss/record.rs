use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One truss as exported to `truss-data/{id}.json`. Exports are loosely
/// typed (quantities may be numbers or strings), so fields stay as raw JSON
/// and are rendered with [`display_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrussRecord {
    pub truss_number: Option<Value>,
    pub job_number: Option<Value>,
    pub tipo: Option<Value>,
    pub quantidade: Option<Value>,
    pub endereco: Option<Value>,
    pub tamanho: Option<Value>,
    pub status: Option<Value>,
}

/// Text for a field, or `None` when it is missing or falsy (null, empty
/// string, `false`, zero). Strings are kept verbatim, so whitespace-only
/// values still render.
pub fn display_value(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

impl TrussRecord {
    pub fn truss_number(&self) -> Option<String> {
        display_value(&self.truss_number)
    }

    pub fn job_number(&self) -> Option<String> {
        display_value(&self.job_number)
    }

    pub fn tipo(&self) -> Option<String> {
        display_value(&self.tipo)
    }

    pub fn quantidade(&self) -> Option<String> {
        display_value(&self.quantidade)
    }

    pub fn endereco(&self) -> Option<String> {
        display_value(&self.endereco)
    }

    pub fn tamanho(&self) -> Option<String> {
        display_value(&self.tamanho)
    }

    pub fn status(&self) -> Option<String> {
        display_value(&self.status)
    }
}
