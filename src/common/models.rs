use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed cell value read from a design value or a chemical quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[allow(
    clippy::cast_precision_loss,
    reason = "integer cells compare with float cells on the same numeric scale"
)]
impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(x) => Some(*x),
            FieldValue::Bool(_) | FieldValue::Str(_) => None,
        }
    }

    /// Key used to compare values for grouping, `Float` has no `Eq`
    pub fn group_key(&self) -> String {
        match self {
            FieldValue::Bool(b) => format!("b:{b}"),
            FieldValue::Int(i) => format!("n:{}", *i as f64),
            FieldValue::Float(x) => format!("n:{x}"),
            FieldValue::Str(s) => format!("s:{s}"),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

/// Numeric equality with a relative tolerance, for values that went through text
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}
