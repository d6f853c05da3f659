use crate::ast::{Expression, Literal};
use crate::fir::DataKind;

/// Resolve a variable annotation keyword. Unknown keywords yield no hint.
pub fn variable_hint_kind(keyword: &str) -> Option<DataKind> {
    match keyword.to_ascii_lowercase().as_str() {
        "int" | "integer" => Some(DataKind::Integer),
        "str" | "string" => Some(DataKind::String),
        "float" | "double" => Some(DataKind::Real),
        "bool" | "boolean" => Some(DataKind::Boolean),
        _ => None,
    }
}

/// Resolve a function annotation keyword; `None` means void.
/// Unknown keywords fall back to `Integer`.
pub fn function_hint_kind(keyword: &str) -> Option<DataKind> {
    match keyword.to_ascii_lowercase().as_str() {
        "void" => None,
        "real" => Some(DataKind::Real),
        other => Some(variable_hint_kind(other).unwrap_or(DataKind::Integer)),
    }
}

/// Flowgorithm's name for a kind.
pub fn flowgorithm_type(kind: DataKind) -> &'static str {
    match kind {
        DataKind::Integer => "Integer",
        DataKind::String => "String",
        DataKind::Real => "Real",
        DataKind::Boolean => "Boolean",
    }
}

/// Return type attribute of a function; void functions are "None".
pub fn flowgorithm_return_type(kind: Option<DataKind>) -> &'static str {
    kind.map(flowgorithm_type).unwrap_or("None")
}

/// Candidate kind from a scalar value's literal type.
pub fn infer_value_kind(value: &Expression) -> DataKind {
    match value {
        Expression::Literal(Literal::Str(_)) | Expression::FormattedString(_) => DataKind::String,
        Expression::Literal(Literal::Real(_)) => DataKind::Real,
        _ => DataKind::Integer,
    }
}

/// Element kind of a list literal, taken from its first element.
pub fn infer_element_kind(elements: &[Expression]) -> DataKind {
    match elements.first() {
        Some(Expression::Literal(Literal::Str(_))) => DataKind::String,
        Some(Expression::Literal(Literal::Real(_))) => DataKind::Real,
        Some(Expression::Literal(Literal::Bool(_))) => DataKind::Boolean,
        _ => DataKind::Integer,
    }
}
