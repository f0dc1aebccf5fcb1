//! Typed extraction of literal arguments from parsed child nodes.
//!
//! Operators call these from `process_children`; every failure is an
//! argument error naming the offending parameter.

use crate::core::ParsedNode;
use crate::error::{MapAlgebraError, Result};

pub fn require_min_children(children: &[ParsedNode], min: usize, usage: &str) -> Result<()> {
    if children.len() < min {
        return Err(MapAlgebraError::argument(format!("Usage: {}", usage)));
    }
    Ok(())
}

pub fn require_children(children: &[ParsedNode], count: usize, message: impl FnOnce() -> String) -> Result<()> {
    if children.len() != count {
        return Err(MapAlgebraError::argument(message()));
    }
    Ok(())
}

pub fn parse_child_string(child: &ParsedNode, name: &str) -> Result<String> {
    match child {
        ParsedNode::Str(value) => Ok(value.clone()),
        other => Err(MapAlgebraError::argument(format!(
            "{} must be a string literal, found {} {}",
            name,
            other.kind(),
            other
        ))),
    }
}

/// Accepts number literals and strings holding a number.
pub fn parse_child_f64(child: &ParsedNode, name: &str) -> Result<f64> {
    match child {
        ParsedNode::Number(value) => Ok(*value),
        ParsedNode::Str(text) => text.trim().parse::<f64>().map_err(|_| {
            MapAlgebraError::argument(format!("{} must be a number, found \"{}\"", name, text))
        }),
        other => Err(MapAlgebraError::argument(format!(
            "{} must be a number, found {} {}",
            name,
            other.kind(),
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_child_f64_accepts_numeric_string() {
        assert_eq!(parse_child_f64(&ParsedNode::string(" 2.5 "), "sigma").unwrap(), 2.5);
        assert_eq!(parse_child_f64(&ParsedNode::Number(-1.0), "min").unwrap(), -1.0);
    }

    #[test]
    fn test_parse_child_f64_rejects_raster() {
        let err = parse_child_f64(&ParsedNode::raster("dem"), "sigma").unwrap_err();
        assert!(err.to_string().contains("sigma must be a number"));
    }

    #[test]
    fn test_parse_child_string_rejects_number() {
        let err = parse_child_string(&ParsedNode::Number(3.0), "method").unwrap_err();
        assert!(matches!(err, MapAlgebraError::Argument(_)));
    }

    #[test]
    fn test_require_min_children() {
        let children = vec![ParsedNode::string("a")];
        assert!(require_min_children(&children, 1, "f(<a>)").is_ok());
        let err = require_min_children(&children, 2, "f(<a>, <b>)").unwrap_err();
        assert_eq!(err.to_string(), "Usage: f(<a>, <b>)");
    }
}
