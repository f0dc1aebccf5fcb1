use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic syntax node as produced by the expression parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsedNode {
    /// Quoted string literal.
    Str(String),
    Number(f64),
    /// Reference to an existing pyramid, written `[name]`.
    Raster(String),
    Function {
        name: String,
        children: Vec<ParsedNode>,
    },
}

impl ParsedNode {
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn raster(name: impl Into<String>) -> Self {
        Self::Raster(name.into())
    }

    pub fn function(name: impl Into<String>, children: Vec<ParsedNode>) -> Self {
        Self::Function {
            name: name.into(),
            children,
        }
    }

    /// Short label for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string literal",
            Self::Number(_) => "number literal",
            Self::Raster(_) => "raster reference",
            Self::Function { .. } => "function call",
        }
    }
}

impl fmt::Display for ParsedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{}\"", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Raster(name) => write!(f, "[{}]", name),
            Self::Function { name, children } => {
                write!(f, "{}(", name)?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
