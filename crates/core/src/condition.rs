//! The `problem_if` condition language.
//!
//! A condition is a single comparison between the runtime attribute value
//! (written `x`) and a signed integer constant, in one of exactly two forms:
//!
//! ```text
//! x >= 5      value on the left
//! 5 >= x      value on the right
//! ```
//!
//! with operators `>=`, `<=`, `==`, `>`, `<`, `!=` (and `=` as an alias for
//! `==`). Whitespace is ignored. Anything else is rejected at parse time,
//! before any device is constructed. Conditions are data, never code.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Comparison operators accepted by the condition grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Operator {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            // `=` is accepted as an alias for `==`.
            "==" | "=" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            _ => None,
        }
    }

    fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
        };
        f.write_str(s)
    }
}

/// Which side of the operator the runtime value (`x`) appeared on in the
/// original condition text. Preserved so that `5 < x` keeps its semantic
/// reading ("problem when x is greater than 5") rather than being flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSide {
    ValueOnLeft,
    ValueOnRight,
}

/// Errors from [`ConditionExpression::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    /// The text matches neither `x OP N` nor `N OP x`.
    #[error("\"{0}\" is not of the form \"x <op> N\" or \"N <op> x\"")]
    InvalidGrammar(String),
}

/// A compiled `problem_if` condition.
///
/// Evaluation is a pure function of the attribute value; a `true` result
/// means "this value is a problem".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionExpression {
    op: Operator,
    operand: i64,
    side: OperandSide,
}

/// Matches `x OP N` with all whitespace already stripped.
fn value_left_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^x(>=|<=|==|!=|>|<|=)(-?\d+)$").expect("pattern is valid")
    })
}

/// Matches `N OP x` with all whitespace already stripped.
fn value_right_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(-?\d+)(>=|<=|==|!=|>|<|=)x$").expect("pattern is valid")
    })
}

impl ConditionExpression {
    /// Parse a condition text into its compiled form.
    ///
    /// Whitespace-insensitive; tries `x OP N` first, then `N OP x`.
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let stripped: String = text.chars().filter(|c| !c.is_whitespace()).collect();

        let invalid = || ConditionError::InvalidGrammar(text.to_string());

        if let Some(caps) = value_left_pattern().captures(&stripped) {
            let op = Operator::from_token(&caps[1]).ok_or_else(invalid)?;
            let operand: i64 = caps[2].parse().map_err(|_| invalid())?;
            return Ok(Self {
                op,
                operand,
                side: OperandSide::ValueOnLeft,
            });
        }

        if let Some(caps) = value_right_pattern().captures(&stripped) {
            let op = Operator::from_token(&caps[2]).ok_or_else(invalid)?;
            let operand: i64 = caps[1].parse().map_err(|_| invalid())?;
            return Ok(Self {
                op,
                operand,
                side: OperandSide::ValueOnRight,
            });
        }

        Err(invalid())
    }

    /// Evaluate the condition against a runtime attribute value.
    ///
    /// Returns `true` when the value is a problem. Total for any `i64`.
    pub fn is_problem(&self, value: i64) -> bool {
        match self.side {
            OperandSide::ValueOnLeft => self.op.apply(value, self.operand),
            OperandSide::ValueOnRight => self.op.apply(self.operand, value),
        }
    }
}

impl fmt::Display for ConditionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            OperandSide::ValueOnLeft => write!(f, "x {} {}", self.op, self.operand),
            OperandSide::ValueOnRight => write!(f, "{} {} x", self.operand, self.op),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
