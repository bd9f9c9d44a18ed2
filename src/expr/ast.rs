//! AST node types for the common-subset expression language.
//!
//! Parsing is pure and deterministic: identical input always yields a
//! structurally identical tree. N-ary operator chains produced by the splitter
//! are collapsed into left-folded binary chains before they reach consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A literal value hidden during compilation and resolved at unwrap time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Str(s) => Value::String(s.clone()),
            Literal::Num(n) => Value::Number(*n),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
        }
    }
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    /// Paren-derived grouping; transparent except where it signals a call.
    Group(Box<Expr>),
    /// Bracket-derived member/index access.
    Index { target: Box<Expr>, key: Box<Expr> },
    /// Dot access (and `a["name"]` where the key is a plain identifier).
    Member { target: Box<Expr>, name: String },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Unary { op: String, operand: Box<Expr> },
    Binary { op: String, left: Box<Expr>, right: Box<Expr> },
}

impl Expr {
    pub fn identifier(name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    pub fn number(n: f64) -> Expr {
        Expr::Literal(Literal::Num(n))
    }

    pub fn string(s: &str) -> Expr {
        Expr::Literal(Literal::Str(s.to_string()))
    }

    /// Render the `[op, a, b, ...]` notation; handy in snapshots and debugging.
    pub fn lispy(&self) -> String {
        match self {
            Expr::Literal(Literal::Str(s)) => format!("{:?}", s),
            Expr::Literal(Literal::Num(n)) => Value::Number(*n).render(),
            Expr::Literal(Literal::Bool(b)) => b.to_string(),
            Expr::Literal(Literal::Null) => "null".to_string(),
            Expr::Identifier(name) => name.clone(),
            Expr::Group(inner) => format!("(group {})", inner.lispy()),
            Expr::Index { target, key } => format!("([] {} {})", target.lispy(), key.lispy()),
            Expr::Member { target, name } => format!("(. {} {})", target.lispy(), name),
            Expr::Call { callee, args } => {
                let mut out = format!("(call {}", callee.lispy());
                for arg in args {
                    out.push(' ');
                    out.push_str(&arg.lispy());
                }
                out.push(')');
                out
            }
            Expr::Unary { op, operand } => format!("({} {})", op, operand.lispy()),
            Expr::Binary { op, left, right } => {
                format!("({} {} {})", op, left.lispy(), right.lispy())
            }
        }
    }

    /// Binding rank of this node for source rendering. Tighter nodes return
    /// higher ranks; atoms and postfix forms are effectively unsplittable.
    fn render_rank(&self) -> usize {
        match self {
            Expr::Binary { op, .. } => super::table::canonical_rank(op).unwrap_or(usize::MAX - 1),
            Expr::Unary { .. } => usize::MAX - 1,
            _ => usize::MAX,
        }
    }
}

fn write_operand(
    f: &mut fmt::Formatter<'_>,
    operand: &Expr,
    parent_rank: usize,
    is_right: bool,
) -> fmt::Result {
    let rank = operand.render_rank();
    let parens = rank < parent_rank || (rank == parent_rank && is_right);
    if parens {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

/// Minimal-paren infix source rendering. Re-parsing the rendered text yields a
/// structurally equal tree for parser-produced ASTs.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Str(s)) => write!(f, "\"{}\"", s),
            Expr::Literal(Literal::Num(n)) => write!(f, "{}", Value::Number(*n).render()),
            Expr::Literal(Literal::Bool(b)) => write!(f, "{}", b),
            Expr::Literal(Literal::Null) => write!(f, "null"),
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Group(inner) => write!(f, "({})", inner),
            Expr::Index { target, key } => write!(f, "{}[{}]", target, key),
            Expr::Member { target, name } => write!(f, "{}.{}", target, name),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Unary { op, operand } => {
                // Atoms, postfix forms, and prefix chains bind tighter than
                // any binary operator.
                if operand.render_rank() >= usize::MAX - 1 {
                    write!(f, "{}{}", op, operand)
                } else {
                    write!(f, "{}({})", op, operand)
                }
            }
            Expr::Binary { op, left, right } => {
                let rank = self.render_rank();
                write_operand(f, left, rank, false)?;
                if op == "," {
                    write!(f, ", ")?;
                } else if op == "in" {
                    write!(f, " in ")?;
                } else {
                    write!(f, " {} ", op)?;
                }
                write_operand(f, right, rank, true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(op: &str, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op: op.to_string(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_display_precedence_parens() {
        // 1 + 2 * 3 needs no parens
        let tight_right = binary(
            "+",
            Expr::number(1.0),
            binary("*", Expr::number(2.0), Expr::number(3.0)),
        );
        assert_eq!(tight_right.to_string(), "1 + 2 * 3");

        // (1 + 2) * 3 parenthesizes the looser left operand
        let loose_left = binary(
            "*",
            binary("+", Expr::number(1.0), Expr::number(2.0)),
            Expr::number(3.0),
        );
        assert_eq!(loose_left.to_string(), "(1 + 2) * 3");
    }

    #[test]
    fn test_display_left_associative_right_operand() {
        // a - (b - c): equal precedence on the right needs parens
        let expr = binary(
            "-",
            Expr::identifier("a"),
            binary("-", Expr::identifier("b"), Expr::identifier("c")),
        );
        assert_eq!(expr.to_string(), "a - (b - c)");
    }

    #[test]
    fn test_lispy_member_chain() {
        let expr = Expr::Member {
            target: Box::new(Expr::Member {
                target: Box::new(Expr::identifier("a")),
                name: "b".to_string(),
            }),
            name: "c".to_string(),
        };
        assert_eq!(expr.lispy(), "(. (. a b) c)");
        assert_eq!(expr.to_string(), "a.b.c");
    }
}
