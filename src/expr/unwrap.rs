//! Placeholder resolution: fragments plus side tables become the final tree.
//!
//! `#v<i>` tokens resolve to literals, `#g<i>` to groups (a call when a callee
//! precedes them), `#p<i>` to index/member access on their preceding prefix.
//! N-ary operator fragments left-fold into binary chains, and `.` fragments
//! fold into member chains.

use super::ast::{Expr, Literal};
use super::error::ParseError;
use super::hide::{GroupCapture, Hidden};
use super::split::{split, Fragment};
use super::table::OperatorTable;

pub(crate) struct Unwrapper<'a> {
    table: &'a OperatorTable,
    literals: &'a [Literal],
    groups: &'a [GroupCapture],
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_char),
        _ => false,
    }
}

/// Split `#g12...`/`#p12...`/`#v12...` into tag, table index, and the rest.
fn placeholder(text: &str) -> Option<(char, usize, &str)> {
    let rest = text.strip_prefix('#')?;
    let mut chars = rest.chars();
    let tag = chars.next()?;
    if !matches!(tag, 'v' | 'g' | 'p') {
        return None;
    }
    let digits: String = chars.clone().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let index = digits.parse().ok()?;
    Some((tag, index, &rest[tag.len_utf8() + digits.len()..]))
}

impl<'a> Unwrapper<'a> {
    pub fn new(table: &'a OperatorTable, hidden: &'a Hidden) -> Self {
        Unwrapper {
            table,
            literals: &hidden.literals,
            groups: &hidden.groups,
        }
    }

    pub fn unwrap(&self, fragment: Fragment) -> Result<Expr, ParseError> {
        match fragment {
            Fragment::Leaf(text) => self.parse_atom(&text),
            Fragment::Branch { rank, operands } => {
                let symbol = self.table.binary()[rank].symbol;
                if symbol == "." {
                    return self.fold_member(operands);
                }
                for operand in &operands {
                    if matches!(operand, Fragment::Leaf(t) if t.is_empty()) {
                        return Err(ParseError::DanglingOperator {
                            operator: symbol.to_string(),
                        });
                    }
                }
                let mut iter = operands.into_iter();
                let first = iter.next().ok_or(ParseError::Empty)?;
                let mut acc = self.unwrap(first)?;
                for operand in iter {
                    acc = Expr::Binary {
                        op: symbol.to_string(),
                        left: Box::new(acc),
                        right: Box::new(self.unwrap(operand)?),
                    };
                }
                Ok(acc)
            }
        }
    }

    /// Recursively parse already-masked group content.
    fn parse_masked(&self, masked: &str) -> Result<Expr, ParseError> {
        if masked.is_empty() {
            return Err(ParseError::Empty);
        }
        self.unwrap(split(masked.to_string(), self.table))
    }

    /// Parse call arguments from masked group content: commas at the top
    /// level separate arguments, and an empty group is an empty list.
    fn parse_args(&self, masked: &str) -> Result<Vec<Expr>, ParseError> {
        if masked.is_empty() {
            return Ok(Vec::new());
        }
        let fragment = split(masked.to_string(), self.table);
        let operands = match fragment {
            Fragment::Branch { rank, operands } if self.table.binary()[rank].symbol == "," => {
                operands
            }
            other => vec![other],
        };
        operands
            .into_iter()
            .map(|operand| {
                if matches!(&operand, Fragment::Leaf(t) if t.is_empty()) {
                    return Err(ParseError::DanglingOperator {
                        operator: ",".to_string(),
                    });
                }
                self.unwrap(operand)
            })
            .collect()
    }

    fn parse_atom(&self, text: &str) -> Result<Expr, ParseError> {
        if text.is_empty() {
            return Err(ParseError::Empty);
        }
        let first = text.chars().next().unwrap_or_default();
        if self.table.prefix_operator(&first.to_string()).is_some() {
            let rest = &text[first.len_utf8()..];
            if rest.is_empty() {
                return Err(ParseError::DanglingOperator {
                    operator: first.to_string(),
                });
            }
            return Ok(Expr::Unary {
                op: first.to_string(),
                operand: Box::new(self.parse_atom(rest)?),
            });
        }
        let (expr, rest) = self.parse_primary(text)?;
        self.apply_postfixes(expr, rest, text)
    }

    fn parse_primary<'t>(&self, text: &'t str) -> Result<(Expr, &'t str), ParseError> {
        if let Some((tag, index, rest)) = placeholder(text) {
            return match tag {
                'v' => Ok((Expr::Literal(self.literal_value(index, text)?), rest)),
                'g' => {
                    let inner = self.group_inner(index, text)?;
                    Ok((Expr::Group(Box::new(self.parse_masked(inner)?)), rest))
                }
                // A bracket group needs a preceding target.
                _ => Err(ParseError::InvalidAtom {
                    text: text.to_string(),
                }),
            };
        }
        let first = text.chars().next().unwrap_or_default();
        if !is_identifier_start(first) {
            return Err(ParseError::InvalidAtom {
                text: text.to_string(),
            });
        }
        let end = text
            .char_indices()
            .find(|(_, c)| !is_identifier_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        Ok((Expr::Identifier(text[..end].to_string()), &text[end..]))
    }

    /// Apply trailing `#g`/`#p` placeholders as call and index/member access.
    fn apply_postfixes(
        &self,
        mut expr: Expr,
        mut rest: &str,
        whole: &str,
    ) -> Result<Expr, ParseError> {
        while !rest.is_empty() {
            let Some((tag, index, after)) = placeholder(rest) else {
                return Err(ParseError::InvalidAtom {
                    text: whole.to_string(),
                });
            };
            match tag {
                'g' => {
                    let inner = self.group_inner(index, whole)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args: self.parse_args(inner)?,
                    };
                }
                'p' => {
                    let inner = self.group_inner(index, whole)?;
                    if inner.is_empty() {
                        return Err(ParseError::Empty);
                    }
                    let key = self.parse_masked(inner)?;
                    expr = match key {
                        // `a["name"]` mirrors dot semantics.
                        Expr::Literal(Literal::Str(name)) if is_identifier(&name) => Expr::Member {
                            target: Box::new(expr),
                            name,
                        },
                        key => Expr::Index {
                            target: Box::new(expr),
                            key: Box::new(key),
                        },
                    };
                }
                _ => {
                    return Err(ParseError::InvalidAtom {
                        text: whole.to_string(),
                    })
                }
            }
            rest = after;
        }
        Ok(expr)
    }

    /// Left-fold a `.` fragment into member access. Each operand after the
    /// first must be a plain identifier, optionally followed by call/index
    /// placeholders that apply to the folded target.
    fn fold_member(&self, operands: Vec<Fragment>) -> Result<Expr, ParseError> {
        let mut iter = operands.into_iter();
        let first = match iter.next() {
            Some(Fragment::Leaf(text)) => text,
            _ => return Err(ParseError::Empty),
        };
        if first.is_empty() {
            return Err(ParseError::DanglingOperator {
                operator: ".".to_string(),
            });
        }
        let mut acc = self.parse_atom(&first)?;
        for operand in iter {
            let Fragment::Leaf(text) = operand else {
                return Err(ParseError::InvalidAtom {
                    text: ".".to_string(),
                });
            };
            if text.is_empty() {
                return Err(ParseError::DanglingOperator {
                    operator: ".".to_string(),
                });
            }
            let (name, rest) = match self.parse_primary(&text)? {
                (Expr::Identifier(name), rest) => (name, rest),
                _ => {
                    return Err(ParseError::InvalidAtom { text: text.clone() });
                }
            };
            acc = Expr::Member {
                target: Box::new(acc),
                name,
            };
            acc = self.apply_postfixes(acc, rest, &text)?;
        }
        Ok(acc)
    }

    fn literal_value(&self, index: usize, context: &str) -> Result<Literal, ParseError> {
        let literal = self
            .literals
            .get(index)
            .ok_or_else(|| ParseError::InvalidAtom {
                text: context.to_string(),
            })?;
        Ok(match literal {
            // The hide table keeps string literals verbatim with quotes;
            // the final tree carries the unquoted value.
            Literal::Str(raw) => Literal::Str(raw[1..raw.len() - 1].to_string()),
            other => other.clone(),
        })
    }

    fn group_inner(&self, index: usize, context: &str) -> Result<&'a str, ParseError> {
        self.groups
            .get(index)
            .map(|g| g.inner.as_str())
            .ok_or_else(|| ParseError::InvalidAtom {
                text: context.to_string(),
            })
    }
}
