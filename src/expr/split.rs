//! Precedence splitting over the placeholder-safe string.
//!
//! For each binary operator row, in table order, every occurrence in the
//! current top-level string (and recursively in every already-produced node)
//! splits simultaneously left-to-right into an n-ary fragment. Operators found
//! in earlier, lower-precedence passes therefore always sit above operators
//! found later: correct precedence without grammar productions. N-ary chains
//! collapse to a left fold at unwrap time.

use super::hide::IN_TOKEN;
use super::table::{Operator, OperatorTable};

/// Intermediate n-ary structure between splitting and unwrapping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fragment {
    Leaf(String),
    /// `rank` indexes the table's binary rows.
    Branch { rank: usize, operands: Vec<Fragment> },
}

/// Run every binary operator pass over the masked source.
pub(crate) fn split(masked: String, table: &OperatorTable) -> Fragment {
    let mut fragment = Fragment::Leaf(masked);
    for (rank, operator) in table.binary().iter().enumerate() {
        fragment = split_rank(fragment, rank, operator, table);
    }
    fragment
}

fn split_rank(fragment: Fragment, rank: usize, operator: &Operator, table: &OperatorTable) -> Fragment {
    match fragment {
        Fragment::Branch { rank: r, operands } => Fragment::Branch {
            rank: r,
            operands: operands
                .into_iter()
                .map(|operand| split_rank(operand, rank, operator, table))
                .collect(),
        },
        Fragment::Leaf(text) => {
            let positions = find_splits(&text, operator, table);
            if positions.is_empty() {
                return Fragment::Leaf(text);
            }
            let token_len = match_token(operator.symbol).len();
            let mut operands = Vec::with_capacity(positions.len() + 1);
            let mut start = 0;
            for position in positions {
                operands.push(Fragment::Leaf(text[start..position].to_string()));
                start = position + token_len;
            }
            operands.push(Fragment::Leaf(text[start..].to_string()));
            Fragment::Branch { rank, operands }
        }
    }
}

/// The substring the splitter actually matches. The hider masks the word
/// operator `in` so whitespace stripping cannot erase its boundaries.
fn match_token(symbol: &str) -> &str {
    if symbol == "in" {
        IN_TOKEN
    } else {
        symbol
    }
}

fn is_operator_char(c: char) -> bool {
    "|&^!=<>+-*/%,.".contains(c)
}

fn find_splits(text: &str, operator: &Operator, table: &OperatorTable) -> Vec<usize> {
    let token = match_token(operator.symbol);
    let mut positions = Vec::new();
    let mut i = 0;
    while i + token.len() <= text.len() {
        if !text.is_char_boundary(i) {
            i += 1;
            continue;
        }
        if text[i..].starts_with(token) && match_allowed(text, i, token, operator.symbol, table) {
            positions.push(i);
            i += token.len();
        } else {
            i += 1;
        }
    }
    positions
}

/// Reject matches that are really part of a longer operator (`>` inside `>>`,
/// `*` inside `**`) and defer prefix-position `-`/`+` to unary handling.
fn match_allowed(text: &str, at: usize, token: &str, symbol: &str, table: &OperatorTable) -> bool {
    if symbol == "in" {
        return true;
    }
    let before = text[..at].chars().next_back();
    let after = text[at + token.len()..].chars().next();

    if let Some(b) = before {
        if is_operator_char(b) && table.has_binary_symbol(&format!("{}{}", b, symbol)) {
            return false;
        }
    }
    if let Some(a) = after {
        if is_operator_char(a) && table.has_binary_symbol(&format!("{}{}", symbol, a)) {
            return false;
        }
    }
    if table.prefix_operator(symbol).is_some() {
        match before {
            None => return false,
            Some(b) if is_operator_char(b) => return false,
            _ => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(s: &str) -> Fragment {
        Fragment::Leaf(s.to_string())
    }

    fn split_canonical(masked: &str) -> Fragment {
        split(masked.to_string(), &OperatorTable::canonical())
    }

    #[test]
    fn test_looser_operator_sits_above_tighter() {
        let table = OperatorTable::canonical();
        let fragment = split_canonical("#v0+#v1*#v2");
        let Fragment::Branch { rank, operands } = fragment else {
            panic!("expected a branch");
        };
        assert_eq!(table.binary()[rank].symbol, "+");
        assert_eq!(operands[0], leaf("#v0"));
        let Fragment::Branch { rank, operands } = &operands[1] else {
            panic!("expected nested multiplication");
        };
        assert_eq!(table.binary()[*rank].symbol, "*");
        assert_eq!(operands.as_slice(), &[leaf("#v1"), leaf("#v2")]);
    }

    #[test]
    fn test_simultaneous_split_is_nary() {
        let fragment = split_canonical("a+b+c+d");
        let Fragment::Branch { operands, .. } = fragment else {
            panic!("expected a branch");
        };
        assert_eq!(
            operands,
            vec![leaf("a"), leaf("b"), leaf("c"), leaf("d")]
        );
    }

    #[test]
    fn test_shift_not_split_by_comparison() {
        let table = OperatorTable::canonical();
        let fragment = split_canonical("a>>b");
        let Fragment::Branch { rank, operands } = fragment else {
            panic!("expected a branch");
        };
        assert_eq!(table.binary()[rank].symbol, ">>");
        assert_eq!(operands, vec![leaf("a"), leaf("b")]);
    }

    #[test]
    fn test_power_not_split_by_multiplication() {
        let table = OperatorTable::canonical();
        let fragment = split_canonical("a**b");
        let Fragment::Branch { rank, .. } = fragment else {
            panic!("expected a branch");
        };
        assert_eq!(table.binary()[rank].symbol, "**");
    }

    #[test]
    fn test_prefix_minus_not_split() {
        assert_eq!(split_canonical("-a"), leaf("-a"));
        // a,-b: the comma splits, the minus stays glued to its operand
        let Fragment::Branch { operands, .. } = split_canonical("a,-b") else {
            panic!("expected a branch");
        };
        assert_eq!(operands, vec![leaf("a"), leaf("-b")]);
    }

    #[test]
    fn test_in_token_splits() {
        let table = OperatorTable::canonical();
        let Fragment::Branch { rank, operands } = split_canonical("a#in#b") else {
            panic!("expected a branch");
        };
        assert_eq!(table.binary()[rank].symbol, "in");
        assert_eq!(operands, vec![leaf("a"), leaf("b")]);
    }

    #[test]
    fn test_no_operator_passes_through() {
        assert_eq!(split_canonical("abc"), leaf("abc"));
        assert_eq!(split_canonical("#g0"), leaf("#g0"));
    }
}
