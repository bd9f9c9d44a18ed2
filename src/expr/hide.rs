//! Literal and group hiding.
//!
//! Turns raw expression text into a placeholder-safe string: quoted strings,
//! numeric literals, and the keywords `true`/`false`/`null` become `#v<i>`
//! tokens backed by a literal table, and parenthesized/bracketed substrings
//! become `#g<i>`/`#p<i>` tokens backed by a group table. The result contains
//! no characters that could false-match an operator inside a literal or group,
//! so the splitter can do naive substring matching.
//!
//! The word operator `in` is masked to `#in#` before whitespace is stripped;
//! stripping would otherwise collapse `a in b` to `ainb` and lose the token
//! boundaries.
//!
//! Group folding is a single index-based scan with an opener stack, which
//! resolves innermost groups structurally in one pass.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::Literal;
use super::error::ParseError;

/// Mask token the splitter matches for the `in` operator.
pub(crate) const IN_TOKEN: &str = "#in#";

static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"\\\n\r]*""#).unwrap());
static IN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bin\b").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:true|false|null)\b").unwrap());
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+(?:\.\d*)?(?:[eE][+\-]?\d+\b)?").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delim {
    Paren,
    Bracket,
}

#[derive(Debug, Clone)]
pub(crate) struct GroupCapture {
    pub delim: Delim,
    pub inner: String,
}

/// Placeholder-safe source plus the side tables resolving its placeholders.
#[derive(Debug, Clone)]
pub(crate) struct Hidden {
    pub masked: String,
    /// Literal table; string entries keep their source text verbatim,
    /// including the surrounding quotes. Literals are hidden once and never
    /// re-parsed.
    pub literals: Vec<Literal>,
    pub groups: Vec<GroupCapture>,
}

/// Hide literals and fold groups.
pub(crate) fn hide(source: &str) -> Result<Hidden, ParseError> {
    let mut literals: Vec<Literal> = Vec::new();

    let masked = STRING_RE.replace_all(source, |caps: &regex::Captures| {
        let token = format!("#v{}", literals.len());
        literals.push(Literal::Str(caps[0].to_string()));
        token
    });
    let masked = IN_RE.replace_all(&masked, IN_TOKEN);
    let masked = WHITESPACE_RE.replace_all(&masked, "");
    let masked = KEYWORD_RE.replace_all(&masked, |caps: &regex::Captures| {
        let token = format!("#v{}", literals.len());
        literals.push(match &caps[0] {
            "true" => Literal::Bool(true),
            "false" => Literal::Bool(false),
            _ => Literal::Null,
        });
        token
    });
    let masked = NUMBER_RE.replace_all(&masked, |caps: &regex::Captures| {
        let token = format!("#v{}", literals.len());
        literals.push(Literal::Num(caps[0].parse::<f64>().unwrap_or(f64::NAN)));
        token
    });

    let (masked, groups) = fold_groups(&masked)?;
    Ok(Hidden {
        masked,
        literals,
        groups,
    })
}

/// Replace `(...)`/`[...]` substrings with `#g<i>`/`#p<i>` placeholders,
/// innermost first. Nested group content in the captured inner text already
/// refers to earlier placeholders.
fn fold_groups(masked: &str) -> Result<(String, Vec<GroupCapture>), ParseError> {
    let mut out = String::with_capacity(masked.len());
    let mut groups: Vec<GroupCapture> = Vec::new();
    // (opener, length of `out` when it was seen, source offset)
    let mut stack: Vec<(char, usize, usize)> = Vec::new();

    for (pos, ch) in masked.char_indices() {
        match ch {
            '(' | '[' => stack.push((ch, out.len(), pos)),
            ')' | ']' => {
                let (opener, mark, _) = stack
                    .pop()
                    .ok_or(ParseError::UnterminatedGroup { position: pos })?;
                let delim = match (opener, ch) {
                    ('(', ')') => Delim::Paren,
                    ('[', ']') => Delim::Bracket,
                    _ => return Err(ParseError::UnterminatedGroup { position: pos }),
                };
                let inner = out.split_off(mark);
                let tag = match delim {
                    Delim::Paren => 'g',
                    Delim::Bracket => 'p',
                };
                out.push('#');
                out.push(tag);
                out.push_str(&groups.len().to_string());
                groups.push(GroupCapture { delim, inner });
            }
            _ => out.push(ch),
        }
    }

    if let Some((_, _, pos)) = stack.last() {
        return Err(ParseError::UnterminatedGroup { position: *pos });
    }
    Ok((out, groups))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_string_literal_verbatim() {
        let hidden = hide(r#""hello world" + x"#).unwrap();
        assert_eq!(hidden.masked, "#v0+x");
        assert_eq!(hidden.literals, vec![Literal::Str("\"hello world\"".into())]);
    }

    #[test]
    fn test_hide_numbers_and_keywords() {
        let hidden = hide("1.5e3 + true - null").unwrap();
        assert_eq!(hidden.masked, "#v2+#v0-#v1");
        assert_eq!(hidden.literals[0], Literal::Bool(true));
        assert_eq!(hidden.literals[1], Literal::Null);
        assert_eq!(hidden.literals[2], Literal::Num(1500.0));
    }

    #[test]
    fn test_hide_masks_in_operator_before_stripping() {
        let hidden = hide("a in b").unwrap();
        assert_eq!(hidden.masked, "a#in#b");
    }

    #[test]
    fn test_in_not_masked_inside_identifiers() {
        let hidden = hide("paint + index").unwrap();
        assert_eq!(hidden.masked, "paint+index");
    }

    #[test]
    fn test_fold_nested_groups_single_pass() {
        let hidden = hide("a * (b + (c - d))").unwrap();
        assert_eq!(hidden.masked, "a*#g1");
        assert_eq!(hidden.groups[0].inner, "c-d");
        assert_eq!(hidden.groups[1].inner, "b+#g0");
        assert_eq!(hidden.groups[1].delim, Delim::Paren);
    }

    #[test]
    fn test_fold_bracket_groups() {
        let hidden = hide("a[b][0]").unwrap();
        assert_eq!(hidden.masked, "a#p0#p1");
        assert_eq!(hidden.groups[0].delim, Delim::Bracket);
        assert_eq!(hidden.groups[0].inner, "b");
        assert_eq!(hidden.groups[1].inner, "#v0");
    }

    #[test]
    fn test_unterminated_group_errors() {
        assert!(matches!(
            hide("(a + b"),
            Err(ParseError::UnterminatedGroup { .. })
        ));
        assert!(matches!(
            hide("a + b)"),
            Err(ParseError::UnterminatedGroup { .. })
        ));
        assert!(matches!(
            hide("(a]"),
            Err(ParseError::UnterminatedGroup { .. })
        ));
    }

    #[test]
    fn test_operators_inside_strings_are_hidden() {
        let hidden = hide(r#""a + b" + c"#).unwrap();
        assert_eq!(hidden.masked, "#v0+c");
    }
}
