//! Expression compiler cases: precedence, access chains, and failure modes.

use rstest::rstest;
use template_parts::expr::{parse, ParseError};

#[rstest]
#[case("1 + 2 * 3", "(+ 1 (* 2 3))")]
#[case("(1 + 2) * 3", "(* (group (+ 1 2)) 3)")]
#[case("1 - 2 - 3", "(- (- 1 2) 3)")]
#[case("2 * 3 ** 4", "(* 2 (** 3 4))")]
#[case("a || b && c", "(|| a (&& b c))")]
#[case("a | b ^ c & d", "(| a (^ b (& c d)))")]
#[case("a == b != c", "(!= (== a b) c)")]
#[case("a < b << 2", "(< a (<< b 2))")]
#[case("key in map || fallback", "(|| (in key map) fallback)")]
#[case("a % b / c", "(% a (/ b c))")]
fn binary_precedence(#[case] source: &str, #[case] lispy: &str) {
    assert_eq!(parse(source).unwrap().lispy(), lispy);
}

#[rstest]
#[case("a.b.c", "(. (. a b) c)")]
#[case("a.b(c)", "(call (. a b) c)")]
#[case("a.b[0]", "([] (. a b) 0)")]
#[case("f(a, b + 1)", "(call f a (+ b 1))")]
#[case("f()(x)", "(call (call f) x)")]
#[case("a[0][1]", "([] ([] a 0) 1)")]
#[case("a[\"b\"]", "(. a b)")]
#[case("a[\"not an ident\"]", "([] a \"not an ident\")")]
#[case("m[k].n", "(. ([] m k) n)")]
fn access_chains(#[case] source: &str, #[case] lispy: &str) {
    assert_eq!(parse(source).unwrap().lispy(), lispy);
}

#[rstest]
#[case("!done", "(! done)")]
#[case("-x * y", "(* (- x) y)")]
#[case("~mask & bits", "(& (~ mask) bits)")]
#[case("a - -b", "(- a (- b))")]
#[case("+n + 1", "(+ (+ n) 1)")]
fn unary_prefixes(#[case] source: &str, #[case] lispy: &str) {
    assert_eq!(parse(source).unwrap().lispy(), lispy);
}

#[rstest]
#[case("\"a + b\" + \"c\"", "(+ \"a + b\" \"c\")")]
#[case("\"(not a group\"", "\"(not a group\"")]
#[case("x + \"in\"", "(+ x \"in\")")]
#[case("1.5e3 + 2", "(+ 1500 2)")]
#[case("true && null == false", "(&& true (== null false))")]
fn literals_are_opaque(#[case] source: &str, #[case] lispy: &str) {
    assert_eq!(parse(source).unwrap().lispy(), lispy);
}

#[rstest]
#[case("(a + b")]
#[case("a[b")]
#[case("a)")]
#[case("(a])")]
fn unbalanced_groups(#[case] source: &str) {
    assert!(matches!(
        parse(source),
        Err(ParseError::UnterminatedGroup { .. })
    ));
}

#[rstest]
#[case("a +")]
#[case("* b")]
#[case("a && && b")]
#[case("f(a,)")]
#[case("a.")]
#[case(".b")]
fn dangling_operators(#[case] source: &str) {
    assert!(matches!(
        parse(source),
        Err(ParseError::DanglingOperator { .. })
    ));
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("()")]
fn empty_expressions(#[case] source: &str) {
    assert_eq!(parse(source), Err(ParseError::Empty));
}

#[test]
fn display_renders_reparseable_source() {
    for source in [
        "1 + 2 * 3",
        "(1 + 2) * 3",
        "-x * (y + z)",
        "a.b(c, d)[0]",
        "key in map && !done",
        "\"a + b\" + c",
        "a >> 2 < b",
    ] {
        let expr = parse(source).unwrap();
        let rendered = expr.to_string();
        let reparsed = parse(&rendered)
            .unwrap_or_else(|e| panic!("rendered {rendered:?} failed to parse: {e}"));
        assert_eq!(expr, reparsed, "source {source:?} rendered as {rendered:?}");
    }
}

#[test]
fn ast_serializes() {
    let expr = parse("f(x) + items[0]").unwrap();
    insta::assert_snapshot!(
        serde_json::to_string(&expr).unwrap(),
        @r#"{"Binary":{"op":"+","left":{"Call":{"callee":{"Identifier":"f"},"args":[{"Identifier":"x"}]}},"right":{"Index":{"target":{"Identifier":"items"},"key":{"Literal":{"Num":0.0}}}}}}"#
    );
}
