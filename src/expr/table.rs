//! Operator tables.
//!
//! An [`OperatorTable`] is an ordered sequence of `(symbol, arity, rank,
//! evaluator)` rows. Rank is the row index, and order is significant: the
//! splitter iterates rows low-precedence-first, so earlier rows bind loosest.
//! Tables are explicit configuration passed at compiler construction; there is
//! no global mutable table, and independently configured compilers can coexist.

use crate::value::Value;

/// Evaluates one n-ary operator application over already-evaluated operands.
pub type Evaluator = fn(&[Value]) -> Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Binary,
    Prefix,
}

#[derive(Clone)]
pub struct Operator {
    pub symbol: &'static str,
    pub arity: Arity,
    pub eval: Evaluator,
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("symbol", &self.symbol)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Ordered operator configuration for one compiler instance.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    binary: Vec<Operator>,
    prefix: Vec<Operator>,
}

/// Canonical binary symbols, loosest to tightest. The rank of a symbol is its
/// index here.
pub const CANONICAL_ORDER: &[&str] = &[
    ",", "||", "&&", "|", "^", "&", "!=", "==", "in", ">=", ">", "<=", "<", ">>", "<<", "-", "+",
    "%", "/", "*", "**", ".",
];

/// Rank of a symbol in the canonical order; used for minimal-paren rendering.
pub fn canonical_rank(symbol: &str) -> Option<usize> {
    CANONICAL_ORDER.iter().position(|s| *s == symbol)
}

impl OperatorTable {
    pub fn new(binary: Vec<Operator>, prefix: Vec<Operator>) -> Self {
        OperatorTable { binary, prefix }
    }

    /// The canonical common-subset table.
    pub fn canonical() -> Self {
        let binary = vec![
            op(",", eval_sequence),
            op("||", eval_or),
            op("&&", eval_and),
            op("|", eval_bitor),
            op("^", eval_bitxor),
            op("&", eval_bitand),
            op("!=", eval_ne),
            op("==", eval_eq),
            op("in", eval_in),
            op(">=", eval_ge),
            op(">", eval_gt),
            op("<=", eval_le),
            op("<", eval_lt),
            op(">>", eval_shr),
            op("<<", eval_shl),
            op("-", eval_sub),
            op("+", eval_add),
            op("%", eval_rem),
            op("/", eval_div),
            op("*", eval_mul),
            op("**", eval_pow),
            op(".", eval_member),
        ];
        let prefix = vec![
            prefix_op("!", eval_not),
            prefix_op("~", eval_bitnot),
            prefix_op("-", eval_neg),
            prefix_op("+", eval_tonum),
        ];
        OperatorTable { binary, prefix }
    }

    /// Binary rows, loosest first.
    pub fn binary(&self) -> &[Operator] {
        &self.binary
    }

    /// Prefix-only rows.
    pub fn prefix(&self) -> &[Operator] {
        &self.prefix
    }

    pub fn rank(&self, symbol: &str) -> Option<usize> {
        self.binary.iter().position(|o| o.symbol == symbol)
    }

    pub fn binary_operator(&self, symbol: &str) -> Option<&Operator> {
        self.binary.iter().find(|o| o.symbol == symbol)
    }

    pub fn prefix_operator(&self, symbol: &str) -> Option<&Operator> {
        self.prefix.iter().find(|o| o.symbol == symbol)
    }

    /// Whether `symbol` exists as a binary row; the splitter uses this to
    /// avoid matching a symbol inside a longer operator.
    pub fn has_binary_symbol(&self, symbol: &str) -> bool {
        self.binary.iter().any(|o| o.symbol == symbol)
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        OperatorTable::canonical()
    }
}

fn op(symbol: &'static str, eval: Evaluator) -> Operator {
    Operator {
        symbol,
        arity: Arity::Binary,
        eval,
    }
}

fn prefix_op(symbol: &'static str, eval: Evaluator) -> Operator {
    Operator {
        symbol,
        arity: Arity::Prefix,
        eval,
    }
}

// Evaluators. These implement the obvious common-subset semantics over the
// crate's value model; the processor never invokes them (bindings resolve by
// key/path lookup only), but the table carries them for external AST consumers.

fn first_two(args: &[Value]) -> (Value, Value) {
    let a = args.first().cloned().unwrap_or(Value::Null);
    let b = args.get(1).cloned().unwrap_or(Value::Null);
    (a, b)
}

fn eval_sequence(args: &[Value]) -> Value {
    args.last().cloned().unwrap_or(Value::Null)
}

fn eval_or(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    if a.is_truthy() {
        a
    } else {
        b
    }
}

fn eval_and(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    if a.is_truthy() {
        b
    } else {
        a
    }
}

fn eval_bitor(args: &[Value]) -> Value {
    int_binop(args, |a, b| a | b)
}

fn eval_bitxor(args: &[Value]) -> Value {
    int_binop(args, |a, b| a ^ b)
}

fn eval_bitand(args: &[Value]) -> Value {
    int_binop(args, |a, b| a & b)
}

fn eval_shl(args: &[Value]) -> Value {
    int_binop(args, |a, b| a.wrapping_shl(b as u32))
}

fn eval_shr(args: &[Value]) -> Value {
    int_binop(args, |a, b| a.wrapping_shr(b as u32))
}

fn int_binop(args: &[Value], f: fn(i64, i64) -> i64) -> Value {
    let (a, b) = first_two(args);
    let a = a.as_number();
    let b = b.as_number();
    if a.is_nan() || b.is_nan() {
        return Value::Number(f(0, 0) as f64);
    }
    Value::Number(f(a as i64, b as i64) as f64)
}

fn eval_eq(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    Value::Bool(a == b)
}

fn eval_ne(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    Value::Bool(a != b)
}

fn eval_in(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    let found = match &b {
        Value::Map(map) => map.contains_key(&a.render()),
        Value::List(items) => {
            let idx = a.as_number();
            idx.fract() == 0.0 && idx >= 0.0 && (idx as usize) < items.len()
        }
        _ => false,
    };
    Value::Bool(found)
}

fn num_cmp(args: &[Value], f: fn(f64, f64) -> bool) -> Value {
    let (a, b) = first_two(args);
    Value::Bool(f(a.as_number(), b.as_number()))
}

fn eval_ge(args: &[Value]) -> Value {
    num_cmp(args, |a, b| a >= b)
}

fn eval_gt(args: &[Value]) -> Value {
    num_cmp(args, |a, b| a > b)
}

fn eval_le(args: &[Value]) -> Value {
    num_cmp(args, |a, b| a <= b)
}

fn eval_lt(args: &[Value]) -> Value {
    num_cmp(args, |a, b| a < b)
}

fn eval_add(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    // String concatenation when either side is a string.
    if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
        return Value::String(format!("{}{}", a.render(), b.render()));
    }
    Value::Number(a.as_number() + b.as_number())
}

fn eval_sub(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    Value::Number(a.as_number() - b.as_number())
}

fn eval_mul(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    Value::Number(a.as_number() * b.as_number())
}

fn eval_div(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    Value::Number(a.as_number() / b.as_number())
}

fn eval_rem(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    Value::Number(a.as_number() % b.as_number())
}

fn eval_pow(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    Value::Number(a.as_number().powf(b.as_number()))
}

fn eval_member(args: &[Value]) -> Value {
    let (a, b) = first_two(args);
    a.member(&b.render()).unwrap_or(Value::Null)
}

fn eval_not(args: &[Value]) -> Value {
    let a = args.first().cloned().unwrap_or(Value::Null);
    Value::Bool(!a.is_truthy())
}

fn eval_bitnot(args: &[Value]) -> Value {
    let a = args.first().cloned().unwrap_or(Value::Null);
    let n = a.as_number();
    let n = if n.is_nan() { 0 } else { n as i64 };
    Value::Number(!n as f64)
}

fn eval_neg(args: &[Value]) -> Value {
    let a = args.first().cloned().unwrap_or(Value::Null);
    Value::Number(-a.as_number())
}

fn eval_tonum(args: &[Value]) -> Value {
    let a = args.first().cloned().unwrap_or(Value::Null);
    Value::Number(a.as_number())
}
