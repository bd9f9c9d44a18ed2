//! Expression compiler.
//!
//! Compiles a small common-subset expression language (arithmetic, comparison,
//! logical, bitwise, member access, literals) into a precedence-correct tree
//! without a hand-written recursive-descent or Pratt parser. The pipeline:
//!
//!     1. hide: literals and groups become indexed placeholder tokens,
//!        producing a placeholder-safe string plus side tables
//!     2. split: the string splits on each operator of an ordered table,
//!        loosest-binding first, into n-ary structural fragments
//!     3. unwrap: placeholders resolve back into literals, groups, and
//!        member/call structure, yielding the final [`Expr`] tree
//!
//! Parsing is pure and deterministic. Malformed input always errors; there is
//! no best-effort recovery.

pub mod ast;
pub mod error;
mod hide;
mod split;
pub mod table;
mod unwrap;

pub use ast::{Expr, Literal};
pub use error::ParseError;
pub use table::{Arity, Evaluator, Operator, OperatorTable};

use unwrap::Unwrapper;

/// A configured expression compiler. Independently configured instances can
/// coexist; the operator table is per-compiler state, not a global.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    table: OperatorTable,
}

impl Compiler {
    pub fn new(table: OperatorTable) -> Self {
        Compiler { table }
    }

    pub fn table(&self) -> &OperatorTable {
        &self.table
    }

    /// Compile an expression into its tree.
    pub fn parse(&self, source: &str) -> Result<Expr, ParseError> {
        let hidden = hide::hide(source)?;
        if hidden.masked.is_empty() {
            return Err(ParseError::Empty);
        }
        let fragment = split::split(hidden.masked.clone(), &self.table);
        Unwrapper::new(&self.table, &hidden).unwrap(fragment)
    }
}

/// Parse with the canonical operator table.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    Compiler::default().parse(source)
}
