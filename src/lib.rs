//! Expression-compiled template parts.
//!
//! Two cooperating pieces:
//!
//! - [`expr`]: a compiler for a small common-subset expression language
//!   (arithmetic, comparison, logical, bitwise, member access, literals)
//!   built on literal/group hiding plus ordered operator splitting instead of
//!   a grammar, and
//! - a template part binder: [`Template`] parses markup, [`scan`] finds
//!   `{{expr}}` placeholders in text and attribute values, instantiation
//!   materializes one updatable [`Part`] per placeholder, and a
//!   [`Processor`] re-applies parameter mappings to those parts on demand
//!   without re-scanning the tree.
//!
//! ```
//! use template_parts::{Template, Params, Value};
//!
//! let template = Template::parse("<div class=\"{{kind}}\">Hello {{name}}!</div>")?;
//! let mut instance = template.instantiate(&Params::from([
//!     ("kind".to_string(), Value::from("greeting")),
//!     ("name".to_string(), Value::from("world")),
//! ]))?;
//! assert_eq!(instance.to_markup(), "<div class=\"greeting\">Hello world!</div>");
//! ```
//!
//! Everything is synchronous and single-threaded; instances are `!Send` by
//! construction.

pub mod dom;
pub mod expr;
pub mod instance;
pub mod markup;
pub mod parts;
pub mod processor;
pub mod scan;
pub mod template;
pub mod value;

pub use dom::{Attribute, Node, NodeRef};
pub use expr::{Compiler, Expr, Literal, OperatorTable, ParseError};
pub use instance::TemplateInstance;
pub use markup::{parse_markup, MarkupError};
pub use parts::{collect_parts, AttributePart, AttributeValueSink, BindError, NodePart, Part};
pub use processor::{FnProcessor, Processor, StandardProcessor};
pub use scan::{has_mustache, scan, Token, TokenKind};
pub use template::{PropDecl, PropKind, Template};
pub use value::{params_from_json, Callback, Params, Value};
