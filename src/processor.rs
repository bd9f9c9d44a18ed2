//! Update policy: how parameter values flow into parts.
//!
//! A [`Processor`] is consulted once at instantiation (`create`) and on every
//! subsequent `update` (`process`). The standard family applies, per part
//! whose expression resolves to a present parameter: callable values attach
//! as element behavior, boolean values toggle configured boolean attributes,
//! everything else stringifies. Absent keys are skipped, never blanked.

use std::collections::HashSet;
use std::rc::Rc;

use crate::expr::{Compiler, Expr, Literal};
use crate::parts::{BindError, Part};
use crate::value::{Params, Value};

pub trait Processor {
    /// First application at instantiation time. Defaults to [`process`].
    ///
    /// [`process`]: Processor::process
    fn create(&self, parts: &mut [Part], params: &Params) -> Result<(), BindError> {
        self.process(parts, params)
    }

    /// Re-apply `params` to the parts of an instance.
    fn process(&self, parts: &mut [Part], params: &Params) -> Result<(), BindError>;
}

/// Attributes whose native semantics are presence-valued. Boolean parameter
/// values bound to these toggle the attribute instead of stringifying.
const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "async", "autofocus", "autoplay", "checked", "controls", "default", "defer", "disabled",
    "hidden", "loop", "multiple", "muted", "open", "readonly", "required", "reversed", "selected",
];

/// The standard update policy family.
#[derive(Debug, Clone)]
pub struct StandardProcessor {
    booleans: bool,
    callbacks: bool,
    path_lookup: bool,
    boolean_attributes: HashSet<String>,
}

impl Default for StandardProcessor {
    fn default() -> Self {
        StandardProcessor::property_identity_boolean_callback()
    }
}

impl StandardProcessor {
    /// Stringify every present value.
    pub fn property_identity() -> Self {
        StandardProcessor {
            booleans: false,
            callbacks: false,
            path_lookup: false,
            boolean_attributes: BOOLEAN_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Stringify, but let boolean values toggle boolean-valued attributes.
    pub fn property_identity_or_boolean_attribute() -> Self {
        StandardProcessor {
            booleans: true,
            ..StandardProcessor::property_identity()
        }
    }

    /// The default policy: callable values attach as element behavior,
    /// booleans toggle boolean-valued attributes, the rest stringifies.
    pub fn property_identity_boolean_callback() -> Self {
        StandardProcessor {
            booleans: true,
            callbacks: true,
            ..StandardProcessor::property_identity()
        }
    }

    /// Opt in to structural path lookup: expressions like `user.name` or
    /// `items[0]` resolve against nested parameter maps. Lookup only; no
    /// operator evaluation.
    pub fn with_path_lookup(mut self) -> Self {
        self.path_lookup = true;
        self
    }

    /// Replace the set of attributes treated as boolean-valued.
    pub fn with_boolean_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boolean_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    fn resolve(&self, expression: &str, params: &Params) -> Option<Value> {
        if let Some(value) = params.get(expression) {
            return Some(value.clone());
        }
        if !self.path_lookup {
            return None;
        }
        let expr = Compiler::default().parse(expression).ok()?;
        resolve_path(&expr, params)
    }

    fn apply(&self, part: &mut Part, value: Value) -> Result<(), BindError> {
        // Null coalesces to the empty string before policy dispatch.
        let value = match value {
            Value::Null => Value::String(String::new()),
            other => other,
        };
        match part {
            Part::Node(part) => match value {
                // Behavior needs an element to attach to; text has none.
                Value::Callback(_) if self.callbacks => Ok(()),
                other => part.set_value(&other.render()),
            },
            Part::Attribute(part) => match value {
                Value::Callback(_) if self.callbacks => {
                    let element = part.sink().element();
                    element.set_property(&part.sink().attribute_name(), value);
                    Ok(())
                }
                Value::Bool(present)
                    if self.booleans
                        && self.boolean_attributes.contains(&part.sink().attribute_name()) =>
                {
                    part.set_boolean(present)
                }
                other => {
                    part.set_value(&other.render());
                    Ok(())
                }
            },
        }
    }
}

impl Processor for StandardProcessor {
    fn process(&self, parts: &mut [Part], params: &Params) -> Result<(), BindError> {
        for part in parts {
            let Some(value) = self.resolve(part.expression(), params) else {
                continue;
            };
            self.apply(part, value)?;
        }
        Ok(())
    }
}

/// Structural resolution of a compiled expression against nested parameters.
/// Identifier roots, member access, and literal-keyed indexing only.
fn resolve_path(expr: &Expr, params: &Params) -> Option<Value> {
    match expr {
        Expr::Identifier(name) => params.get(name).cloned(),
        Expr::Literal(literal) => Some(literal.to_value()),
        Expr::Group(inner) => resolve_path(inner, params),
        Expr::Member { target, name } => resolve_path(target, params)?.member(name),
        Expr::Index { target, key } => {
            let target = resolve_path(target, params)?;
            match key.as_ref() {
                Expr::Literal(Literal::Num(n)) => target.index(*n),
                Expr::Literal(Literal::Str(s)) => target.member(s),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Wrap a closure as a processor. The closure sees each part whose expression
/// names a present parameter, together with that parameter's value.
pub struct FnProcessor<F>
where
    F: Fn(&mut Part, &Value) -> Result<(), BindError>,
{
    callback: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(&mut Part, &Value) -> Result<(), BindError>,
{
    pub fn new(callback: F) -> Self {
        FnProcessor { callback }
    }
}

impl<F> Processor for FnProcessor<F>
where
    F: Fn(&mut Part, &Value) -> Result<(), BindError>,
{
    fn process(&self, parts: &mut [Part], params: &Params) -> Result<(), BindError> {
        for part in parts {
            if let Some(value) = params.get(part.expression()) {
                (self.callback)(part, value)?;
            }
        }
        Ok(())
    }
}

/// The default policy behind `Rc<dyn Processor>` for instance construction.
pub fn default_processor() -> Rc<dyn Processor> {
    Rc::new(StandardProcessor::default())
}
