//! A bound copy of a template.
//!
//! The instance owns its cloned tree and the parts collected from it, plus
//! the processor that applies parameter mappings. Updates are synchronous and
//! incremental: only parts whose expressions name present parameters change,
//! and the tree is never re-scanned.

use std::rc::Rc;

use crate::dom::NodeRef;
use crate::parts::{collect_parts, BindError, Part};
use crate::processor::Processor;
use crate::value::Params;

pub struct TemplateInstance {
    root: NodeRef,
    parts: Vec<Part>,
    processor: Rc<dyn Processor>,
}

impl TemplateInstance {
    pub(crate) fn new(
        content: &NodeRef,
        params: &Params,
        processor: Rc<dyn Processor>,
    ) -> Result<TemplateInstance, BindError> {
        let root = content.deep_clone();
        let mut parts = collect_parts(&root);
        processor.create(&mut parts, params)?;
        Ok(TemplateInstance {
            root,
            parts,
            processor,
        })
    }

    /// Re-apply a parameter mapping to the existing parts.
    pub fn update(&mut self, params: &Params) -> Result<(), BindError> {
        self.processor.process(&mut self.parts, params)
    }

    /// The instance's bound tree.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [Part] {
        &mut self.parts
    }

    /// First element with the given `id`, in document order.
    pub fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.root
            .descendants()
            .into_iter()
            .find(|node| node.attribute("id").as_deref() == Some(id))
    }

    pub fn to_markup(&self) -> String {
        self.root.to_markup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use crate::value::Value;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_instantiate_and_update() {
        let template = Template::parse("<div class=\"{{kind}}\">Hello {{name}}!</div>").unwrap();
        let mut instance = template
            .instantiate(&params(&[("kind", "greeting"), ("name", "world")]))
            .unwrap();
        assert_eq!(
            instance.to_markup(),
            "<div class=\"greeting\">Hello world!</div>"
        );
        instance.update(&params(&[("name", "again")])).unwrap();
        assert_eq!(
            instance.to_markup(),
            "<div class=\"greeting\">Hello again!</div>"
        );
    }

    #[test]
    fn test_parts_keep_identity_across_updates() {
        let template = Template::parse("<div>{{x}}</div>").unwrap();
        let mut instance = template.instantiate(&params(&[("x", "a")])).unwrap();
        let before = match &instance.parts()[0] {
            Part::Node(part) => part.positions()[0].clone(),
            Part::Attribute(_) => unreachable!(),
        };
        instance.update(&params(&[("x", "b")])).unwrap();
        let after = match &instance.parts()[0] {
            Part::Node(part) => part.positions()[0].clone(),
            Part::Attribute(_) => unreachable!(),
        };
        assert!(Rc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_independent_instances() {
        let template = Template::parse("<div>{{x}}</div>").unwrap();
        let first = template.instantiate(&params(&[("x", "1")])).unwrap();
        let second = template.instantiate(&params(&[("x", "2")])).unwrap();
        assert_eq!(first.root().text_content(), "1");
        assert_eq!(second.root().text_content(), "2");
    }

    #[test]
    fn test_element_by_id() {
        let template = Template::parse("<div><span id=\"out\">{{x}}</span></div>").unwrap();
        let instance = template.instantiate(&Params::new()).unwrap();
        assert!(instance.element_by_id("out").is_some());
        assert!(instance.element_by_id("missing").is_none());
    }
}
