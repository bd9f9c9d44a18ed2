//! Template preparation.
//!
//! A template arrives as markup: a content element, optionally accompanied by
//! `script` and `style` elements. Preparation strips the script and style
//! nodes out of the content (keeping the text of a `scoped`, non-module
//! script and the style text for external collaborators), reads typed-prop
//! declarations off the root element's `name:type="default"` attributes, and
//! records the `id`s of nested elements as named references. Instantiation
//! clones the prepared content, collects parts, and runs the processor.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::dom::NodeRef;
use crate::instance::TemplateInstance;
use crate::markup::{parse_markup, MarkupError};
use crate::parts::BindError;
use crate::processor::{default_processor, Processor};
use crate::value::Params;

/// Declared type of a typed prop. Declaration only; coercion is the host's
/// concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropKind {
    Number,
    Boolean,
    String,
    Date,
    List,
    Json,
    Set,
}

impl PropKind {
    fn parse(name: &str) -> Option<PropKind> {
        Some(match name {
            "number" => PropKind::Number,
            "boolean" => PropKind::Boolean,
            "string" => PropKind::String,
            "date" => PropKind::Date,
            "list" => PropKind::List,
            "json" => PropKind::Json,
            "set" => PropKind::Set,
            _ => return None,
        })
    }
}

/// One `name:type="default"` declaration from the template's root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDecl {
    pub name: String,
    pub kind: PropKind,
    pub default: String,
}

/// A prepared template, ready to instantiate any number of times.
#[derive(Debug)]
pub struct Template {
    content: NodeRef,
    props: Vec<PropDecl>,
    refs: Vec<String>,
    scoped_script: Option<String>,
    style: Option<String>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Template, MarkupError> {
        Ok(Template::from_tree(parse_markup(source)?))
    }

    pub fn from_tree(content: NodeRef) -> Template {
        let mut scoped_script = None;
        let mut style = None;
        for node in content.descendants() {
            match node.name() {
                Some("script") => {
                    let scoped = node.has_attribute("scoped");
                    let module = node.attribute("type").as_deref() == Some("module");
                    if scoped && !module && scoped_script.is_none() {
                        scoped_script = Some(node.text_content());
                    }
                    if let Some(parent) = node.parent() {
                        parent.remove_child(&node);
                    }
                }
                Some("style") => {
                    if style.is_none() {
                        style = Some(node.text_content());
                    }
                    if let Some(parent) = node.parent() {
                        parent.remove_child(&node);
                    }
                }
                _ => {}
            }
        }

        let mut props = Vec::new();
        let root = content.children().iter().find(|c| c.is_element()).cloned();
        if let Some(root) = &root {
            for attribute in root.attributes() {
                let Some((name, kind)) = attribute.name.split_once(':') else {
                    continue;
                };
                let Some(kind) = PropKind::parse(kind) else {
                    continue;
                };
                props.push(PropDecl {
                    name: name.to_string(),
                    kind,
                    default: attribute.value.clone(),
                });
                root.remove_attribute(&attribute.name);
            }
        }

        // Named references are the nested elements only; an `id` on the root
        // content element itself names the component, not a ref.
        let refs = content
            .descendants()
            .iter()
            .filter(|node| !matches!(&root, Some(root) if Rc::ptr_eq(node, root)))
            .filter_map(|node| node.attribute("id"))
            .filter(|id| !id.is_empty())
            .collect();

        Template {
            content,
            props,
            refs,
            scoped_script,
            style,
        }
    }

    /// The prepared content tree. Instantiation clones it; the template's own
    /// copy is never mutated by instances.
    pub fn content(&self) -> &NodeRef {
        &self.content
    }

    pub fn props(&self) -> &[PropDecl] {
        &self.props
    }

    /// `id`s of nested elements, in document order.
    pub fn refs(&self) -> &[String] {
        &self.refs
    }

    pub fn scoped_script(&self) -> Option<&str> {
        self.scoped_script.as_deref()
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// Instantiate with the default processor.
    pub fn instantiate(&self, params: &Params) -> Result<TemplateInstance, BindError> {
        self.instantiate_with(params, default_processor())
    }

    pub fn instantiate_with(
        &self,
        params: &Params,
        processor: Rc<dyn Processor>,
    ) -> Result<TemplateInstance, BindError> {
        TemplateInstance::new(&self.content, params, processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_prop_declarations_collected_and_stripped() {
        let template = Template::parse(
            "<x-counter count:number=\"0\" label:string=\"items\" class=\"c\"></x-counter>",
        )
        .unwrap();
        assert_eq!(
            template.props(),
            &[
                PropDecl {
                    name: "count".to_string(),
                    kind: PropKind::Number,
                    default: "0".to_string(),
                },
                PropDecl {
                    name: "label".to_string(),
                    kind: PropKind::String,
                    default: "items".to_string(),
                },
            ]
        );
        let root = template.content().children()[0].clone();
        assert!(!root.has_attribute("count:number"));
        assert_eq!(root.attribute("class").as_deref(), Some("c"));
    }

    #[test]
    fn test_unknown_prop_type_left_as_attribute() {
        let template = Template::parse("<div x:widget=\"1\"></div>").unwrap();
        assert!(template.props().is_empty());
        let root = template.content().children()[0].clone();
        assert_eq!(root.attribute("x:widget").as_deref(), Some("1"));
    }

    #[test]
    fn test_script_and_style_stripped() {
        let template = Template::parse(
            "<div>{{x}}</div><script scoped>let a = 1</script><style>div { color: red }</style>",
        )
        .unwrap();
        assert_eq!(template.scoped_script(), Some("let a = 1"));
        assert_eq!(template.style(), Some("div { color: red }"));
        assert_eq!(template.content().children().len(), 1);
    }

    #[test]
    fn test_module_script_text_not_retained() {
        let template =
            Template::parse("<div></div><script scoped type=\"module\">import x</script>")
                .unwrap();
        assert_eq!(template.scoped_script(), None);
        assert_eq!(template.content().children().len(), 1);
    }

    #[test]
    fn test_refs_collected() {
        let template =
            Template::parse("<div><span id=\"label\"></span><b id=\"count\"></b></div>").unwrap();
        assert_eq!(template.refs(), &["label", "count"]);
    }

    #[test]
    fn test_root_element_id_is_not_a_ref() {
        let template =
            Template::parse("<div id=\"card\"><span id=\"label\"></span></div>").unwrap();
        assert_eq!(template.refs(), &["label"]);
    }

    #[test]
    fn test_template_content_untouched_by_instances() {
        let template = Template::parse("<div>{{x}}</div>").unwrap();
        let params = Params::from([("x".to_string(), Value::from("v"))]);
        let instance = template.instantiate(&params).unwrap();
        assert_eq!(instance.root().text_content(), "v");
        assert_eq!(template.content().text_content(), "{{x}}");
    }
}
