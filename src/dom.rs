//! Minimal owned tree the part binder operates on.
//!
//! The original consumed a host document; this crate carries a small
//! single-threaded `Rc`-based tree instead: fragments, elements with ordered
//! attributes, and text nodes. Elements also carry a property map, the target
//! of behavior attachment (`element[name] = callback` in the host world).
//! `Rc`/`RefCell` makes the single-writer contract explicit: instances are
//! `!Send` by construction.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::value::Value;

pub type NodeRef = Rc<Node>;

#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    parent: RefCell<Weak<Node>>,
    children: RefCell<Vec<NodeRef>>,
}

#[derive(Debug)]
pub enum NodeKind {
    Fragment,
    Element(ElementData),
    Text(RefCell<String>),
}

#[derive(Debug)]
pub struct ElementData {
    name: String,
    attributes: RefCell<Vec<Attribute>>,
    properties: RefCell<HashMap<String, Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Elements that serialize without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

impl Node {
    pub fn fragment() -> NodeRef {
        Rc::new(Node {
            kind: NodeKind::Fragment,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        })
    }

    pub fn element(name: &str) -> NodeRef {
        Rc::new(Node {
            kind: NodeKind::Element(ElementData {
                name: name.to_string(),
                attributes: RefCell::new(Vec::new()),
                properties: RefCell::new(HashMap::new()),
            }),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        })
    }

    pub fn text(content: &str) -> NodeRef {
        Rc::new(Node {
            kind: NodeKind::Text(RefCell::new(content.to_string())),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        })
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    /// Element name, if this is an element.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(data) => Some(&data.name),
            _ => None,
        }
    }

    /// Text content of a text node.
    pub fn text_value(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Text(content) => Some(content.borrow().clone()),
            _ => None,
        }
    }

    pub fn set_text(&self, content: &str) {
        if let NodeKind::Text(cell) = &self.kind {
            *cell.borrow_mut() = content.to_string();
        }
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade()
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.children.borrow().clone()
    }

    pub fn append_child(self: &Rc<Self>, child: NodeRef) {
        *child.parent.borrow_mut() = Rc::downgrade(self);
        self.children.borrow_mut().push(child);
    }

    /// Insert `nodes` immediately before `reference`, which must be a child.
    /// Returns false when the reference is not attached here.
    pub fn insert_before(self: &Rc<Self>, nodes: Vec<NodeRef>, reference: &NodeRef) -> bool {
        let position = {
            let children = self.children.borrow();
            children.iter().position(|c| Rc::ptr_eq(c, reference))
        };
        let Some(position) = position else {
            return false;
        };
        for node in &nodes {
            *node.parent.borrow_mut() = Rc::downgrade(self);
        }
        self.children
            .borrow_mut()
            .splice(position..position, nodes);
        true
    }

    pub fn remove_child(&self, child: &NodeRef) -> bool {
        let position = {
            let children = self.children.borrow();
            children.iter().position(|c| Rc::ptr_eq(c, child))
        };
        let Some(position) = position else {
            return false;
        };
        let removed = self.children.borrow_mut().remove(position);
        *removed.parent.borrow_mut() = Weak::new();
        true
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        match &self.kind {
            NodeKind::Element(data) => data.attributes.borrow().clone(),
            _ => Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.kind {
            NodeKind::Element(data) => data
                .attributes
                .borrow()
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.clone()),
            _ => None,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        matches!(&self.kind, NodeKind::Element(data)
            if data.attributes.borrow().iter().any(|a| a.name == name))
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        if let NodeKind::Element(data) = &self.kind {
            let mut attributes = data.attributes.borrow_mut();
            if let Some(existing) = attributes.iter_mut().find(|a| a.name == name) {
                existing.value = value.to_string();
            } else {
                attributes.push(Attribute {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let NodeKind::Element(data) = &self.kind {
            data.attributes.borrow_mut().retain(|a| a.name != name);
        }
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        match &self.kind {
            NodeKind::Element(data) => data.properties.borrow().get(name).cloned(),
            _ => None,
        }
    }

    pub fn set_property(&self, name: &str, value: Value) {
        if let NodeKind::Element(data) = &self.kind {
            data.properties.borrow_mut().insert(name.to_string(), value);
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match &self.kind {
            NodeKind::Text(content) => content.borrow().clone(),
            _ => self
                .children
                .borrow()
                .iter()
                .map(|c| c.text_content())
                .collect(),
        }
    }

    /// This node and every descendant, in document order.
    pub fn descendants(self: &Rc<Self>) -> Vec<NodeRef> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// Deep copy without parent links at the root. Properties are not cloned;
    /// they are per-instance state applied by the processor.
    pub fn deep_clone(self: &Rc<Self>) -> NodeRef {
        let clone = match &self.kind {
            NodeKind::Fragment => Node::fragment(),
            NodeKind::Text(content) => Node::text(&content.borrow()),
            NodeKind::Element(data) => {
                let element = Node::element(&data.name);
                for attribute in data.attributes.borrow().iter() {
                    element.set_attribute(&attribute.name, &attribute.value);
                }
                element
            }
        };
        for child in self.children.borrow().iter() {
            clone.append_child(child.deep_clone());
        }
        clone
    }

    /// Serialize back into markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Fragment => {
                for child in self.children.borrow().iter() {
                    child.write_markup(out);
                }
            }
            NodeKind::Text(content) => out.push_str(&escape_text(&content.borrow())),
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(&data.name);
                for attribute in data.attributes.borrow().iter() {
                    out.push(' ');
                    out.push_str(&attribute.name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(&attribute.value));
                    out.push('"');
                }
                if is_void_element(&data.name) && self.children.borrow().is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in self.children.borrow().iter() {
                    child.write_markup(out);
                }
                out.push_str("</");
                out.push_str(&data.name);
                out.push('>');
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && *self.children.borrow() == *other.children.borrow()
    }
}

impl PartialEq for NodeKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeKind::Fragment, NodeKind::Fragment) => true,
            (NodeKind::Element(a), NodeKind::Element(b)) => a == b,
            (NodeKind::Text(a), NodeKind::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for ElementData {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && *self.attributes.borrow() == *other.attributes.borrow()
            && *self.properties.borrow() == *other.properties.borrow()
    }
}

/// Conversion into a [`NodeRef`]. A local stand-in for `Into<NodeRef>`,
/// which the orphan rule forbids implementing for `&str`/`String`.
pub trait IntoNodeRef {
    fn into_node_ref(self) -> NodeRef;
}

impl IntoNodeRef for NodeRef {
    fn into_node_ref(self) -> NodeRef {
        self
    }
}

impl IntoNodeRef for &str {
    fn into_node_ref(self) -> NodeRef {
        Node::text(self)
    }
}

impl IntoNodeRef for String {
    fn into_node_ref(self) -> NodeRef {
        Node::text(&self)
    }
}

fn collect_descendants(node: &NodeRef, out: &mut Vec<NodeRef>) {
    out.push(node.clone());
    for child in node.children.borrow().iter() {
        collect_descendants(child, out);
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_text_content() {
        let root = Node::element("div");
        root.append_child(Node::text("a"));
        let span = Node::element("span");
        span.append_child(Node::text("b"));
        root.append_child(span);
        assert_eq!(root.text_content(), "ab");
    }

    #[test]
    fn test_insert_before_splices() {
        let root = Node::element("div");
        let marker = Node::text("m");
        root.append_child(Node::text("a"));
        root.append_child(marker.clone());
        assert!(root.insert_before(vec![Node::text("x"), Node::text("y")], &marker));
        assert_eq!(root.text_content(), "axym");
    }

    #[test]
    fn test_remove_child_detaches() {
        let root = Node::element("div");
        let child = Node::text("a");
        root.append_child(child.clone());
        assert!(root.remove_child(&child));
        assert!(child.parent().is_none());
        assert_eq!(root.children().len(), 0);
    }

    #[test]
    fn test_attribute_order_preserved() {
        let el = Node::element("div");
        el.set_attribute("b", "2");
        el.set_attribute("a", "1");
        el.set_attribute("b", "3");
        let names: Vec<_> = el.attributes().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(el.attribute("b").as_deref(), Some("3"));
    }

    #[test]
    fn test_deep_clone_is_detached() {
        let root = Node::element("div");
        root.set_attribute("id", "x");
        root.append_child(Node::text("hi"));
        let clone = root.deep_clone();
        clone.set_attribute("id", "y");
        clone.children()[0].set_text("bye");
        assert_eq!(root.attribute("id").as_deref(), Some("x"));
        assert_eq!(root.text_content(), "hi");
        assert_eq!(clone.text_content(), "bye");
    }

    #[test]
    fn test_to_markup() {
        let root = Node::element("div");
        root.set_attribute("class", "x");
        root.append_child(Node::text("a < b"));
        root.append_child(Node::element("br"));
        assert_eq!(root.to_markup(), "<div class=\"x\">a &lt; b<br/></div>");
    }

    #[test]
    fn test_descendants_document_order() {
        let root = Node::element("div");
        let first = Node::element("span");
        first.append_child(Node::text("1"));
        root.append_child(first);
        root.append_child(Node::text("2"));
        let order: Vec<_> = root
            .descendants()
            .iter()
            .map(|n| n.name().map(str::to_string).or_else(|| n.text_value()))
            .collect();
        assert_eq!(
            order,
            vec![
                Some("div".to_string()),
                Some("span".to_string()),
                Some("1".to_string()),
                Some("2".to_string())
            ]
        );
    }
}
