//! Part model: the updatable binding points of an instance.
//!
//! Instantiation walks the cloned tree once and materializes one part per
//! `{{expr}}` placeholder. Text placeholders become [`NodePart`]s owning
//! spliced-in text positions; attribute placeholders become [`AttributePart`]s
//! grouped under one [`AttributeValueSink`] per attribute, which re-joins its
//! literal and part segments into the attribute value on every write. Parts
//! are created once and persist; updates only reassign values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Attribute, IntoNodeRef, Node, NodeRef};
use crate::scan::{has_mustache, scan, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The operation does not apply to this part, e.g. boolean toggling an
    /// attribute that mixes literals and placeholders.
    UnsupportedOperation,
    /// The part's tree positions are no longer attached to a parent.
    Detached,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::UnsupportedOperation => write!(f, "operation not supported by this part"),
            BindError::Detached => write!(f, "part is detached from the tree"),
        }
    }
}

impl std::error::Error for BindError {}

/// A binding point. Processors match on the variant to pick an update
/// strategy.
#[derive(Debug)]
pub enum Part {
    Node(NodePart),
    Attribute(AttributePart),
}

impl Part {
    /// The placeholder expression, whitespace-trimmed.
    pub fn expression(&self) -> &str {
        match self {
            Part::Node(part) => part.expression(),
            Part::Attribute(part) => part.expression(),
        }
    }
}

/// A part standing in for a `{{expr}}` placeholder in text content.
///
/// Owns an ordered, never-empty list of positions in the tree. Setting a
/// string value writes it into a single owned text node; replacing swaps the
/// owned positions for arbitrary nodes.
#[derive(Debug)]
pub struct NodePart {
    expression: String,
    positions: Vec<NodeRef>,
}

impl NodePart {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The nodes this part currently owns, in order.
    pub fn positions(&self) -> &[NodeRef] {
        &self.positions
    }

    /// Concatenated text content of the owned positions.
    pub fn value(&self) -> String {
        self.positions.iter().map(|n| n.text_content()).collect()
    }

    /// Write a plain string. Reuses the owned text node when there is exactly
    /// one, so updates do not churn tree identity.
    pub fn set_value(&mut self, value: &str) -> Result<(), BindError> {
        if self.positions.len() == 1 && self.positions[0].is_text() {
            if self.positions[0].parent().is_none() {
                return Err(BindError::Detached);
            }
            self.positions[0].set_text(value);
            return Ok(());
        }
        self.replace(vec![Node::text(value)])
    }

    /// Swap the owned positions for `items`; plain strings wrap as text
    /// nodes. The new items are inserted before the first owned position,
    /// then the old set is removed. Zero items collapse to a single empty
    /// text node so the part keeps a position to come back to.
    pub fn replace<I>(&mut self, items: I) -> Result<(), BindError>
    where
        I: IntoIterator,
        I::Item: IntoNodeRef,
    {
        let mut items: Vec<NodeRef> = items
            .into_iter()
            .map(IntoNodeRef::into_node_ref)
            .collect();
        if items.is_empty() {
            items.push(Node::text(""));
        }
        let first = &self.positions[0];
        let parent = first.parent().ok_or(BindError::Detached)?;
        if !parent.insert_before(items.clone(), first) {
            return Err(BindError::Detached);
        }
        for old in &self.positions {
            parent.remove_child(old);
        }
        self.positions = items;
        Ok(())
    }
}

/// Literal text or a part slot inside an attribute value. `None` in a part
/// slot is the null sentinel meaning "no value applied".
#[derive(Debug)]
enum Segment {
    Literal(String),
    Part(Option<String>),
}

#[derive(Debug)]
struct SinkState {
    element: NodeRef,
    name: String,
    segments: Vec<Segment>,
}

impl SinkState {
    fn update_parent(&self) {
        if self.segments.len() == 1 {
            if let Segment::Part(None) = &self.segments[0] {
                self.element.remove_attribute(&self.name);
                return;
            }
        }
        let joined: String = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Part(value) => value.as_deref().unwrap_or(""),
            })
            .collect();
        self.element.set_attribute(&self.name, &joined);
    }
}

/// Shared writer for one `{{`-containing attribute. Created during part
/// collection; normalizes the attribute to `""` immediately so template
/// syntax never leaks into the instance.
#[derive(Debug, Clone)]
pub struct AttributeValueSink {
    state: Rc<RefCell<SinkState>>,
}

impl AttributeValueSink {
    fn new(element: NodeRef, name: &str) -> Self {
        element.set_attribute(name, "");
        AttributeValueSink {
            state: Rc::new(RefCell::new(SinkState {
                element,
                name: name.to_string(),
                segments: Vec::new(),
            })),
        }
    }

    pub fn element(&self) -> NodeRef {
        self.state.borrow().element.clone()
    }

    pub fn attribute_name(&self) -> String {
        self.state.borrow().name.clone()
    }
}

/// A part standing in for a `{{expr}}` placeholder inside an attribute value.
#[derive(Debug)]
pub struct AttributePart {
    expression: String,
    sink: AttributeValueSink,
    segment: usize,
}

impl AttributePart {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn sink(&self) -> &AttributeValueSink {
        &self.sink
    }

    /// The last value applied to this part, or `None` before the first write
    /// and after a false `set_boolean`.
    pub fn value(&self) -> Option<String> {
        let state = self.sink.state.borrow();
        match &state.segments[self.segment] {
            Segment::Part(value) => value.clone(),
            Segment::Literal(_) => None,
        }
    }

    pub fn set_value(&mut self, value: &str) {
        {
            let mut state = self.sink.state.borrow_mut();
            let index = self.segment;
            state.segments[index] = Segment::Part(Some(value.to_string()));
        }
        self.sink.state.borrow().update_parent();
    }

    /// Toggle attribute presence. Only valid when this part is the entire
    /// attribute value; an attribute mixing literal text and placeholders has
    /// no boolean reading.
    pub fn set_boolean(&mut self, present: bool) -> Result<(), BindError> {
        {
            let mut state = self.sink.state.borrow_mut();
            if state.segments.len() != 1 {
                return Err(BindError::UnsupportedOperation);
            }
            state.segments[0] = Segment::Part(if present { Some(String::new()) } else { None });
        }
        self.sink.state.borrow().update_parent();
        Ok(())
    }
}

/// Walk `root` in document order and materialize the parts of every
/// placeholder. Text nodes containing `{{` are spliced into literal text and
/// empty position nodes; attributes containing `{{` get a sink.
pub fn collect_parts(root: &NodeRef) -> Vec<Part> {
    let mut out = Vec::new();
    for node in root.descendants() {
        if node.is_element() {
            for attribute in node.attributes() {
                if has_mustache(&attribute.value) {
                    collect_attribute_parts(&node, &attribute, &mut out);
                }
            }
        } else if let Some(text) = node.text_value() {
            if has_mustache(&text) {
                collect_node_parts(&node, &text, &mut out);
            }
        }
    }
    out
}

fn collect_attribute_parts(element: &NodeRef, attribute: &Attribute, out: &mut Vec<Part>) {
    let sink = AttributeValueSink::new(element.clone(), &attribute.name);
    for token in scan(&attribute.value) {
        let mut state = sink.state.borrow_mut();
        match token.kind {
            TokenKind::Literal => state.segments.push(Segment::Literal(token.text)),
            TokenKind::Part => {
                let segment = state.segments.len();
                state.segments.push(Segment::Part(None));
                drop(state);
                out.push(Part::Attribute(AttributePart {
                    expression: token.text,
                    sink: sink.clone(),
                    segment,
                }));
            }
        }
    }
}

fn collect_node_parts(node: &NodeRef, text: &str, out: &mut Vec<Part>) {
    let Some(parent) = node.parent() else {
        return;
    };
    let mut replacements = Vec::new();
    let mut pending = Vec::new();
    for token in scan(text) {
        match token.kind {
            TokenKind::Literal => replacements.push(Node::text(&token.text)),
            TokenKind::Part => {
                let position = Node::text("");
                replacements.push(position.clone());
                pending.push((token.text, position));
            }
        }
    }
    parent.insert_before(replacements, node);
    parent.remove_child(node);
    for (expression, position) in pending {
        out.push(Part::Node(NodePart {
            expression,
            positions: vec![position],
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_markup;

    fn node_part(part: &mut Part) -> &mut NodePart {
        match part {
            Part::Node(part) => part,
            Part::Attribute(_) => panic!("expected node part"),
        }
    }

    fn attribute_part(part: &mut Part) -> &mut AttributePart {
        match part {
            Part::Attribute(part) => part,
            Part::Node(_) => panic!("expected attribute part"),
        }
    }

    #[test]
    fn test_collect_splices_text_placeholders() {
        let root = parse_markup("<div>Hello {{name}}!</div>").unwrap();
        let mut parts = collect_parts(&root);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].expression(), "name");
        assert_eq!(root.text_content(), "Hello !");
        node_part(&mut parts[0]).set_value("world").unwrap();
        assert_eq!(root.text_content(), "Hello world!");
    }

    #[test]
    fn test_collect_normalizes_attribute_to_empty() {
        let root = parse_markup("<div class=\"{{kind}} static\"></div>").unwrap();
        let div = root.children()[0].clone();
        let parts = collect_parts(&root);
        assert_eq!(parts.len(), 1);
        assert_eq!(div.attribute("class").as_deref(), Some(""));
    }

    #[test]
    fn test_attribute_sink_joins_segments() {
        let root = parse_markup("<div class=\"{{a}}-{{b}}\"></div>").unwrap();
        let div = root.children()[0].clone();
        let mut parts = collect_parts(&root);
        assert_eq!(parts.len(), 2);
        attribute_part(&mut parts[0]).set_value("x");
        assert_eq!(div.attribute("class").as_deref(), Some("x-"));
        attribute_part(&mut parts[1]).set_value("y");
        assert_eq!(div.attribute("class").as_deref(), Some("x-y"));
    }

    #[test]
    fn test_set_boolean_toggles_presence() {
        let root = parse_markup("<input disabled=\"{{off}}\">").unwrap();
        let input = root.children()[0].clone();
        let mut parts = collect_parts(&root);
        let part = attribute_part(&mut parts[0]);
        part.set_boolean(true).unwrap();
        assert!(input.has_attribute("disabled"));
        assert_eq!(input.attribute("disabled").as_deref(), Some(""));
        part.set_boolean(false).unwrap();
        assert!(!input.has_attribute("disabled"));
        assert_eq!(part.value(), None);
    }

    #[test]
    fn test_set_boolean_rejects_mixed_attribute() {
        let root = parse_markup("<div class=\"x {{y}}\"></div>").unwrap();
        let mut parts = collect_parts(&root);
        assert_eq!(
            attribute_part(&mut parts[0]).set_boolean(true),
            Err(BindError::UnsupportedOperation)
        );
    }

    #[test]
    fn test_node_part_replace_and_collapse() {
        let root = parse_markup("<div>{{x}}</div>").unwrap();
        let div = root.children()[0].clone();
        let mut parts = collect_parts(&root);
        let part = node_part(&mut parts[0]);
        // Strings wrap as text nodes; real nodes pass through.
        part.replace(["a", "b"]).unwrap();
        assert_eq!(part.value(), "ab");
        assert_eq!(div.text_content(), "ab");
        part.replace([Node::element("br")]).unwrap();
        assert_eq!(div.to_markup(), "<div><br/></div>");
        part.replace(Vec::<NodeRef>::new()).unwrap();
        assert_eq!(part.value(), "");
        assert_eq!(part.positions().len(), 1);
    }

    #[test]
    fn test_node_part_keeps_position_identity_on_set_value() {
        let root = parse_markup("<div>{{x}}</div>").unwrap();
        let mut parts = collect_parts(&root);
        let part = node_part(&mut parts[0]);
        let before = part.positions()[0].clone();
        part.set_value("one").unwrap();
        part.set_value("two").unwrap();
        assert!(Rc::ptr_eq(&before, &part.positions()[0]));
        assert_eq!(part.value(), "two");
    }

    #[test]
    fn test_detached_part_errors() {
        let root = parse_markup("<div>{{x}}</div>").unwrap();
        let div = root.children()[0].clone();
        let mut parts = collect_parts(&root);
        let part = node_part(&mut parts[0]);
        let position = part.positions()[0].clone();
        div.remove_child(&position);
        assert_eq!(
            part.replace(vec![Node::text("y")]),
            Err(BindError::Detached)
        );
    }

    #[test]
    fn test_parts_in_document_order() {
        let root =
            parse_markup("<div title=\"{{t}}\">{{a}}<span>{{b}}</span></div>").unwrap();
        let parts = collect_parts(&root);
        let expressions: Vec<_> = parts.iter().map(Part::expression).collect();
        assert_eq!(expressions, vec!["t", "a", "b"]);
    }
}
