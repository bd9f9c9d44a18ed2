//! Parser for the template markup subset.
//!
//! Templates arrive as markup: elements with attributes (including the
//! `name:type="default"` typed-prop declarations), text, comments, and
//! self-closing or void tags. This is deliberately a small hand-written
//! character scanner, not an HTML parser; entities are left verbatim and
//! scripting semantics live with the external collaborators.

use std::fmt;

use crate::dom::{is_void_element, Node, NodeRef};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupError {
    /// Input ended inside a tag, comment, quoted value, or unclosed element.
    UnexpectedEof,
    /// A closing tag that does not match the open element.
    MismatchedTag { expected: String, found: String },
    /// A `<` that does not begin a well-formed tag.
    InvalidTag { position: usize },
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupError::UnexpectedEof => write!(f, "unexpected end of markup"),
            MarkupError::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{}>, found </{}>", expected, found)
            }
            MarkupError::InvalidTag { position } => {
                write!(f, "invalid tag at offset {}", position)
            }
        }
    }
}

impl std::error::Error for MarkupError {}

/// Parse markup into a fragment tree.
pub fn parse_markup(source: &str) -> Result<NodeRef, MarkupError> {
    MarkupParser { source, pos: 0 }.parse()
}

struct MarkupParser<'a> {
    source: &'a str,
    pos: usize,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_attr_name_char(c: char) -> bool {
    is_name_char(c) || c == ':' || c == '$' || c == '.'
}

impl<'a> MarkupParser<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.source.len() - trimmed.len();
    }

    fn parse(mut self) -> Result<NodeRef, MarkupError> {
        let root = Node::fragment();
        let mut stack: Vec<NodeRef> = Vec::new();

        while self.pos < self.source.len() {
            if self.rest().starts_with("<!--") {
                self.skip_comment()?;
            } else if self.rest().starts_with("</") {
                let name = self.parse_close_tag()?;
                let open = stack.pop().ok_or_else(|| MarkupError::MismatchedTag {
                    expected: "nothing".to_string(),
                    found: name.clone(),
                })?;
                let open_name = open.name().unwrap_or_default().to_string();
                if open_name != name {
                    return Err(MarkupError::MismatchedTag {
                        expected: open_name,
                        found: name,
                    });
                }
            } else if self.rest().starts_with('<') && self.tag_follows() {
                let (element, self_closed) = self.parse_open_tag()?;
                let name = element.name().unwrap_or_default().to_string();
                let parent = stack.last().unwrap_or(&root).clone();
                parent.append_child(element.clone());
                if !self_closed && !is_void_element(&name) {
                    stack.push(element);
                }
            } else {
                self.parse_text(stack.last().unwrap_or(&root));
            }
        }

        if stack.is_empty() {
            Ok(root)
        } else {
            Err(MarkupError::UnexpectedEof)
        }
    }

    /// Whether the `<` at the cursor begins a tag rather than literal text.
    fn tag_follows(&self) -> bool {
        matches!(self.rest().chars().nth(1), Some(c) if is_name_start(c))
    }

    fn skip_comment(&mut self) -> Result<(), MarkupError> {
        match self.rest().find("-->") {
            Some(offset) => {
                self.pos += offset + 3;
                Ok(())
            }
            None => Err(MarkupError::UnexpectedEof),
        }
    }

    fn parse_text(&mut self, parent: &NodeRef) {
        let start = self.pos;
        let mut end = self.source.len();
        let mut search = self.pos;
        while let Some(offset) = self.source[search..].find('<') {
            let at = search + offset;
            let next = self.source[at..].chars().nth(1);
            let opens_tag = matches!(next, Some(c) if is_name_start(c) || c == '/' || c == '!');
            if at > self.pos && opens_tag {
                end = at;
                break;
            }
            if at == self.pos && opens_tag {
                // Caller dispatches tags; a lone `<` here is literal text.
                end = at + 1;
                search = at + 1;
                continue;
            }
            search = at + 1;
            end = self.source.len();
        }
        self.pos = end;
        let text = &self.source[start..end];
        if !text.is_empty() {
            parent.append_child(Node::text(text));
        }
    }

    fn parse_close_tag(&mut self) -> Result<String, MarkupError> {
        self.pos += 2;
        let name = self.read_name()?;
        self.skip_whitespace();
        match self.peek() {
            Some('>') => {
                self.pos += 1;
                Ok(name)
            }
            Some(_) => Err(MarkupError::InvalidTag { position: self.pos }),
            None => Err(MarkupError::UnexpectedEof),
        }
    }

    fn parse_open_tag(&mut self) -> Result<(NodeRef, bool), MarkupError> {
        self.pos += 1;
        let name = self.read_name()?;
        let element = Node::element(&name);

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    return Ok((element, false));
                }
                Some('/') => {
                    if self.rest().starts_with("/>") {
                        self.pos += 2;
                        return Ok((element, true));
                    }
                    return Err(MarkupError::InvalidTag { position: self.pos });
                }
                Some(c) if is_attr_name_char(c) => {
                    let (attr_name, attr_value) = self.parse_attribute()?;
                    element.set_attribute(&attr_name, &attr_value);
                }
                Some(_) => return Err(MarkupError::InvalidTag { position: self.pos }),
                None => return Err(MarkupError::UnexpectedEof),
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<(String, String), MarkupError> {
        let start = self.pos;
        let end = self
            .rest()
            .char_indices()
            .find(|(_, c)| !is_attr_name_char(*c))
            .map(|(i, _)| start + i)
            .unwrap_or(self.source.len());
        let name = self.source[start..end].to_string();
        self.pos = end;
        if name.is_empty() {
            return Err(MarkupError::InvalidTag { position: start });
        }

        self.skip_whitespace();
        if self.peek() != Some('=') {
            // Bare attribute, e.g. `scoped`.
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();

        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let value_start = self.pos;
                let offset = self.rest().find(quote).ok_or(MarkupError::UnexpectedEof)?;
                let value = self.source[value_start..value_start + offset].to_string();
                self.pos = value_start + offset + 1;
                Ok((name, value))
            }
            Some(_) => {
                let value_start = self.pos;
                let end = self
                    .rest()
                    .char_indices()
                    .find(|(_, c)| c.is_whitespace() || *c == '>' || *c == '/')
                    .map(|(i, _)| value_start + i)
                    .unwrap_or(self.source.len());
                let value = self.source[value_start..end].to_string();
                self.pos = end;
                Ok((name, value))
            }
            None => Err(MarkupError::UnexpectedEof),
        }
    }

    fn read_name(&mut self) -> Result<String, MarkupError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_name_start(c) => {}
            Some(_) => return Err(MarkupError::InvalidTag { position: start }),
            None => return Err(MarkupError::UnexpectedEof),
        }
        let end = self
            .rest()
            .char_indices()
            .find(|(_, c)| !is_name_char(*c))
            .map(|(i, _)| start + i)
            .unwrap_or(self.source.len());
        let name = self.source[start..end].to_string();
        self.pos = end;
        Ok(name)
    }
}
