//! A small rich-text surface: an element tree with a caret or a selected
//! element, which serializes to the inline markup stored in note content.

use crate::format::{Command, EngineError, RichTextEngine, StyleFact};
use crate::utils::escape_markup;

pub type NodeId = usize;

const ROOT: NodeId = 0;
const ZERO_WIDTH: char = '\u{200B}';

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tag {
    Root,
    Bold,
    Italic,
    Underline,
    UnorderedList,
    OrderedList,
    ListItem,
    Marker,
}

impl Tag {
    fn for_command(cmd: Command) -> Tag {
        match cmd {
            Command::Bold => Tag::Bold,
            Command::Italic => Tag::Italic,
            Command::Underline => Tag::Underline,
            Command::UnorderedList => Tag::UnorderedList,
            Command::OrderedList => Tag::OrderedList,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Tag::Root => "div",
            Tag::Bold => "b",
            Tag::Italic => "i",
            Tag::Underline => "u",
            Tag::UnorderedList => "ul",
            Tag::OrderedList => "ol",
            Tag::ListItem => "li",
            Tag::Marker => "span",
        }
    }

    fn style(self) -> StyleFact {
        match self {
            Tag::Root => StyleFact::root(),
            Tag::Bold => StyleFact { font_weight: 700, ..StyleFact::element("b") },
            Tag::Italic => StyleFact { italic: true, ..StyleFact::element("i") },
            Tag::Underline => StyleFact {
                text_decoration: "underline".to_string(),
                ..StyleFact::element("u")
            },
            t => StyleFact::element(t.name()),
        }
    }
}

#[derive(Clone, Debug)]
enum Kind {
    Element(Tag),
    Text(String),
}

#[derive(Clone, Debug)]
struct Node {
    parent: Option<NodeId>,
    kind: Kind,
    children: Vec<NodeId>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Selection {
    None,
    /// between `parent.children[index - 1]` and `parent.children[index]`
    Caret { parent: NodeId, index: usize },
    /// everything inside one element
    Contents(NodeId),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Marker {
    container: NodeId,
    content: NodeId,
}

/// Nodes live in an arena indexed by `NodeId`. Unwrapped or split-off nodes
/// are detached but never freed, so the arena only grows; a document is
/// meant to last for one editing pass.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    selection: Selection,
    state_queries: bool,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    pub fn new() -> Document {
        Document {
            nodes: vec![Node { parent: None, kind: Kind::Element(Tag::Root), children: vec![] }],
            selection: Selection::Caret { parent: ROOT, index: 0 },
            state_queries: true,
        }
    }

    /// Behave like engines whose active-state query throws.
    pub fn without_state_queries(mut self) -> Document {
        self.state_queries = false;
        self
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn caret_at_end(&mut self) {
        self.selection = Selection::Caret { parent: ROOT, index: self.nodes[ROOT].children.len() };
    }

    pub fn select_contents(&mut self, node: NodeId) {
        if self.is_element(node) {
            self.selection = Selection::Contents(node);
        }
    }

    /// Type at the caret. A selected element collapses to its end first.
    pub fn type_text(&mut self, text: &str) {
        let (parent, index) = match self.selection {
            Selection::Caret { parent, index } => (parent, index),
            Selection::Contents(n) => (n, self.nodes[n].children.len()),
            Selection::None => (ROOT, self.nodes[ROOT].children.len()),
        };
        if index > 0 {
            let prev = self.nodes[parent].children[index - 1];
            if let Kind::Text(ref mut t) = self.nodes[prev].kind {
                t.push_str(text);
                self.selection = Selection::Caret { parent, index };
                return;
            }
        }
        let node = self.alloc(Kind::Text(text.to_string()), parent);
        self.nodes[parent].children.insert(index, node);
        self.selection = Selection::Caret { parent, index: index + 1 };
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for &c in &self.nodes[ROOT].children {
            self.write_markup(c, &mut out);
        }
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        match self.nodes[node].kind {
            Kind::Text(ref t) => {
                let visible: String = t.chars().filter(|&c| c != ZERO_WIDTH).collect();
                out.push_str(&escape_markup(&visible));
            }
            Kind::Element(tag) => {
                if tag == Tag::Marker {
                    out.push_str("<span id=\"temp-formatting\">");
                } else {
                    out.push('<');
                    out.push_str(tag.name());
                    out.push('>');
                }
                for &c in &self.nodes[node].children {
                    self.write_markup(c, out);
                }
                out.push_str("</");
                out.push_str(tag.name());
                out.push('>');
            }
        }
    }

    fn alloc(&mut self, kind: Kind, parent: NodeId) -> NodeId {
        self.nodes.push(Node { parent: Some(parent), kind: kind, children: vec![] });
        self.nodes.len() - 1
    }

    fn is_element(&self, node: NodeId) -> bool {
        matches!(self.nodes.get(node).map(|n| &n.kind), Some(Kind::Element(_)))
    }

    fn is_attached(&self, mut node: NodeId) -> bool {
        while node != ROOT {
            match self.nodes[node].parent {
                Some(p) => node = p,
                None => return false,
            }
        }
        true
    }

    fn tag(&self, node: NodeId) -> Option<Tag> {
        match self.nodes[node].kind {
            Kind::Element(t) => Some(t),
            Kind::Text(_) => None,
        }
    }

    fn position(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes[node].parent?;
        let idx = self.nodes[parent].children.iter().position(|&c| c == node)?;
        Some((parent, idx))
    }

    /// innermost element the selection sits in
    fn anchor(&self) -> Option<NodeId> {
        match self.selection {
            Selection::None => None,
            Selection::Caret { parent, .. } => Some(parent),
            Selection::Contents(mut n) => {
                // descend through single-element wrappers
                while let &[only] = self.nodes[n].children.as_slice() {
                    if !self.is_element(only) {
                        break;
                    }
                    n = only;
                }
                Some(n)
            }
        }
    }

    fn nearest_formatting(&self, cmd: Command) -> Option<NodeId> {
        let want = Tag::for_command(cmd);
        let mut cur = self.anchor();
        while let Some(n) = cur {
            match self.tag(n) {
                Some(Tag::Root) | None => return None,
                Some(t) if t == want => return Some(n),
                Some(Tag::UnorderedList) | Some(Tag::OrderedList) if cmd.is_list() => return None,
                _ => {}
            }
            cur = self.nodes[n].parent;
        }
        None
    }

    fn wrap_children(&mut self, node: NodeId, tag: Tag) -> NodeId {
        let children = std::mem::take(&mut self.nodes[node].children);
        let wrapper = self.alloc(Kind::Element(tag), node);
        for &c in &children {
            self.nodes[c].parent = Some(wrapper);
        }
        self.nodes[wrapper].children = children;
        self.nodes[node].children.push(wrapper);
        wrapper
    }

    fn unwrap(&mut self, node: NodeId) {
        let (parent, idx) = match self.position(node) {
            Some(p) => p,
            None => return,
        };
        let children = std::mem::take(&mut self.nodes[node].children);
        for &c in &children {
            self.nodes[c].parent = Some(parent);
        }
        self.nodes[parent].children.splice(idx..idx + 1, children);
        self.nodes[node].parent = None;
    }

    /// Split every element from the caret up to and including `ancestor`,
    /// leaving the caret just outside it.
    fn split_out_of(&mut self, ancestor: NodeId, mut parent: NodeId, mut index: usize) -> (NodeId, usize) {
        loop {
            let (up, pos) = match self.position(parent) {
                Some(p) => p,
                None => return (parent, index),
            };
            let tail = self.nodes[parent].children.split_off(index);
            let emptied = self.nodes[parent].children.is_empty();
            if emptied {
                self.nodes[up].children.remove(pos);
                self.nodes[parent].parent = None;
            }
            let after = if emptied { pos } else { pos + 1 };
            if !tail.is_empty() {
                let tag = self.tag(parent).unwrap_or(Tag::Marker);
                let clone = self.alloc(Kind::Element(tag), up);
                for &c in &tail {
                    self.nodes[c].parent = Some(clone);
                }
                self.nodes[clone].children = tail;
                self.nodes[up].children.insert(after, clone);
            }
            if parent == ancestor {
                return (up, after);
            }
            parent = up;
            index = after;
        }
    }

    fn format_selection(&mut self, node: NodeId, cmd: Command) {
        if cmd.is_list() {
            let list = self.wrap_children(node, Tag::for_command(cmd));
            self.wrap_children(list, Tag::ListItem);
        } else {
            self.wrap_children(node, Tag::for_command(cmd));
        }
    }

    fn unformat(&mut self, formatted: NodeId) {
        if self.tag(formatted).map_or(false, |t| t == Tag::UnorderedList || t == Tag::OrderedList) {
            let items: Vec<NodeId> = self.nodes[formatted].children
                                         .iter()
                                         .copied()
                                         .filter(|&c| self.tag(c) == Some(Tag::ListItem))
                                         .collect();
            for item in items {
                self.unwrap(item);
            }
        }
        self.unwrap(formatted);
    }
}

impl RichTextEngine for Document {
    type Marker = Marker;

    fn query_command_state(&self, cmd: Command) -> Result<bool, EngineError> {
        if !self.state_queries {
            return Err(EngineError::QueryUnsupported(cmd));
        }
        Ok(self.nearest_formatting(cmd).is_some())
    }

    fn exec_command(&mut self, cmd: Command) {
        match (self.selection, self.nearest_formatting(cmd)) {
            (Selection::None, _) => {}
            (Selection::Caret { parent, index }, Some(formatted)) => {
                let (parent, index) = self.split_out_of(formatted, parent, index);
                self.selection = Selection::Caret { parent, index };
            }
            // nothing to wrap; the marker pass carries it onto typing
            (Selection::Caret { .. }, None) => {}
            (Selection::Contents(node), Some(formatted)) => {
                let spot = self.position(formatted);
                let before = spot.map_or(0, |(p, _)| self.nodes[p].children.len());
                self.unformat(formatted);
                if !self.is_attached(node) {
                    // the selected element itself was unwrapped; caret after its old contents
                    if let Some((parent, idx)) = spot {
                        let spliced = self.nodes[parent].children.len() + 1 - before;
                        self.selection = Selection::Caret { parent, index: idx + spliced };
                    }
                }
            }
            (Selection::Contents(node), None) => self.format_selection(node, cmd),
        }
    }

    fn is_collapsed(&self) -> Option<bool> {
        match self.selection {
            Selection::None => None,
            Selection::Caret { .. } => Some(true),
            Selection::Contents(_) => Some(false),
        }
    }

    fn anchor_ancestry(&self) -> Vec<StyleFact> {
        let mut facts = vec![];
        let mut cur = self.anchor();
        while let Some(n) = cur {
            if let Some(tag) = self.tag(n) {
                facts.push(tag.style());
                if tag == Tag::Root {
                    break;
                }
            }
            cur = self.nodes[n].parent;
        }
        facts
    }

    fn insert_marker(&mut self) -> Marker {
        let (parent, index) = match self.selection {
            Selection::Caret { parent, index } => (parent, index),
            Selection::Contents(n) => (n, self.nodes[n].children.len()),
            Selection::None => (ROOT, self.nodes[ROOT].children.len()),
        };
        let container = self.alloc(Kind::Element(Tag::Marker), parent);
        self.nodes[parent].children.insert(index, container);
        let content = self.alloc(Kind::Text(ZERO_WIDTH.to_string()), container);
        self.nodes[container].children.push(content);
        self.selection = Selection::Caret { parent: container, index: 1 };
        Marker { container, content }
    }

    fn select_marker(&mut self, marker: Marker) {
        self.selection = Selection::Contents(marker.container);
    }

    fn unwrap_marker(&mut self, marker: Marker) {
        self.unwrap(marker.container);
        self.selection = Selection::None;
    }

    fn collapse_after_marked(&mut self, marker: Marker) {
        if let Some((parent, idx)) = self.position(marker.content) {
            self.selection = Selection::Caret { parent, index: idx + 1 };
        }
    }
}
