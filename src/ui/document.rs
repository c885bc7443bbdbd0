//! Retained node tree the panels build their UI in.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Only nodes reachable from the body are considered attached;
//! the painter walks the body and element-id lookups ignore detached nodes.

use super::dialog::DialogId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Div,
    List,
    ListItem,
    Heading,
    Button,
}

/// What activating a node asks the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectItem(usize),
    DialogButton { dialog: DialogId, button: String },
}

/// Which vertical offset positions the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub left: f32,
    pub top: f32,
    pub bottom: f32,
    pub anchor: Anchor,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub tag: Tag,
    pub element_id: Option<String>,
    pub class: String,
    pub title: String,
    pub markup: String,
    pub style: Style,
    pub on_click: Option<Command>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: Tag) -> Self {
        Self {
            tag,
            element_id: None,
            class: String::new(),
            title: String::new(),
            markup: String::new(),
            style: Style {
                visible: true,
                ..Style::default()
            },
            on_click: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class.split_whitespace().any(|name| name == class)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Tag::Div)],
            body: NodeId(0),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_element(&mut self, tag: Tag) -> NodeId {
        self.nodes.push(Node::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Appends `child` as the last child of `parent`, moving it out of its
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(previous) = self.nodes[child.0].parent {
            self.remove_child(previous, child);
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detaches `child` from `parent`. Returns `false` when it was not a
    /// child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.0].children;
        let Some(position) = children.iter().position(|id| *id == child) else {
            return false;
        };
        children.remove(position);
        self.nodes[child.0].parent = None;
        true
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.body {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// First attached node carrying `element_id`, in creation order.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.element_id.as_deref() == Some(element_id))
            .map(|(index, _)| NodeId(index))
            .find(|id| self.is_attached(*id))
    }

    pub fn set_element_id(&mut self, id: NodeId, element_id: impl Into<String>) {
        self.nodes[id.0].element_id = Some(element_id.into());
    }

    pub fn set_class(&mut self, id: NodeId, class: impl Into<String>) {
        self.nodes[id.0].class = class.into();
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let node = &mut self.nodes[id.0];
        if node.has_class(class) {
            return;
        }
        if !node.class.is_empty() {
            node.class.push(' ');
        }
        node.class.push_str(class);
    }

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) {
        self.nodes[id.0].title = title.into();
    }

    pub fn set_markup(&mut self, id: NodeId, markup: impl Into<String>) {
        self.nodes[id.0].markup = markup.into();
    }

    pub fn set_on_click(&mut self, id: NodeId, command: Command) {
        self.nodes[id.0].on_click = Some(command);
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].style.visible = visible;
    }

    pub fn set_size(&mut self, id: NodeId, width: f32, height: f32) {
        let style = &mut self.nodes[id.0].style;
        style.width = width;
        style.height = height;
    }

    pub fn style(&self, id: NodeId) -> &Style {
        &self.nodes[id.0].style
    }

    pub fn style_mut(&mut self, id: NodeId) -> &mut Style {
        &mut self.nodes[id.0].style
    }
}
