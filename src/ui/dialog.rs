//! Modal dialogs and the registry of open ones.

use super::document::{Command, Document, NodeId, Tag};
use super::fx::{Edge, Effects, Placement, Slide};
use super::keys::{Key, KeyEvent};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

const SLIDE_DURATION: Duration = Duration::from_millis(800);
const PARKED_LEFT: f32 = -10000.0;
const FRAME_WIDTH: f32 = 420.0;
const FRAME_HEIGHT: f32 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogId(u64);

/// Open dialogs in the order they were opened; the last one receives
/// keyboard input. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct DialogStack {
    open: Rc<RefCell<Vec<DialogId>>>,
    next_id: Rc<Cell<u64>>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> DialogId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        DialogId(id)
    }

    /// Returns `false` if the dialog is already on the stack.
    pub fn push(&self, id: DialogId) -> bool {
        let mut open = self.open.borrow_mut();
        if open.contains(&id) {
            return false;
        }
        open.push(id);
        true
    }

    /// Removes `id` wherever it sits in the stack.
    pub fn remove(&self, id: DialogId) -> bool {
        let mut open = self.open.borrow_mut();
        match open.iter().position(|entry| *entry == id) {
            Some(position) => {
                open.remove(position);
                true
            }
            None => false,
        }
    }

    pub fn top(&self) -> Option<DialogId> {
        self.open.borrow().last().copied()
    }

    pub fn contains(&self, id: DialogId) -> bool {
        self.open.borrow().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.open.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.borrow().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    /// Informational; has no value.
    Notice,
    /// Offers buttons; the value is the label of the one chosen.
    Confirm,
}

/// Dialog body: markup, or an existing node moved into the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Markup(String),
    Node(NodeId),
}

impl From<&str> for Content {
    fn from(markup: &str) -> Self {
        Content::Markup(markup.to_string())
    }
}

impl From<String> for Content {
    fn from(markup: String) -> Self {
        Content::Markup(markup)
    }
}

impl From<NodeId> for Content {
    fn from(node: NodeId) -> Self {
        Content::Node(node)
    }
}

#[derive(Debug)]
pub struct Dialog {
    id: DialogId,
    kind: DialogKind,
    stack: DialogStack,
    node: NodeId,
    frame: NodeId,
    title: NodeId,
    body: NodeId,
    buttons: NodeId,
    choice: Option<String>,
    closing: bool,
}

impl Dialog {
    pub fn new(doc: &mut Document, stack: &DialogStack) -> Self {
        Self::build(doc, stack, DialogKind::Notice)
    }

    pub fn confirm(doc: &mut Document, stack: &DialogStack, labels: &[&str]) -> Self {
        let dialog = Self::build(doc, stack, DialogKind::Confirm);
        for label in labels {
            let button = doc.create_element(Tag::Button);
            doc.set_markup(button, *label);
            doc.set_on_click(
                button,
                Command::DialogButton {
                    dialog: dialog.id,
                    button: label.to_string(),
                },
            );
            doc.append_child(dialog.buttons, button);
        }
        dialog
    }

    fn build(doc: &mut Document, stack: &DialogStack, kind: DialogKind) -> Self {
        let node = doc.create_element(Tag::Div);
        let frame = doc.create_element(Tag::Div);
        let title = doc.create_element(Tag::Div);
        let body = doc.create_element(Tag::Div);
        let buttons = doc.create_element(Tag::Div);

        doc.set_class(node, "dialog");
        doc.set_class(frame, "frame");
        doc.set_class(title, "title");
        doc.set_class(body, "body");
        doc.set_class(buttons, "buttons");
        doc.set_visible(node, false);
        doc.set_visible(frame, false);
        doc.set_size(frame, FRAME_WIDTH, FRAME_HEIGHT);
        doc.style_mut(frame).left = PARKED_LEFT;

        doc.append_child(node, frame);
        doc.append_child(frame, title);
        doc.append_child(frame, body);
        doc.append_child(frame, buttons);

        Self {
            id: stack.allocate(),
            kind,
            stack: stack.clone(),
            node,
            frame,
            title,
            body,
            buttons,
            choice: None,
            closing: false,
        }
    }

    pub fn id(&self) -> DialogId {
        self.id
    }

    pub fn kind(&self) -> &DialogKind {
        &self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn frame(&self) -> NodeId {
        self.frame
    }

    pub fn is_open(&self) -> bool {
        self.stack.contains(self.id)
    }

    pub fn set_title(&mut self, doc: &mut Document, text: &str) -> &mut Self {
        doc.set_markup(self.title, text);
        self
    }

    pub fn set_content(&mut self, doc: &mut Document, content: impl Into<Content>) -> &mut Self {
        for child in doc.children(self.body).to_vec() {
            doc.remove_child(self.body, child);
        }
        match content.into() {
            Content::Markup(markup) => doc.set_markup(self.body, markup),
            Content::Node(node) => {
                doc.set_markup(self.body, "");
                doc.append_child(self.body, node);
            }
        }
        self
    }

    /// The dialog's result. Notices have none.
    pub fn value(&self) -> Option<Value> {
        match self.kind {
            DialogKind::Notice => None,
            DialogKind::Confirm => self.choice.clone().map(Value::String),
        }
    }

    /// Records the pressed button and closes the dialog.
    pub fn choose(&mut self, doc: &mut Document, fx: &mut impl Effects, button: &str) {
        debug!(dialog = ?self.id, button, "dialog button chosen");
        self.choice = Some(button.to_string());
        self.close(doc, fx);
    }

    pub fn on_key(&mut self, doc: &mut Document, fx: &mut impl Effects, event: &mut KeyEvent) {
        if event.key == Key::Escape {
            self.close(doc, fx);
            event.stop_propagation();
        }
    }

    /// Registers the dialog as open and slides it in from the left to the
    /// middle of the screen. Opening a dialog that is still sliding out keeps
    /// its stack entry and cancels the pending removal.
    pub fn open(&mut self, doc: &mut Document, fx: &mut impl Effects) -> &mut Self {
        if !self.stack.push(self.id) && !self.closing {
            warn!(dialog = ?self.id, "dialog is already open");
            return self;
        }
        self.closing = false;

        let body = doc.body();
        doc.append_child(body, self.node);
        fx.show(doc, self.node).show(doc, self.frame);

        let screen = fx.viewport();
        let frame = fx.metrics(doc, self.frame);
        fx.move_to(
            doc,
            self.frame,
            Placement {
                left: Some(-frame.width),
                top: Some(screen.height / 2.0 - frame.height / 2.0),
                bottom: None,
            },
        )
        .slide_to(
            doc,
            Slide::new(
                self.frame,
                Edge::Left,
                screen.width / 2.0 - frame.width / 2.0,
                SLIDE_DURATION,
            ),
        );
        self
    }

    /// Slides the dialog off to the right; once out of view it is detached
    /// and dropped from the stack.
    pub fn close(&mut self, doc: &mut Document, fx: &mut impl Effects) -> &mut Self {
        if !self.is_open() {
            debug!(dialog = ?self.id, "close ignored, dialog is not open");
            return self;
        }

        let screen = fx.viewport();
        let node = self.node;
        let id = self.id;
        let stack = self.stack.clone();
        self.closing = true;

        fx.slide_to(
            doc,
            Slide::new(self.frame, Edge::Left, screen.width, SLIDE_DURATION).on_finish(
                move |doc| {
                    let body = doc.body();
                    doc.remove_child(body, node);
                    stack.remove(id);
                },
            ),
        );
        self
    }
}
