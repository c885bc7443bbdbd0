//! Show/hide, geometry and slide animations for document nodes.

use super::document::{Anchor, Document, NodeId};
use std::fmt;
use std::time::Duration;
use tracing::trace;

pub type FinishFn = Box<dyn FnOnce(&mut Document)>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub width: f32,
    pub height: f32,
    pub left: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Top,
    Bottom,
}

/// Offsets to set without animating. `None` leaves an offset untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub bottom: Option<f32>,
}

/// A linear transition of one offset of one node.
pub struct Slide {
    pub node: NodeId,
    pub edge: Edge,
    pub to: f32,
    pub duration: Duration,
    pub on_finish: Option<FinishFn>,
}

impl Slide {
    pub fn new(node: NodeId, edge: Edge, to: f32, duration: Duration) -> Self {
        Self {
            node,
            edge,
            to,
            duration,
            on_finish: None,
        }
    }

    pub fn on_finish(mut self, finish: impl FnOnce(&mut Document) + 'static) -> Self {
        self.on_finish = Some(Box::new(finish));
        self
    }
}

impl fmt::Debug for Slide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slide")
            .field("node", &self.node)
            .field("edge", &self.edge)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// Effects engine the panels drive. Mutating calls return `&mut Self` so
/// they chain: `fx.show(doc, node).slide_to(doc, slide)`.
pub trait Effects {
    fn show(&mut self, doc: &mut Document, node: NodeId) -> &mut Self;
    fn hide(&mut self, doc: &mut Document, node: NodeId) -> &mut Self;
    fn is_visible(&self, doc: &Document, node: NodeId) -> bool;
    fn metrics(&self, doc: &Document, node: NodeId) -> Metrics;
    /// Geometry of the whole screen.
    fn viewport(&self) -> Metrics;
    fn move_to(&mut self, doc: &mut Document, node: NodeId, placement: Placement) -> &mut Self;
    fn slide_to(&mut self, doc: &mut Document, slide: Slide) -> &mut Self;
}

struct Running {
    node: NodeId,
    edge: Edge,
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
    on_finish: Option<FinishFn>,
}

impl Running {
    fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Time-stepped [`Effects`] implementation. The host calls [`Animator::advance`]
/// once per frame; tests call it with whatever step they need.
pub struct Animator {
    viewport: (f32, f32),
    running: Vec<Running>,
}

impl Animator {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: (width, height),
            running: Vec::new(),
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn advance(&mut self, doc: &mut Document, dt: Duration) {
        for slide in &mut self.running {
            slide.elapsed += dt;
            let value = slide.from + (slide.to - slide.from) * slide.progress();
            set_offset(doc, slide.node, slide.edge, value);
        }

        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.running)
            .into_iter()
            .partition(Running::is_done);
        self.running = running;

        for slide in done {
            trace!(node = ?slide.node, edge = ?slide.edge, to = slide.to, "slide finished");
            if let Some(finish) = slide.on_finish {
                finish(doc);
            }
        }
    }
}

fn offset(doc: &Document, node: NodeId, edge: Edge) -> f32 {
    let style = doc.style(node);
    match edge {
        Edge::Left => style.left,
        Edge::Top => style.top,
        Edge::Bottom => style.bottom,
    }
}

fn set_offset(doc: &mut Document, node: NodeId, edge: Edge, value: f32) {
    let style = doc.style_mut(node);
    match edge {
        Edge::Left => style.left = value,
        Edge::Top => {
            style.top = value;
            style.anchor = Anchor::Top;
        }
        Edge::Bottom => {
            style.bottom = value;
            style.anchor = Anchor::Bottom;
        }
    }
}

impl Effects for Animator {
    fn show(&mut self, doc: &mut Document, node: NodeId) -> &mut Self {
        doc.set_visible(node, true);
        self
    }

    fn hide(&mut self, doc: &mut Document, node: NodeId) -> &mut Self {
        doc.set_visible(node, false);
        self
    }

    fn is_visible(&self, doc: &Document, node: NodeId) -> bool {
        doc.style(node).visible
    }

    fn metrics(&self, doc: &Document, node: NodeId) -> Metrics {
        let style = doc.style(node);
        Metrics {
            width: style.width,
            height: style.height,
            left: style.left,
            top: style.top,
            bottom: style.bottom,
        }
    }

    fn viewport(&self) -> Metrics {
        let (width, height) = self.viewport;
        Metrics {
            width,
            height,
            ..Metrics::default()
        }
    }

    fn move_to(&mut self, doc: &mut Document, node: NodeId, placement: Placement) -> &mut Self {
        if let Some(left) = placement.left {
            set_offset(doc, node, Edge::Left, left);
        }
        if let Some(top) = placement.top {
            set_offset(doc, node, Edge::Top, top);
        }
        if let Some(bottom) = placement.bottom {
            set_offset(doc, node, Edge::Bottom, bottom);
        }
        self
    }

    fn slide_to(&mut self, doc: &mut Document, slide: Slide) -> &mut Self {
        // Last writer wins: a newer slide of the same offset replaces the old one.
        self.running
            .retain(|running| !(running.node == slide.node && running.edge == slide.edge));

        let running = Running {
            node: slide.node,
            edge: slide.edge,
            from: offset(doc, slide.node, slide.edge),
            to: slide.to,
            duration: slide.duration,
            elapsed: Duration::ZERO,
            on_finish: slide.on_finish,
        };
        self.running.push(running);

        if slide.duration.is_zero() {
            self.advance(doc, Duration::ZERO);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::document::Tag;
    use std::cell::Cell;
    use std::rc::Rc;

    fn node(doc: &mut Document) -> NodeId {
        let node = doc.create_element(Tag::Div);
        let body = doc.body();
        doc.append_child(body, node);
        doc.set_size(node, 200.0, 100.0);
        node
    }

    #[test]
    fn slides_linearly_and_finishes_once() {
        let mut doc = Document::new();
        let mut fx = Animator::new(800.0, 600.0);
        let panel = node(&mut doc);
        let finished = Rc::new(Cell::new(0));

        let counter = finished.clone();
        fx.slide_to(
            &mut doc,
            Slide::new(panel, Edge::Left, -200.0, Duration::from_millis(500))
                .on_finish(move |_| counter.set(counter.get() + 1)),
        );

        fx.advance(&mut doc, Duration::from_millis(250));
        assert_eq!(doc.style(panel).left, -100.0);
        assert_eq!(finished.get(), 0);

        fx.advance(&mut doc, Duration::from_millis(300));
        assert_eq!(doc.style(panel).left, -200.0);
        assert_eq!(finished.get(), 1);
        assert!(fx.is_idle());

        fx.advance(&mut doc, Duration::from_millis(300));
        assert_eq!(finished.get(), 1);
    }

    #[test]
    fn newer_slide_supersedes_in_flight_one() {
        let mut doc = Document::new();
        let mut fx = Animator::new(800.0, 600.0);
        let panel = node(&mut doc);
        let superseded = Rc::new(Cell::new(false));

        let flag = superseded.clone();
        fx.slide_to(
            &mut doc,
            Slide::new(panel, Edge::Left, -200.0, Duration::from_millis(500))
                .on_finish(move |_| flag.set(true)),
        );
        fx.advance(&mut doc, Duration::from_millis(250));
        fx.slide_to(
            &mut doc,
            Slide::new(panel, Edge::Left, 0.0, Duration::from_millis(100)),
        );
        fx.advance(&mut doc, Duration::from_millis(1000));

        assert_eq!(doc.style(panel).left, 0.0);
        assert!(!superseded.get());
    }

    #[test]
    fn zero_duration_slides_complete_immediately() {
        let mut doc = Document::new();
        let mut fx = Animator::new(800.0, 600.0);
        let panel = node(&mut doc);

        fx.show(&mut doc, panel).slide_to(
            &mut doc,
            Slide::new(panel, Edge::Bottom, 10.0, Duration::ZERO)
                .on_finish(move |doc| doc.set_visible(panel, false)),
        );

        assert_eq!(doc.style(panel).bottom, 10.0);
        assert_eq!(doc.style(panel).anchor, Anchor::Bottom);
        assert!(!fx.is_visible(&doc, panel));
    }

    #[test]
    fn move_to_sets_only_given_offsets() {
        let mut doc = Document::new();
        let mut fx = Animator::new(800.0, 600.0);
        let panel = node(&mut doc);
        doc.style_mut(panel).left = 42.0;

        fx.move_to(
            &mut doc,
            panel,
            Placement {
                top: Some(250.0),
                ..Placement::default()
            },
        );

        let metrics = fx.metrics(&doc, panel);
        assert_eq!(metrics.left, 42.0);
        assert_eq!(metrics.top, 250.0);
        assert_eq!(metrics.width, 200.0);
    }
}
