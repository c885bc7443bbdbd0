use super::document::{Document, NodeId, Tag};
use super::fx::{Edge, Effects, Slide};
use std::time::Duration;
use tracing::info;

pub const TRACKER_ELEMENT_ID: &str = "statetracker";
pub const TRACKER_TOOLTIP: &str = "Not connected to server.";

const SLIDE_DURATION: Duration = Duration::from_millis(1000);
const VISIBLE_BOTTOM: f32 = 10.0;
const INDICATOR_SIZE: f32 = 32.0;

/// Connectivity indicator. Visible only while the server is unreachable;
/// fed by the liveness prober through [`StateTracker::record`].
#[derive(Debug)]
pub struct StateTracker {
    node: NodeId,
    connected: bool,
}

impl StateTracker {
    pub fn new(doc: &mut Document, fx: &mut impl Effects) -> Self {
        let node = doc.create_element(Tag::Div);
        doc.set_element_id(node, TRACKER_ELEMENT_ID);
        doc.set_title(node, TRACKER_TOOLTIP);
        doc.set_size(node, INDICATOR_SIZE, INDICATOR_SIZE);
        let body = doc.body();
        doc.append_child(body, node);

        let tracker = Self {
            node,
            connected: true,
        };
        tracker.toggle(doc, fx);
        tracker
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Applies one probe result. The indicator only moves when the
    /// connection state actually changes; returns whether it did.
    pub fn record(&mut self, doc: &mut Document, fx: &mut impl Effects, reachable: bool) -> bool {
        if reachable == self.connected {
            return false;
        }

        self.connected = reachable;
        if reachable {
            info!("connection to server restored");
        } else {
            info!("connection to server lost");
        }
        self.toggle(doc, fx);
        true
    }

    /// Slides the indicator below the screen edge when connected, or up into
    /// view when not.
    pub fn toggle(&self, doc: &mut Document, fx: &mut impl Effects) {
        let metrics = fx.metrics(doc, self.node);
        let hide = self.connected;
        let node = self.node;

        let slide = Slide::new(
            node,
            Edge::Bottom,
            if hide { -metrics.height } else { VISIBLE_BOTTOM },
            SLIDE_DURATION,
        );
        let slide = if hide {
            slide.on_finish(move |doc| doc.set_visible(node, false))
        } else {
            slide
        };

        fx.show(doc, node).slide_to(doc, slide);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::fx::Animator;

    fn settle(doc: &mut Document, fx: &mut Animator) {
        fx.advance(doc, Duration::from_secs(2));
    }

    #[test]
    fn starts_connected_and_hidden() {
        let mut doc = Document::new();
        let mut fx = Animator::new(800.0, 600.0);
        let tracker = StateTracker::new(&mut doc, &mut fx);
        settle(&mut doc, &mut fx);

        assert!(tracker.is_connected());
        assert!(!fx.is_visible(&doc, tracker.node()));
        assert_eq!(doc.style(tracker.node()).bottom, -INDICATOR_SIZE);
        assert_eq!(doc.element_by_id(TRACKER_ELEMENT_ID), Some(tracker.node()));
        assert_eq!(doc.node(tracker.node()).title, TRACKER_TOOLTIP);
    }

    #[test]
    fn toggles_only_on_edges() {
        let mut doc = Document::new();
        let mut fx = Animator::new(800.0, 600.0);
        let mut tracker = StateTracker::new(&mut doc, &mut fx);
        settle(&mut doc, &mut fx);

        let probes = [true, true, false, false, true];
        let toggled: Vec<usize> = probes
            .iter()
            .enumerate()
            .filter_map(|(n, reachable)| {
                let changed = tracker.record(&mut doc, &mut fx, *reachable);
                settle(&mut doc, &mut fx);
                changed.then_some(n + 1)
            })
            .collect();

        assert_eq!(toggled, vec![3, 5]);
        assert!(tracker.is_connected());
    }

    #[test]
    fn shows_while_disconnected() {
        let mut doc = Document::new();
        let mut fx = Animator::new(800.0, 600.0);
        let mut tracker = StateTracker::new(&mut doc, &mut fx);
        settle(&mut doc, &mut fx);

        tracker.record(&mut doc, &mut fx, false);
        settle(&mut doc, &mut fx);
        assert!(fx.is_visible(&doc, tracker.node()));
        assert_eq!(doc.style(tracker.node()).bottom, VISIBLE_BOTTOM);
    }
}
