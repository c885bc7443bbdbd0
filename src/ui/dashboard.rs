use super::document::{Command, Document, NodeId, Tag};
use super::fx::{Edge, Effects, Slide};
use super::keys::{Key, KeyEvent};
use super::script::InitProgram;
use crate::services::api::{load_items, RequestClient};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DASHBOARD_ELEMENT_ID: &str = "dashboard";
pub const ACTIVE_CLASS: &str = "active";

const SLIDE_DURATION: Duration = Duration::from_millis(500);
const PANEL_WIDTH: f32 = 320.0;
const PANEL_HEIGHT: f32 = 480.0;

/// An item's init hook, before and after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemInit {
    Source(String),
    Loaded(InitProgram),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardItem {
    pub id: String,
    pub title: String,
    pub key: Option<char>,
    pub src: String,
    pub init: Option<ItemInit>,
    pub data: String,
}

impl DashboardItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            key: None,
            src: src.into(),
            init: None,
            data: String::new(),
        }
    }

    pub fn with_key(mut self, key: char) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_init(mut self, init: ItemInit) -> Self {
        self.init = Some(init);
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    pub fn tooltip(&self) -> String {
        match self.key {
            Some(key) => format!("{} (alt+{key})", self.title),
            None => self.title.clone(),
        }
    }

    pub fn init_program(&self) -> Option<&InitProgram> {
        match &self.init {
            Some(ItemInit::Loaded(program)) => Some(program),
            _ => None,
        }
    }

    fn matches_key(&self, ch: char) -> bool {
        self.key
            .is_some_and(|key| key.to_lowercase().eq(ch.to_lowercase()))
    }
}

/// Ordered items plus the selected one. Order is tab order.
#[derive(Debug, Clone, Default)]
pub struct DashboardModel {
    items: Vec<DashboardItem>,
    selected: Option<usize>,
}

impl DashboardModel {
    pub fn new(items: Vec<DashboardItem>) -> Self {
        Self {
            items,
            selected: None,
        }
    }

    pub fn items(&self) -> &[DashboardItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&DashboardItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&DashboardItem> {
        self.selected.and_then(|index| self.items.get(index))
    }

    /// In range and not already selected.
    pub fn can_select(&self, index: usize) -> bool {
        index < self.items.len() && self.selected != Some(index)
    }

    pub fn shortcut_matches(&self, ch: char) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.matches_key(ch))
            .map(|(index, _)| index)
            .collect()
    }

    /// Drops shortcuts already claimed by an earlier item.
    fn dedupe_shortcuts(&mut self) {
        let mut claimed = HashSet::new();
        for item in &mut self.items {
            let Some(key) = item.key else { continue };
            let normalized: String = key.to_lowercase().collect();
            if !claimed.insert(normalized) {
                warn!(item = %item.id, key = %key, "shortcut already in use, ignoring");
                item.key = None;
            }
        }
    }
}

/// The slide-out tabbed panel: a list of item buttons and an overview region
/// showing the selected item's content.
#[derive(Debug)]
pub struct Dashboard {
    title: String,
    model: DashboardModel,
    node: NodeId,
    itemlist: NodeId,
    overview: NodeId,
    list: Option<NodeId>,
    controls: Vec<NodeId>,
}

impl Dashboard {
    pub fn new(doc: &mut Document, id_hint: &str, title: impl Into<String>) -> Self {
        let node = doc.create_element(Tag::Div);
        let itemlist = doc.create_element(Tag::Div);
        let overview = doc.create_element(Tag::Div);

        doc.set_element_id(node, id_hint);
        doc.set_class(itemlist, "items");
        doc.set_class(overview, "overview");
        doc.set_size(node, PANEL_WIDTH, PANEL_HEIGHT);
        doc.set_visible(node, false);

        doc.append_child(node, itemlist);
        doc.append_child(node, overview);
        let body = doc.body();
        doc.append_child(body, node);

        Self {
            title: title.into(),
            model: DashboardModel::default(),
            node,
            itemlist,
            overview,
            list: None,
            controls: Vec::new(),
        }
    }

    /// Fetches the item list and every item's content, then mounts the panel.
    /// Returns `false` when the item list itself could not be fetched.
    pub async fn init<C>(
        &mut self,
        doc: &mut Document,
        fx: &mut impl Effects,
        client: &C,
        list_path: &str,
    ) -> bool
    where
        C: RequestClient + ?Sized,
    {
        match load_items(client, list_path).await {
            Ok(items) => self.mount(doc, fx, items),
            Err(err) => {
                error!(
                    path = list_path,
                    status = ?err.status(),
                    error = %err,
                    "failed to load dashboard item list"
                );
                false
            }
        }
    }

    /// Builds one control per loaded item, selects the first and reveals the
    /// panel.
    pub fn mount(&mut self, doc: &mut Document, fx: &mut impl Effects, items: Vec<DashboardItem>) -> bool {
        if let Some(previous) = self.list.take() {
            doc.remove_child(self.itemlist, previous);
        }

        self.model = DashboardModel::new(items);
        self.model.dedupe_shortcuts();

        let list = doc.create_element(Tag::List);
        let heading_entry = doc.create_element(Tag::ListItem);
        let heading = doc.create_element(Tag::Heading);
        doc.set_markup(heading, self.title.clone());
        doc.append_child(heading_entry, heading);
        doc.append_child(list, heading_entry);

        self.controls.clear();
        for (index, item) in self.model.items().iter().enumerate() {
            let entry = doc.create_element(Tag::ListItem);
            let button = doc.create_element(Tag::Button);
            doc.set_element_id(button, item.id.clone());
            doc.set_title(button, item.tooltip());
            doc.set_markup(button, item.title.clone());
            doc.set_on_click(button, Command::SelectItem(index));
            doc.append_child(entry, button);
            doc.append_child(list, entry);
            self.controls.push(button);
        }

        doc.append_child(self.itemlist, list);
        self.list = Some(list);

        self.select(doc, 0);
        fx.show(doc, self.node);
        info!(items = self.model.len(), "dashboard ready");
        true
    }

    /// Makes `index` the active item. Returns `false` (and changes nothing)
    /// when it is out of range or already active.
    pub fn select(&mut self, doc: &mut Document, index: usize) -> bool {
        if !self.model.can_select(index) {
            return false;
        }

        let item = &self.model.items[index];
        doc.set_markup(self.overview, item.data.clone());
        if let Some(program) = item.init_program() {
            program.run(doc, self.overview);
        }

        for &control in &self.controls {
            doc.set_class(control, "");
        }
        doc.set_class(self.controls[index], ACTIVE_CLASS);

        debug!(index, item = %item.id, "dashboard item selected");
        self.model.selected = Some(index);
        true
    }

    pub fn on_key(&mut self, doc: &mut Document, fx: &mut impl Effects, event: &mut KeyEvent) {
        if !event.alt {
            return;
        }

        if event.key == Key::Tilde {
            self.toggle(doc, fx);
        }

        let Some(ch) = event.char() else { return };
        for index in self.model.shortcut_matches(ch) {
            if !fx.is_visible(doc, self.node) {
                self.toggle(doc, fx);
            }
            self.select(doc, index);
            event.stop_propagation();
        }
    }

    /// Slides the panel out to the left, or back in. The panel is hidden once
    /// it has fully slid out.
    pub fn toggle(&self, doc: &mut Document, fx: &mut impl Effects) {
        let metrics = fx.metrics(doc, self.node);
        let hide = metrics.left == 0.0;
        let node = self.node;

        let slide = Slide::new(
            node,
            Edge::Left,
            if hide { -metrics.width } else { 0.0 },
            SLIDE_DURATION,
        );
        let slide = if hide {
            slide.on_finish(move |doc| doc.set_visible(node, false))
        } else {
            slide
        };

        fx.show(doc, node).slide_to(doc, slide);
    }

    pub fn model(&self) -> &DashboardModel {
        &self.model
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn overview(&self) -> NodeId {
        self.overview
    }

    pub fn control(&self, index: usize) -> Option<NodeId> {
        self.controls.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api::test_support::StubClient;
    use crate::services::api::Payload;
    use crate::ui::fx::Animator;
    use crate::ui::script::InitStep;
    use serde_json::json;

    fn setup() -> (Document, Animator, Dashboard) {
        let mut doc = Document::new();
        let fx = Animator::new(1024.0, 768.0);
        let dashboard = Dashboard::new(&mut doc, DASHBOARD_ELEMENT_ID, "DCPU IDE");
        (doc, fx, dashboard)
    }

    fn files_and_build() -> Vec<DashboardItem> {
        vec![
            DashboardItem::new("a", "Files", "/dashboard/a.html").with_data("<p>files</p>"),
            DashboardItem::new("b", "Build", "/dashboard/b.html")
                .with_key('b')
                .with_data("<p>build</p>"),
        ]
    }

    fn active_controls(doc: &Document, dashboard: &Dashboard) -> Vec<usize> {
        (0..dashboard.model().len())
            .filter(|index| {
                let control = dashboard.control(*index).unwrap();
                doc.node(control).has_class(ACTIVE_CLASS)
            })
            .collect()
    }

    fn settle(doc: &mut Document, fx: &mut Animator) {
        fx.advance(doc, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn init_loads_items_and_selects_first() {
        let client = StubClient::default()
            .with(
                "/dashboard/itemlist.js",
                Payload::Json(json!([
                    { "id": "a", "title": "Files", "src": "/dashboard/a.html" },
                    { "id": "b", "title": "Build", "key": "b", "src": "/dashboard/b.html" }
                ])),
            )
            .with("/dashboard/a.html", Payload::Markup("<p>files</p>".into()))
            .with("/dashboard/b.html", Payload::Markup("<p>build</p>".into()));
        let (mut doc, mut fx, mut dashboard) = setup();

        assert!(
            dashboard
                .init(&mut doc, &mut fx, &client, "/dashboard/itemlist.js")
                .await
        );

        assert_eq!(dashboard.model().selected(), Some(0));
        assert_eq!(doc.node(dashboard.overview()).markup, "<p>files</p>");
        assert_eq!(active_controls(&doc, &dashboard), vec![0]);
        assert!(fx.is_visible(&doc, dashboard.node()));

        let build = doc.element_by_id("b").unwrap();
        assert_eq!(doc.node(build).title, "Build (alt+b)");
        assert_eq!(doc.node(build).on_click, Some(Command::SelectItem(1)));
    }

    #[tokio::test]
    async fn init_fails_without_item_list() {
        let client = StubClient::default();
        let (mut doc, mut fx, mut dashboard) = setup();

        assert!(
            !dashboard
                .init(&mut doc, &mut fx, &client, "/dashboard/itemlist.js")
                .await
        );
        assert!(dashboard.model().is_empty());
        assert!(!fx.is_visible(&doc, dashboard.node()));
    }

    #[tokio::test]
    async fn failed_item_keeps_empty_content() {
        let client = StubClient::default()
            .with(
                "/dashboard/itemlist.js",
                Payload::Json(json!([
                    { "id": "a", "title": "Files", "src": "/dashboard/a.html" },
                    { "id": "b", "title": "Build", "src": "/dashboard/b.html" }
                ])),
            )
            .with("/dashboard/b.html", Payload::Markup("<p>build</p>".into()));
        let (mut doc, mut fx, mut dashboard) = setup();

        assert!(
            dashboard
                .init(&mut doc, &mut fx, &client, "/dashboard/itemlist.js")
                .await
        );
        assert_eq!(dashboard.model().get(0).unwrap().data, "");
        assert_eq!(dashboard.model().get(1).unwrap().data, "<p>build</p>");
        assert_eq!(dashboard.model().selected(), Some(0));
    }

    #[test]
    fn exactly_one_control_is_active() {
        let (mut doc, mut fx, mut dashboard) = setup();
        let items = (0..5)
            .map(|n| DashboardItem::new(format!("item{n}"), format!("Item {n}"), "/x.html"))
            .collect();
        assert!(dashboard.mount(&mut doc, &mut fx, items));
        assert_eq!(active_controls(&doc, &dashboard), vec![0]);

        assert!(dashboard.select(&mut doc, 3));
        assert_eq!(active_controls(&doc, &dashboard), vec![3]);
        assert_eq!(dashboard.model().selected(), Some(3));
    }

    #[test]
    fn reselecting_is_a_no_op() {
        let (mut doc, mut fx, mut dashboard) = setup();
        let program = InitProgram::new(vec![InitStep::AddClass {
            target: None,
            class: "initialised".into(),
        }]);
        let items = vec![
            DashboardItem::new("a", "Files", "/a.html")
                .with_data("<p>files</p>")
                .with_init(ItemInit::Loaded(program)),
        ];
        dashboard.mount(&mut doc, &mut fx, items);
        assert!(doc.node(dashboard.overview()).has_class("initialised"));

        doc.set_markup(dashboard.overview(), "scribbled");
        doc.set_class(dashboard.overview(), "overview");
        assert!(!dashboard.select(&mut doc, 0));
        assert_eq!(doc.node(dashboard.overview()).markup, "scribbled");
        assert!(!doc.node(dashboard.overview()).has_class("initialised"));
    }

    #[test]
    fn out_of_range_selection_changes_nothing() {
        let (mut doc, mut fx, mut dashboard) = setup();
        dashboard.mount(&mut doc, &mut fx, files_and_build());

        assert!(!dashboard.select(&mut doc, 2));
        assert!(!dashboard.select(&mut doc, usize::MAX));
        assert_eq!(dashboard.model().selected(), Some(0));
        assert_eq!(active_controls(&doc, &dashboard), vec![0]);
    }

    #[test]
    fn select_stores_the_requested_index() {
        let (mut doc, mut fx, mut dashboard) = setup();
        let items = (0..3)
            .map(|n| DashboardItem::new(format!("i{n}"), "Item", "/x.html"))
            .collect();
        dashboard.mount(&mut doc, &mut fx, items);

        dashboard.select(&mut doc, 1);
        assert_eq!(dashboard.model().selected(), Some(1));
    }

    #[test]
    fn toggling_twice_restores_panel() {
        let (mut doc, mut fx, mut dashboard) = setup();
        dashboard.mount(&mut doc, &mut fx, files_and_build());
        let before = fx.metrics(&doc, dashboard.node());

        dashboard.toggle(&mut doc, &mut fx);
        settle(&mut doc, &mut fx);
        assert!(!fx.is_visible(&doc, dashboard.node()));
        assert_eq!(doc.style(dashboard.node()).left, -PANEL_WIDTH);

        dashboard.toggle(&mut doc, &mut fx);
        settle(&mut doc, &mut fx);
        assert!(fx.is_visible(&doc, dashboard.node()));
        assert_eq!(fx.metrics(&doc, dashboard.node()), before);
    }

    #[test]
    fn shortcut_reveals_hidden_panel_and_selects() {
        let (mut doc, mut fx, mut dashboard) = setup();
        dashboard.mount(&mut doc, &mut fx, files_and_build());
        assert_eq!(doc.node(dashboard.overview()).markup, "<p>files</p>");

        let mut tilde = KeyEvent::alt(Key::Tilde);
        dashboard.on_key(&mut doc, &mut fx, &mut tilde);
        settle(&mut doc, &mut fx);
        assert!(!fx.is_visible(&doc, dashboard.node()));

        let mut build = KeyEvent::alt(Key::Char('B'));
        dashboard.on_key(&mut doc, &mut fx, &mut build);
        assert!(fx.is_visible(&doc, dashboard.node()));
        assert_eq!(dashboard.model().selected(), Some(1));
        assert!(!build.is_propagating());

        settle(&mut doc, &mut fx);
        assert_eq!(doc.style(dashboard.node()).left, 0.0);
    }

    #[test]
    fn keys_without_alt_are_ignored() {
        let (mut doc, mut fx, mut dashboard) = setup();
        dashboard.mount(&mut doc, &mut fx, files_and_build());

        let mut build = KeyEvent::new(Key::Char('b'), false);
        dashboard.on_key(&mut doc, &mut fx, &mut build);
        assert_eq!(dashboard.model().selected(), Some(0));
        assert!(build.is_propagating());
        assert!(fx.is_idle());
    }

    #[test]
    fn duplicate_shortcuts_keep_first_owner() {
        let (mut doc, mut fx, mut dashboard) = setup();
        let items = vec![
            DashboardItem::new("a", "Files", "/a.html"),
            DashboardItem::new("b", "Build", "/b.html").with_key('b'),
            DashboardItem::new("c", "Breakpoints", "/c.html").with_key('B'),
        ];
        dashboard.mount(&mut doc, &mut fx, items);

        assert_eq!(dashboard.model().get(2).unwrap().key, None);
        assert_eq!(dashboard.model().shortcut_matches('b'), vec![1]);
        let breakpoints = doc.element_by_id("c").unwrap();
        assert_eq!(doc.node(breakpoints).title, "Breakpoints");
    }

    #[test]
    fn remount_replaces_previous_controls() {
        let (mut doc, mut fx, mut dashboard) = setup();
        dashboard.mount(&mut doc, &mut fx, files_and_build());
        dashboard.mount(
            &mut doc,
            &mut fx,
            vec![DashboardItem::new("c", "Console", "/c.html").with_data("console")],
        );

        assert_eq!(doc.element_by_id("a"), None);
        assert!(doc.element_by_id("c").is_some());
        assert_eq!(dashboard.model().selected(), Some(0));
        assert_eq!(doc.node(dashboard.overview()).markup, "console");
    }
}
