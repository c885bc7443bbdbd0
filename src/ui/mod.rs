mod dashboard;
mod dialog;
mod document;
mod fx;
mod keys;
mod render;
mod script;
mod state_tracker;
mod theme;

pub use dashboard::{Dashboard, DashboardItem, ItemInit, DASHBOARD_ELEMENT_ID};
pub use dialog::{Dialog, DialogStack};
pub use document::{Command, Document};
pub use fx::Animator;
pub use keys::KeyEvent;
pub use render::paint;
pub use script::InitProgram;
pub use state_tracker::StateTracker;
pub use theme::apply_theme;
