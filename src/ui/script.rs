//! Init programs: the loaded form of a dashboard item's init script.
//!
//! The script endpoint returns a JSON array of steps. Each step names an
//! operation and, optionally, the element id it targets; without a target
//! the step applies to the region the program runs in (the overview).

use super::document::{Document, NodeId};
use crate::services::api::Payload;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InitStep {
    SetMarkup {
        #[serde(default)]
        target: Option<String>,
        markup: String,
    },
    SetTitle {
        #[serde(default)]
        target: Option<String>,
        title: String,
    },
    AddClass {
        #[serde(default)]
        target: Option<String>,
        class: String,
    },
    Show {
        #[serde(default)]
        target: Option<String>,
    },
    Hide {
        #[serde(default)]
        target: Option<String>,
    },
}

impl InitStep {
    fn target(&self) -> Option<&str> {
        match self {
            InitStep::SetMarkup { target, .. }
            | InitStep::SetTitle { target, .. }
            | InitStep::AddClass { target, .. }
            | InitStep::Show { target }
            | InitStep::Hide { target } => target.as_deref(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("init script is not structured data")]
    NotStructured,
    #[error("invalid init script: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct InitProgram {
    steps: Vec<InitStep>,
}

impl InitProgram {
    pub fn new(steps: Vec<InitStep>) -> Self {
        Self { steps }
    }

    pub fn from_payload(payload: Payload) -> Result<Self, ScriptError> {
        match payload {
            Payload::Json(value) => Ok(serde_json::from_value(value)?),
            Payload::Markup(_) => Err(ScriptError::NotStructured),
        }
    }

    pub fn steps(&self) -> &[InitStep] {
        &self.steps
    }

    /// Applies every step and returns how many found their target.
    pub fn run(&self, doc: &mut Document, scope: NodeId) -> usize {
        let mut applied = 0;
        for step in &self.steps {
            let node = match step.target() {
                Some(element_id) => match doc.element_by_id(element_id) {
                    Some(node) => node,
                    None => {
                        debug!(element_id, "init step target not found");
                        continue;
                    }
                },
                None => scope,
            };

            match step {
                InitStep::SetMarkup { markup, .. } => doc.set_markup(node, markup.clone()),
                InitStep::SetTitle { title, .. } => doc.set_title(node, title.clone()),
                InitStep::AddClass { class, .. } => doc.add_class(node, class),
                InitStep::Show { .. } => doc.set_visible(node, true),
                InitStep::Hide { .. } => doc.set_visible(node, false),
            }
            applied += 1;
        }
        applied
    }
}
