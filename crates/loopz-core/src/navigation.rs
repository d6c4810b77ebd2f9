//! Navigation between the three top-level views.
//!
//! ```text
//!   ┌─────────┐  go_to_dashboard  ┌───────────┐  go_to_detail(id)  ┌────────┐
//!   │ landing │ ────────────────▶ │ dashboard │ ─────────────────▶ │ detail │
//!   └─────────┘ ◀──────────────── └───────────┘ ◀───────────────── └────────┘
//!                 go_to_landing                    go_back
//! ```
//!
//! Every transition remembers the layer it left so that [`Navigator::go_back`]
//! can return one level. The machine has no terminal state.
//!
//! The `go_*` methods move regardless of the transitioning flag. Interactive
//! callers go through [`Navigator::guarded`], which refuses to start a
//! transition while an earlier one is unfinished.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the mutually exclusive top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Signed-out entry screen
    #[default]
    Landing,
    /// List of the user's loops
    Dashboard,
    /// One loop with its tasks and the assistant
    Detail,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Landing => "landing",
            Layer::Dashboard => "dashboard",
            Layer::Detail => "detail",
        }
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landing" => Ok(Layer::Landing),
            "dashboard" => Ok(Layer::Dashboard),
            "detail" => Ok(Layer::Detail),
            _ => Err(format!("Invalid layer: {s}")),
        }
    }
}

/// State machine tracking the active layer and the loop shown in detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigator {
    current: Layer,
    previous: Option<Layer>,
    active_loop_id: Option<String>,
    /// Loop that was open in detail when `previous` was recorded
    previous_loop_id: Option<String>,
    transitioning: bool,
}

impl Navigator {
    /// A navigator on the landing layer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Layer {
        self.current
    }

    /// Layer a single [`go_back`](Self::go_back) returns to.
    pub fn previous(&self) -> Option<Layer> {
        self.previous
    }

    /// Loop shown by the detail layer; `None` on every other layer.
    pub fn active_loop_id(&self) -> Option<&str> {
        self.active_loop_id.as_deref()
    }

    /// Whether a transition started and has not been finished yet.
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Returns to the landing layer, e.g. after signing out.
    pub fn go_to_landing(&mut self) -> bool {
        self.transition(Layer::Landing, None)
    }

    pub fn go_to_dashboard(&mut self) -> bool {
        self.transition(Layer::Dashboard, None)
    }

    /// Opens a loop in the detail layer.
    pub fn go_to_detail(&mut self, loop_id: impl Into<String>) -> bool {
        self.transition(Layer::Detail, Some(loop_id.into()))
    }

    /// Returns to the previously recorded layer.
    ///
    /// Does nothing when no previous layer is recorded. Going back clears
    /// the record, so two calls in a row do not walk further back.
    pub fn go_back(&mut self) -> bool {
        let Some(destination) = self.previous.take() else {
            return false;
        };
        let restored = self.previous_loop_id.take();
        self.current = destination;
        self.active_loop_id = if destination == Layer::Detail {
            restored
        } else {
            None
        };
        self.transitioning = true;
        true
    }

    /// Runs `transition` unless an earlier one has not been finished.
    ///
    /// Returns `false` without touching the navigator while transitioning.
    pub fn guarded<F>(&mut self, transition: F) -> bool
    where
        F: FnOnce(&mut Self) -> bool,
    {
        if self.transitioning {
            return false;
        }
        transition(self)
    }

    /// Marks the running transition as done.
    pub fn finish_transition(&mut self) {
        self.transitioning = false;
    }

    /// Moves to `layer`. Returns `false` when already there with the same
    /// loop.
    fn transition(&mut self, layer: Layer, loop_id: Option<String>) -> bool {
        if self.current == layer && self.active_loop_id == loop_id {
            return false;
        }
        self.previous = Some(self.current);
        self.previous_loop_id = self.active_loop_id.take();
        self.current = layer;
        self.active_loop_id = loop_id;
        self.transitioning = true;
        true
    }
}
