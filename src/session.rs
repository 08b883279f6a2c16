// src/session.rs
// Plot session state machine and dataset combination

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::axis_names::{AggregateAxis, PlotAxis, AGGREGATE_FIELDS, COMPARISON_FIELDS};
use crate::data_analysis::aggregate_store::AggregateStore;
use crate::data_input::trial_data::AcquisitionMode;

/// What kind of chart a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotMode {
    /// One series per trial, plotted against per-sample fields.
    Continuous,
    /// One point per trial from the aggregate snapshot.
    Aggregate,
    /// One point per trial ID shared by two protocols.
    Comparison,
}

impl fmt::Display for PlotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlotMode::Continuous => "continuous",
            PlotMode::Aggregate => "aggregate",
            PlotMode::Comparison => "comparison",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SelectMode,
    SelectAxes,
    Render,
    AwaitAction,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    Save,
    ChangeX(PlotAxis),
    ChangeY(PlotAxis),
    SwapAxes,
    /// Highlight trials carrying a tag, or clear the highlight with `None`.
    Highlight(Option<String>),
    /// Restrict the active trials to these filenames; empty re-activates every trial.
    ToggleTrials(Vec<String>),
    Quit,
}

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    NeedsRender,
    NeedsReaggregate(Vec<String>),
    /// Save the current chart under this file stem.
    Save(String),
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("'{action}' is not allowed while in state {state:?}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
    #[error("axis '{axis}' is not available for {mode} plots")]
    AxisNotAllowed { axis: String, mode: PlotMode },
    #[error("{0}")]
    Unsupported(String),
}

/// Drives one plotting conversation. Holds no data; the caller renders,
/// saves and re-aggregates when told to by the returned [`Effect`].
#[derive(Debug, Clone)]
pub struct PlotSession {
    state: SessionState,
    mode: Option<PlotMode>,
    x: Option<PlotAxis>,
    y: Option<PlotAxis>,
    highlight: Option<String>,
}

impl Default for PlotSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::SelectMode,
            mode: None,
            x: None,
            y: None,
            highlight: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Option<PlotMode> {
        self.mode
    }

    pub fn axes(&self) -> Option<(&PlotAxis, &PlotAxis)> {
        self.x.as_ref().zip(self.y.as_ref())
    }

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    pub fn select_mode(&mut self, mode: PlotMode) -> Result<(), SessionError> {
        self.expect_state(SessionState::SelectMode, "select mode")?;
        self.mode = Some(mode);
        self.state = SessionState::SelectAxes;
        debug!(%mode, "plot mode selected");
        Ok(())
    }

    pub fn select_axes(&mut self, x: PlotAxis, y: PlotAxis) -> Result<Effect, SessionError> {
        self.expect_state(SessionState::SelectAxes, "select axes")?;
        self.check_axis(&x)?;
        self.check_axis(&y)?;
        self.x = Some(x);
        self.y = Some(y);
        self.state = SessionState::Render;
        Ok(Effect::NeedsRender)
    }

    /// Acknowledges that the driver has drawn the current chart.
    pub fn rendered(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Render, "mark rendered")?;
        self.state = SessionState::AwaitAction;
        Ok(())
    }

    pub fn apply(&mut self, action: MenuAction) -> Result<Effect, SessionError> {
        self.expect_state(SessionState::AwaitAction, "apply action")?;
        let effect = match action {
            MenuAction::Save => return Ok(Effect::Save(self.plot_stem())),
            MenuAction::ChangeX(axis) => {
                self.check_axis(&axis)?;
                self.x = Some(axis);
                Effect::NeedsRender
            }
            MenuAction::ChangeY(axis) => {
                self.check_axis(&axis)?;
                self.y = Some(axis);
                Effect::NeedsRender
            }
            MenuAction::SwapAxes => {
                std::mem::swap(&mut self.x, &mut self.y);
                Effect::NeedsRender
            }
            MenuAction::Highlight(tag) => {
                if self.mode == Some(PlotMode::Comparison) {
                    return Err(SessionError::Unsupported(
                        "highlighting is not available for comparison plots".to_string(),
                    ));
                }
                self.highlight = tag;
                Effect::NeedsRender
            }
            MenuAction::ToggleTrials(filenames) => {
                if self.mode == Some(PlotMode::Comparison) {
                    return Err(SessionError::Unsupported(
                        "trial selection is not available for comparison plots".to_string(),
                    ));
                }
                Effect::NeedsReaggregate(filenames)
            }
            MenuAction::Quit => {
                self.state = SessionState::Finished;
                return Ok(Effect::Quit);
            }
        };
        self.state = SessionState::Render;
        Ok(effect)
    }

    /// File stem for the current chart: `<x>_vs_<y>[_highlight_<tag>]`.
    pub fn plot_stem(&self) -> String {
        let label = |axis: &Option<PlotAxis>| axis.as_ref().map(|a| a.label().to_string()).unwrap_or_default();
        let mut stem = format!("{}_vs_{}", label(&self.x), label(&self.y));
        if let Some(tag) = &self.highlight {
            stem.push_str("_highlight_");
            stem.push_str(tag);
        }
        stem
    }

    fn expect_state(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn check_axis(&self, axis: &PlotAxis) -> Result<(), SessionError> {
        let allowed = match (self.mode, axis) {
            (Some(PlotMode::Continuous), PlotAxis::Continuous(_)) => true,
            (Some(PlotMode::Aggregate), PlotAxis::Aggregate(AggregateAxis::Field(f))) => AGGREGATE_FIELDS.contains(f),
            (Some(PlotMode::Aggregate), PlotAxis::Aggregate(AggregateAxis::Feature(_))) => true,
            (Some(PlotMode::Comparison), PlotAxis::Aggregate(AggregateAxis::Field(f))) => COMPARISON_FIELDS.contains(f),
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(SessionError::AxisNotAllowed {
                axis: axis.label().to_string(),
                mode: self.mode.unwrap_or(PlotMode::Aggregate),
            })
        }
    }
}

/// The actions a non-interactive run queues after selecting axes: an
/// optional trial selection and highlight, then save and quit. Requests the
/// mode cannot honour are logged and left out so the chart is still saved.
pub fn batch_actions(mode: PlotMode, trials: &[String], highlight: Option<&str>) -> Vec<MenuAction> {
    let mut actions = Vec::new();
    if !trials.is_empty() {
        if mode == PlotMode::Comparison {
            warn!(trials = trials.len(), "trial selection does not apply to comparison plots, ignoring");
        } else {
            actions.push(MenuAction::ToggleTrials(trials.to_vec()));
        }
    }
    if let Some(tag) = highlight {
        if mode == PlotMode::Comparison {
            warn!(tag, "highlighting does not apply to comparison plots, ignoring");
        } else {
            actions.push(MenuAction::Highlight(Some(tag.to_string())));
        }
    }
    actions.push(MenuAction::Save);
    actions.push(MenuAction::Quit);
    actions
}

/// The datasets a session works on after loading one or two directories.
#[derive(Debug)]
pub enum Datasets {
    Single(AggregateStore),
    Comparison {
        penetration: AggregateStore,
        shear: AggregateStore,
    },
}

impl Datasets {
    pub fn is_comparison(&self) -> bool {
        matches!(self, Datasets::Comparison { .. })
    }
}

/// Same-protocol stores are concatenated; a penetration and a shear store
/// are kept apart for cross-referencing. An empty store takes the mode of
/// the other.
pub fn combine_stores(first: AggregateStore, second: AggregateStore) -> Datasets {
    match (first.mode(), second.mode()) {
        (Some(a), Some(b)) if a != b => {
            info!("datasets use different protocols, comparing by trial ID");
            let (penetration, shear) = if a == AcquisitionMode::Penetration {
                (first, second)
            } else {
                (second, first)
            };
            Datasets::Comparison { penetration, shear }
        }
        _ => {
            info!("datasets share a protocol, concatenating");
            let mut combined = first;
            combined.extend(second.into_collection());
            combined.reaggregate();
            Datasets::Single(combined)
        }
    }
}
