//! `domkey simulate`: drive a controller with key presses against a fixture tree.

use std::{fmt, sync::Arc};

use config::{Config, FocusId};
use domkey_dom::MemDom;
use domkey_engine::{Controller, Listener, Options, Outcome, ResolvedTarget};
use keybind::{Chord, KeyEvent, Keyboard, Press};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{Error, Result};

/// What to press and how.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Chords to press, in order.
    pub presses: Vec<String>,
    /// Focus id to set before the first press.
    pub focus: Option<String>,
    /// Whether lookups poll.
    pub poll: bool,
}

/// What one press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressReport {
    /// Chord as given.
    pub press: String,
    /// Outcome of each action the press ran; empty when nothing was bound.
    pub outcomes: Vec<Outcome>,
    /// Listener notes: `(step, element)`.
    pub steps: Vec<(usize, String)>,
    /// Elements clicked, described.
    pub clicks: Vec<String>,
}

impl fmt::Display for PressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "press {}:", self.press)?;
        if self.outcomes.is_empty() {
            return writeln!(f, " not bound");
        }
        for outcome in &self.outcomes {
            match outcome {
                Outcome::Triggered => write!(f, " triggered")?,
                Outcome::Denied => write!(f, " denied")?,
                Outcome::Completed { steps } => write!(f, " completed, {steps} step(s)")?,
            }
        }
        writeln!(f)?;
        for (index, el) in &self.steps {
            writeln!(f, "  step {index}: {el}")?;
        }
        if !self.clicks.is_empty() {
            writeln!(f, "  clicked: {}", self.clicks.join(", "))?;
        }
        Ok(())
    }
}

/// Turn a chord spec into the event a host would deliver for it.
fn event_for(spec: &str) -> Result<KeyEvent> {
    let chord = Chord::parse(spec).ok_or_else(|| Error::BadPress(spec.to_string()))?;
    Ok(chord
        .modifiers
        .iter()
        .fold(KeyEvent::new(chord.key.clone()), |ev, m| ev.with_modifier(*m)))
}

/// Press every key in `plan` against `dom`.
///
/// Presses go through a [`Keyboard`] so binding and filtering behave as in a
/// host; the controller's press hook queues each matched shortcut and the
/// action runs here, so its outcome can be reported.
pub async fn simulate(cfg: Config, dom: Arc<MemDom>, plan: &Plan) -> Result<Vec<PressReport>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let keyboard = Arc::new(Keyboard::new());
    let options = Options::new(cfg).with_pressed(Arc::new(move |press: &Press, _: &Controller| {
        tx.send(press.shortcut.clone()).ok();
    }));
    let ctl = Controller::new(dom.clone(), keyboard.clone(), options)?;

    let notes: Arc<Mutex<Vec<(usize, String)>>> = Arc::default();
    let n = notes.clone();
    let d = dom.clone();
    let listener: Listener = Arc::new(move |t: &ResolvedTarget, i: usize, _: &str| {
        if let Some(el) = t.element() {
            n.lock().push((i, d.describe(el)));
        }
    });
    ctl.on(listener);
    if let Some(id) = &plan.focus {
        ctl.set_focus_id(Some(FocusId::new(id.as_str())));
    }

    let mut reports = Vec::new();
    for press in &plan.presses {
        let event = event_for(press)?;
        dom.clear_clicks();
        notes.lock().clear();
        let fired = keyboard.press(&event);
        debug!(press, fired, "simulate_press");
        let mut outcomes = Vec::new();
        while let Ok(shortcut) = rx.try_recv() {
            outcomes.push(ctl.action(&shortcut, None, plan.poll).await);
        }
        reports.push(PressReport {
            press: press.clone(),
            outcomes,
            steps: notes.lock().clone(),
            clicks: dom.clicks().into_iter().map(|el| dom.describe(el)).collect(),
        });
    }
    Ok(reports)
}
