//! Async runner for a mounted gate.
//!
//! ARCHITECTURE
//! ============
//! `mount` spawns one task per gate. The task merges three sources in a
//! biased `select!`: host commands (path changes, unmount), session
//! snapshots, and the bounded wait. Commands are polled first so an unmount
//! always beats a timer that became ready in the same tick.
//!
//! LIFECYCLE
//! =========
//! The task ends as soon as the attempt settles. Dropping or unmounting the
//! `GateHandle` clears the shared `live` flag and aborts the task, which drops
//! the pending wait with it. Abort does not wait for a task already running on
//! another worker, so the runner checks `live` before every host effect.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::attempt::{GateAttempt, GateEffect};
use super::notice::Notice;
use super::redirect::Redirect;
use super::{GateOutcome, GateView};
use crate::config::GateConfig;
use crate::session::SessionState;

/// Host-side effects of a gate: navigation and toasts.
pub trait GateSink: Send + Sync {
    fn redirect(&self, redirect: &Redirect);
    fn notify(&self, notice: &Notice);
}

#[derive(Debug)]
enum GateCommand {
    Navigate(String),
}

/// Owning handle for one mounted gate.
#[derive(Debug)]
pub struct GateHandle {
    id: Uuid,
    view: watch::Receiver<GateView>,
    commands: mpsc::UnboundedSender<GateCommand>,
    live: Arc<AtomicBool>,
    task: Option<JoinHandle<GateOutcome>>,
}

impl GateHandle {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// What the host should currently render.
    #[must_use]
    pub fn view(&self) -> GateView {
        *self.view.borrow()
    }

    #[must_use]
    pub fn watch_view(&self) -> watch::Receiver<GateView> {
        self.view.clone()
    }

    /// Tell a pending gate that the guarded location changed.
    pub fn navigate(&self, path: impl Into<String>) {
        // A settled gate has already dropped its receiver.
        let _ = self.commands.send(GateCommand::Navigate(path.into()));
    }

    /// Wait for the gate to settle.
    pub async fn outcome(mut self) -> GateOutcome {
        let Some(task) = self.task.take() else {
            return GateOutcome::Unmounted;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(gate = %self.id, error = %e, "gate task did not complete");
                GateOutcome::Unmounted
            }
        }
    }

    /// Unmount the gate. A pending wait is cancelled and nothing fires later.
    pub fn unmount(mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            debug!(gate = %self.id, "gate unmounted");
            task.abort();
        }
    }
}

impl Drop for GateHandle {
    fn drop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Mount a gate for `path` on the current tokio runtime.
///
/// The current session snapshot is evaluated before this returns, so a
/// session that is already resolved settles the view immediately.
pub fn mount(
    mut session: watch::Receiver<SessionState>,
    path: impl Into<String>,
    config: GateConfig,
    sink: Arc<dyn GateSink>,
) -> GateHandle {
    let id = Uuid::new_v4();
    let mut attempt = GateAttempt::new(path, config);
    let (view_tx, view_rx) = watch::channel(GateView::Loading);
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();

    let live = Arc::new(AtomicBool::new(true));
    let mut runner = Runner { id, sink, view: view_tx, deadline: None, live: live.clone() };
    let initial = session.borrow_and_update().clone();
    debug!(gate = %id, path = attempt.path(), loading = initial.is_loading, "gate mounted");
    runner.apply(attempt.mount(&initial));

    let task = tokio::spawn(runner.run(attempt, session, commands_rx));
    GateHandle { id, view: view_rx, commands: commands_tx, live, task: Some(task) }
}

struct Runner {
    id: Uuid,
    sink: Arc<dyn GateSink>,
    view: watch::Sender<GateView>,
    /// Epoch and instant of the single outstanding wait.
    deadline: Option<(u64, Instant)>,
    /// Cleared by the handle on unmount.
    live: Arc<AtomicBool>,
}

impl Runner {
    async fn run(
        mut self,
        mut attempt: GateAttempt,
        mut session: watch::Receiver<SessionState>,
        mut commands: mpsc::UnboundedReceiver<GateCommand>,
    ) -> GateOutcome {
        let mut session_open = true;
        loop {
            if let Some(outcome) = attempt.outcome() {
                return outcome;
            }
            let deadline = self.deadline;
            let effects = tokio::select! {
                biased;
                cmd = commands.recv() => match cmd {
                    Some(GateCommand::Navigate(path)) => {
                        let state = session.borrow().clone();
                        debug!(gate = %self.id, %path, "guarded path changed");
                        attempt.change_path(path, &state)
                    }
                    None => return GateOutcome::Unmounted,
                },
                changed = session.changed(), if session_open => match changed {
                    Ok(()) => {
                        let state = session.borrow_and_update().clone();
                        attempt.observe(&state)
                    }
                    Err(_) => {
                        warn!(gate = %self.id, "session service closed; waiting for bounded wait");
                        session_open = false;
                        Vec::new()
                    }
                },
                epoch = wait_for(deadline), if deadline.is_some() => {
                    debug!(gate = %self.id, epoch, "bounded wait elapsed");
                    attempt.timer_fired(epoch)
                }
            };
            self.apply(effects);
        }
    }

    fn apply(&mut self, effects: Vec<GateEffect>) {
        for effect in effects {
            if !self.live.load(Ordering::SeqCst) {
                debug!(gate = %self.id, "gate unmounted; dropping remaining effects");
                return;
            }
            match effect {
                GateEffect::ArmTimer { epoch, after } => {
                    self.deadline = Some((epoch, Instant::now() + after));
                }
                GateEffect::CancelTimer => self.deadline = None,
                GateEffect::Notify(notice) => self.sink.notify(&notice),
                GateEffect::Redirect(redirect) => {
                    info!(gate = %self.id, to = %redirect.to, from = %redirect.state.from, "redirecting to login");
                    self.sink.redirect(&redirect);
                }
                GateEffect::Render(view) => {
                    self.view.send_replace(view);
                }
            }
        }
    }
}

async fn wait_for(deadline: Option<(u64, Instant)>) -> u64 {
    match deadline {
        Some((epoch, at)) => {
            tokio::time::sleep_until(at).await;
            epoch
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
