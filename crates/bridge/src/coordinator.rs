// CDP Bridge - Chrome DevTools Protocol bridge for embedded script engines
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Synchronization between the engine thread and control commands.
//!
//! The engine calls [`DebugCoordinator::on_step`] before statements and
//! [`DebugCoordinator::on_break`] at breakpoints. When the coordinator decides
//! to halt, the engine thread parks on a single-slot channel until a control
//! command (`resume`, `step*`) arrives from a protocol thread:
//!
//! ```text
//!   engine thread                      protocol thread
//!   ─────────────                      ───────────────
//!   on_pause ── Halted ── Paused ──▶   client sees Debugger.paused
//!   blocking_recv ...                  step_over(): Halted -> Running, send(Over)
//!   ◀───────────────────────────────── token
//!   Resumed, return Over
//! ```
//!
//! Only the caller that moves the session from `Halted` to `Running` sends a
//! token, so the channel holds at most one and a command issued while the
//! engine runs never releases a later pause.
//!
//! The engine thread must not be a tokio worker: the wait uses
//! [`mpsc::Receiver::blocking_recv`].

use std::sync::Arc;

use cdp_bridge_common::types::PauseReason;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::debuggee::{DebugInfo, StepMode};

/// Coordinator notifications, delivered on the engine thread.
#[derive(Debug, Clone)]
pub enum DebugNotification<O> {
    /// The engine halted and is waiting for a command
    Paused {
        /// Engine state at the halt
        info: Arc<DebugInfo<O>>,
        /// Protocol pause reason
        reason: PauseReason,
    },
    /// The engine was released and is running again
    Resumed,
}

/// Receives [`DebugNotification`]s.
pub type NotificationListener<O> = Box<dyn Fn(DebugNotification<O>) + Send + Sync>;

/// Execution state of the engine thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Executing, or between hooks
    Running,
    /// Parked inside a hook
    Halted,
}

#[derive(Debug)]
struct DebugSession<O> {
    state: ExecutionState,
    /// Whether the step hook halts
    armed: bool,
    /// Set by `pause`, consumed by the next halt
    pause_requested: bool,
    /// No client will ever resume; hooks return immediately
    detached: bool,
    current: Option<Arc<DebugInfo<O>>>,
}

/// Owner of the debug session state.
pub struct DebugCoordinator<O> {
    session: Mutex<DebugSession<O>>,
    resume_tx: mpsc::Sender<StepMode>,
    resume_rx: Mutex<mpsc::Receiver<StepMode>>,
    listener: NotificationListener<O>,
}

impl<O> DebugCoordinator<O> {
    /// Create a coordinator. With `pause_on_start` the first step hook halts.
    pub fn new(pause_on_start: bool, listener: NotificationListener<O>) -> Self {
        let (resume_tx, resume_rx) = mpsc::channel(1);
        Self {
            session: Mutex::new(DebugSession {
                state: ExecutionState::Running,
                armed: pause_on_start,
                pause_requested: false,
                detached: false,
                current: None,
            }),
            resume_tx,
            resume_rx: Mutex::new(resume_rx),
            listener,
        }
    }

    /// Step hook. Halts only while interception is armed.
    pub fn on_step(&self, info: DebugInfo<O>) -> StepMode {
        {
            let session = self.session.lock();
            if session.detached {
                return StepMode::None;
            }
            if !session.armed {
                return StepMode::Into;
            }
        }
        self.on_pause(info)
    }

    /// Breakpoint hook. Always halts.
    pub fn on_break(&self, info: DebugInfo<O>) -> StepMode {
        if self.session.lock().detached {
            return StepMode::None;
        }
        self.on_pause(info)
    }

    /// Halt the engine thread until a control command arrives, and return
    /// the step mode it carried.
    pub fn on_pause(&self, info: DebugInfo<O>) -> StepMode {
        let info = Arc::new(info);
        let reason = {
            let mut session = self.session.lock();
            // Must be checked under the lock that sets `Halted`.
            if session.detached {
                return StepMode::None;
            }
            session.armed = true;
            session.state = ExecutionState::Halted;
            session.current = Some(info.clone());
            if std::mem::take(&mut session.pause_requested) {
                PauseReason::DebugCommand
            } else {
                PauseReason::Other
            }
        };

        debug!(?reason, pause_type = ?info.pause_type, "Engine halted");
        (self.listener)(DebugNotification::Paused { info, reason });

        let mode = match self.resume_rx.lock().blocking_recv() {
            Some(mode) => mode,
            None => {
                warn!("Resume channel closed while halted");
                StepMode::Into
            }
        };

        {
            let mut session = self.session.lock();
            session.state = ExecutionState::Running;
            session.current = None;
        }

        debug!(?mode, "Engine resumed");
        (self.listener)(DebugNotification::Resumed);
        mode
    }

    /// Release a halted engine with `mode`. Returns whether a token was sent.
    fn release(&self, session: &mut DebugSession<O>, mode: StepMode) -> bool {
        if session.state != ExecutionState::Halted {
            trace!(?mode, "Engine not halted, ignoring release");
            return false;
        }
        session.state = ExecutionState::Running;
        if let Err(err) = self.resume_tx.try_send(mode) {
            warn!(%err, "Failed to release engine");
            return false;
        }
        true
    }

    /// Run freely until the next breakpoint.
    pub fn resume(&self) -> bool {
        let mut session = self.session.lock();
        session.armed = false;
        session.pause_requested = false;
        self.release(&mut session, StepMode::Into)
    }

    /// Halt before the next statement.
    pub fn step_into(&self) -> bool {
        self.step(StepMode::Into)
    }

    /// Halt at the next statement of the current or an outer frame.
    pub fn step_over(&self) -> bool {
        self.step(StepMode::Over)
    }

    /// Halt at the next statement of an outer frame.
    pub fn step_out(&self) -> bool {
        self.step(StepMode::Out)
    }

    fn step(&self, mode: StepMode) -> bool {
        let mut session = self.session.lock();
        self.release(&mut session, mode)
    }

    /// Arm interception so the next step hook halts. Does not block.
    pub fn pause(&self) {
        let mut session = self.session.lock();
        session.armed = true;
        session.pause_requested = true;
    }

    /// Whether the engine thread is parked
    pub fn is_halted(&self) -> bool {
        self.session.lock().state == ExecutionState::Halted
    }

    /// Whether the step hook currently halts
    pub fn is_armed(&self) -> bool {
        self.session.lock().armed
    }

    /// Engine state of the current halt
    pub fn current_pause(&self) -> Option<Arc<DebugInfo<O>>> {
        self.session.lock().current.clone()
    }

    /// Stop halting for good and release a parked engine.
    pub fn detach(&self) {
        let mut session = self.session.lock();
        session.detached = true;
        session.armed = false;
        self.release(&mut session, StepMode::None);
    }
}

impl<O> std::fmt::Debug for DebugCoordinator<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.lock();
        f.debug_struct("DebugCoordinator")
            .field("state", &session.state)
            .field("armed", &session.armed)
            .field("detached", &session.detached)
            .finish_non_exhaustive()
    }
}
