// phase_manager.rs — Runs phase bodies honouring configuration and nesting
//
// `run(phase, body)` skips disabled phases without invoking the body,
// otherwise pushes the phase on an explicit stack of active phases, runs the
// body (which may start its child phases through the same manager) and pops
// the phase again whether the body succeeded or not.
//
// Preconditions: the registry was configured from the run's `Config`.
// Postconditions: `history()` lists every phase started, in start order.
// Failure modes: body errors are propagated unchanged; running a child
//   outside its parent or starting a phase twice is an internal error.
// Side effects: a tracing span per phase; timing lines on stderr when
//   `time_phases` is set.

use std::time::{Duration, Instant};

use crate::error::{InternalErrorKind, PipelineError};
use crate::phase::{PhaseId, PhaseRegistry};

/// How a phase run ended. `Failed` only appears in the history; a failing
/// body surfaces as the `Err` of `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseEvent {
    pub phase: PhaseId,
    pub depth: usize,
    pub outcome: PhaseOutcome,
    pub elapsed: Duration,
}

pub struct PhaseManager<'r> {
    registry: &'r PhaseRegistry,
    active: Vec<PhaseId>,
    history: Vec<PhaseEvent>,
}

impl<'r> PhaseManager<'r> {
    pub fn new(registry: &'r PhaseRegistry) -> Self {
        Self {
            registry,
            active: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn registry(&self) -> &PhaseRegistry {
        self.registry
    }

    /// Run `phase`, invoking `body` only if the phase is enabled.
    pub fn run<F>(&mut self, phase: PhaseId, body: F) -> Result<PhaseOutcome, PipelineError>
    where
        F: FnOnce(&mut Self) -> Result<(), PipelineError>,
    {
        if phase.parent() != self.current() {
            let context = match self.current() {
                Some(active) => format!("inside {}", active),
                None => "at top level".to_string(),
            };
            return Err(PipelineError::internal(
                phase,
                InternalErrorKind::PhaseNesting,
                format!("{} started {}", phase, context),
            ));
        }
        if self.history.iter().any(|e| e.phase == phase) {
            return Err(PipelineError::internal(
                phase,
                InternalErrorKind::PhaseReentry,
                format!("{} already ran in this compilation", phase),
            ));
        }

        let depth = self.active.len();
        if !self.registry.is_enabled(phase) {
            tracing::debug!(phase = %phase, "phase disabled, skipping");
            self.history.push(PhaseEvent {
                phase,
                depth,
                outcome: PhaseOutcome::Skipped,
                elapsed: Duration::ZERO,
            });
            return Ok(PhaseOutcome::Skipped);
        }

        let slot = self.history.len();
        self.history.push(PhaseEvent {
            phase,
            depth,
            outcome: PhaseOutcome::Completed,
            elapsed: Duration::ZERO,
        });

        let span = tracing::info_span!("phase", name = phase.name(), depth);
        let _guard = span.enter();
        tracing::debug!("phase started");

        self.active.push(phase);
        let start = Instant::now();
        let result = body(self);
        let elapsed = start.elapsed();
        self.active.pop();

        let event = &mut self.history[slot];
        event.elapsed = elapsed;
        event.outcome = if result.is_ok() {
            PhaseOutcome::Completed
        } else {
            PhaseOutcome::Failed
        };

        if self.registry.time_phases() {
            eprintln!(
                "ncc: {} complete, {:.1}ms",
                phase.name(),
                elapsed.as_secs_f64() * 1000.0
            );
        }

        match result {
            Ok(()) => {
                tracing::debug!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, "phase completed");
                Ok(PhaseOutcome::Completed)
            }
            Err(err) => {
                tracing::debug!(error = %err, "phase failed");
                Err(err)
            }
        }
    }

    /// Number of phases currently running.
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Running phases, outermost first.
    pub fn active_phases(&self) -> &[PhaseId] {
        &self.active
    }

    pub fn current(&self) -> Option<PhaseId> {
        self.active.last().copied()
    }

    pub fn history(&self) -> &[PhaseEvent] {
        &self.history
    }

    pub fn into_history(self) -> Vec<PhaseEvent> {
        self.history
    }

    /// Phases whose body was invoked, in start order.
    pub fn executed_phases(&self) -> Vec<PhaseId> {
        self.history
            .iter()
            .filter(|e| e.outcome != PhaseOutcome::Skipped)
            .map(|e| e.phase)
            .collect()
    }

    /// Whether `phase` ran to completion.
    pub fn completed(&self, phase: PhaseId) -> bool {
        self.history
            .iter()
            .any(|e| e.phase == phase && e.outcome == PhaseOutcome::Completed)
    }

    /// Whether a state dump was requested after `phase`.
    pub fn should_dump(&self, phase: PhaseId) -> bool {
        self.registry.is_verbose(phase)
    }
}
