//! The command API: a modifier stack with debounced, undoable history.

use std::time::{Duration, Instant};

use crate::command::{Command, CommandError};
use crate::history::{DebouncePolicy, Debouncer, UndoRedoManager};
use crate::modifier::ModifierStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub history_capacity: usize,
    pub debounce: Duration,
    pub debounce_policy: DebouncePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            debounce: Duration::from_millis(300),
            debounce_policy: DebouncePolicy::KeepLast,
        }
    }
}

impl SessionConfig {
    pub fn with_history_capacity(mut self, history_capacity: usize) -> Self {
        self.history_capacity = history_capacity;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_debounce_policy(mut self, debounce_policy: DebouncePolicy) -> Self {
        self.debounce_policy = debounce_policy;
        self
    }
}

/// Owns the live modifier stack and its history.
///
/// Each successful edit schedules a snapshot of the stack as it was before the
/// edit. The snapshot reaches history once the debounce window elapses and the
/// host polls (every `run` polls first). Undo and redo only move the history
/// cursor and adopt the entry under it; at either end they leave the stack alone.
#[derive(Debug, Clone)]
pub struct Session {
    stack: ModifierStack,
    history: UndoRedoManager<ModifierStack>,
    debouncer: Debouncer<ModifierStack>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            stack: ModifierStack::new(),
            history: UndoRedoManager::new(config.history_capacity),
            debouncer: Debouncer::new(config.debounce, config.debounce_policy),
        }
    }

    pub fn stack(&self) -> &ModifierStack {
        &self.stack
    }

    pub fn history(&self) -> &UndoRedoManager<ModifierStack> {
        &self.history
    }

    pub fn has_pending_commit(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Parses and runs one command line.
    pub fn run(&mut self, line: &str) -> Result<(), CommandError> {
        self.run_at(line, Instant::now())
    }

    /// [`Self::run`] with an explicit clock reading.
    pub fn run_at(&mut self, line: &str, now: Instant) -> Result<(), CommandError> {
        self.poll_at(now);
        let command = line.parse::<Command>().inspect_err(|error| {
            tracing::error!("failed to parse command {line:?}: {error}");
        })?;
        self.execute_at(command, now)
    }

    /// Runs an already parsed command.
    pub fn execute_at(&mut self, command: Command, now: Instant) -> Result<(), CommandError> {
        match command {
            Command::Undo => {
                if let Some(previous) = self.history.undo() {
                    self.stack = previous.clone();
                }
                Ok(())
            }
            Command::Redo => {
                if let Some(next) = self.history.redo() {
                    self.stack = next.clone();
                }
                Ok(())
            }
            edit => {
                let backup = self.stack.clone();
                edit.apply_to(&mut self.stack).inspect_err(|error| {
                    tracing::error!("command {edit:?} failed: {error}");
                })?;
                self.debouncer.schedule(backup, now);
                Ok(())
            }
        }
    }

    /// Commits the pending snapshot if its debounce window has elapsed.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(snapshot) => {
                self.record(snapshot);
                true
            }
            None => false,
        }
    }

    /// Commits the pending snapshot immediately.
    pub fn flush(&mut self) -> bool {
        match self.debouncer.flush() {
            Some(snapshot) => {
                self.record(snapshot);
                true
            }
            None => false,
        }
    }

    fn record(&mut self, snapshot: ModifierStack) {
        tracing::debug!(
            "committing stack of {} modifiers to history ({} entries)",
            snapshot.len(),
            self.history.len()
        );
        self.history.commit(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ConfigValue;

    const WINDOW: Duration = Duration::from_millis(300);

    fn names(session: &Session) -> Vec<&str> {
        session
            .stack()
            .iter()
            .map(|element| element.name.as_str())
            .collect()
    }

    #[test]
    fn edits_schedule_a_single_debounced_commit() {
        let start = Instant::now();
        let mut session = Session::default();

        session.run_at("add Sepia", start).unwrap();
        session.run_at("add Noise", start + Duration::from_millis(100)).unwrap();
        assert!(session.history().is_empty());
        assert!(session.has_pending_commit());

        assert!(session.poll_at(start + Duration::from_millis(100) + WINDOW));
        assert_eq!(session.history().len(), 1);
        let committed = session.history().current().unwrap();
        let committed: Vec<&str> = committed.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(committed, ["Sepia"]);
    }

    #[test]
    fn failed_commands_are_not_scheduled() {
        let start = Instant::now();
        let mut session = Session::default();

        assert!(session.run_at("add Posterize", start).is_err());
        assert!(session.run_at("switch 0 1", start).is_err());
        assert!(!session.has_pending_commit());
        assert!(session.stack().is_empty());
    }

    #[test]
    fn undo_and_redo_walk_committed_snapshots() {
        let start = Instant::now();
        let mut session = Session::default();

        session.run_at("add Sepia", start).unwrap();
        session.run_at("add Vignette", start + 2 * WINDOW).unwrap();
        session.run_at("add Noise", start + 4 * WINDOW).unwrap();
        session.poll_at(start + 6 * WINDOW);
        assert_eq!(session.history().len(), 3);
        assert_eq!(names(&session), ["Sepia", "Vignette", "Noise"]);

        session.run_at("undo", start + 6 * WINDOW).unwrap();
        assert_eq!(names(&session), ["Sepia"]);
        session.run_at("undo", start + 6 * WINDOW).unwrap();
        assert!(session.stack().is_empty());
        session.run_at("undo", start + 6 * WINDOW).unwrap();
        assert!(session.stack().is_empty());

        session.run_at("redo", start + 6 * WINDOW).unwrap();
        assert_eq!(names(&session), ["Sepia"]);
        session.run_at("redo", start + 6 * WINDOW).unwrap();
        assert_eq!(names(&session), ["Sepia", "Vignette"]);
        session.run_at("redo", start + 6 * WINDOW).unwrap();
        assert_eq!(names(&session), ["Sepia", "Vignette"]);
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn undo_never_writes_history() {
        let start = Instant::now();
        let mut session = Session::default();

        session.run_at("undo", start).unwrap();
        assert!(session.history().is_empty());

        session.run_at("add Sepia", start).unwrap();
        session.run_at("undo", start).unwrap();
        assert_eq!(names(&session), ["Sepia"]);
        assert!(session.history().is_empty());
        assert!(session.has_pending_commit());

        session.poll_at(start + WINDOW);
        assert_eq!(session.history().len(), 1);
        session.run_at("undo", start + WINDOW).unwrap();
        assert_eq!(names(&session), ["Sepia"]);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn editing_after_undo_drops_the_redo_branch() {
        let start = Instant::now();
        let mut session = Session::default();

        session.run_at("add Sepia", start).unwrap();
        session.run_at("add Noise", start + 2 * WINDOW).unwrap();
        session.run_at("add Vignette", start + 4 * WINDOW).unwrap();
        session.poll_at(start + 6 * WINDOW);
        assert_eq!(session.history().len(), 3);

        session.run_at("undo", start + 6 * WINDOW).unwrap();
        assert_eq!(names(&session), ["Sepia"]);
        assert!(session.history().can_redo());

        session.run_at("add Swirl", start + 6 * WINDOW).unwrap();
        session.poll_at(start + 8 * WINDOW);
        assert!(!session.history().can_redo());
        assert_eq!(session.history().len(), 3);

        session.run_at("redo", start + 8 * WINDOW).unwrap();
        assert_eq!(names(&session), ["Sepia", "Swirl"]);
    }

    #[test]
    fn update_and_switch_flow_through_the_session() {
        let mut session = Session::default();
        session.run("add Sepia").unwrap();
        session.run("add Noise").unwrap();
        session.run("add Vignette").unwrap();

        let id = session.stack().elements()[0].id.clone();
        session.run(&format!("update {id} amount 0.5")).unwrap();
        assert_eq!(
            session.stack().elements()[0].config["amount"],
            ConfigValue::Scalar(0.5)
        );
        assert!(session.run(&format!("update {id} bogus 0.5")).is_err());

        session.run("switch 0 2").unwrap();
        assert_eq!(names(&session), ["Vignette", "Noise", "Sepia"]);
    }

    #[test]
    fn keep_first_policy_commits_the_burst_head() {
        let start = Instant::now();
        let config = SessionConfig::default().with_debounce_policy(DebouncePolicy::KeepFirst);
        let mut session = Session::new(config);

        session.run_at("add Sepia", start).unwrap();
        session.run_at("add Noise", start).unwrap();
        session.poll_at(start + WINDOW);
        assert!(session.history().current().unwrap().is_empty());
    }

    #[test]
    fn history_respects_capacity() {
        let start = Instant::now();
        let mut session = Session::new(SessionConfig::default().with_history_capacity(2));
        for step in 0..5u32 {
            session
                .run_at("add Sepia", start + WINDOW * (2 * step))
                .unwrap();
        }
        session.flush();
        assert_eq!(session.history().len(), 2);
    }
}
