//! Bounded undo/redo history and the debounced commit that feeds it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Cursor-addressed history capped at a maximum length.
#[derive(Debug, Clone)]
pub struct UndoRedoManager<T> {
    history: VecDeque<T>,
    cursor: usize,
    max_length: usize,
}

impl<T> UndoRedoManager<T> {
    pub fn new(max_length: usize) -> Self {
        Self {
            history: VecDeque::new(),
            cursor: 0,
            max_length: max_length.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Index of the entry under the cursor, `None` while empty.
    pub fn cursor(&self) -> Option<usize> {
        (!self.history.is_empty()).then_some(self.cursor)
    }

    pub fn current(&self) -> Option<&T> {
        self.cursor().and_then(|cursor| self.history.get(cursor))
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.history.is_empty() && self.cursor < self.history.len() - 1
    }

    /// Drops the redo tail, appends `item`, evicts the oldest entry beyond the
    /// cap and moves the cursor to the end.
    pub fn commit(&mut self, item: T) {
        self.discard_redo();
        self.history.push_back(item);
        if self.history.len() > self.max_length {
            self.history.pop_front();
        }
        self.cursor = self.history.len() - 1;
    }

    /// Drops every entry after the cursor.
    pub fn discard_redo(&mut self) {
        if !self.history.is_empty() {
            self.history.truncate(self.cursor + 1);
        }
    }

    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.history.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.history.get(self.cursor)
    }
}

/// Which payload a burst of scheduled calls delivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebouncePolicy {
    /// The most recently scheduled payload.
    #[default]
    KeepLast,
    /// The first payload scheduled since the last delivery.
    KeepFirst,
}

/// Cooperative trailing-edge debouncer. Each schedule restarts the quiet
/// window; the payload is released by the first poll after it elapses.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    policy: DebouncePolicy,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration, policy: DebouncePolicy) -> Self {
        Self {
            delay,
            policy,
            pending: None,
        }
    }

    pub fn schedule(&mut self, payload: T, now: Instant) {
        let deadline = now + self.delay;
        if self.policy == DebouncePolicy::KeepFirst {
            if let Some((_, pending_deadline)) = self.pending.as_mut() {
                *pending_deadline = deadline;
                return;
            }
        }
        self.pending = Some((payload, deadline));
    }

    /// Releases the pending payload once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.flush(),
            _ => None,
        }
    }

    /// Releases the pending payload immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(payload, _)| payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_moves_cursor_to_end() {
        let mut history = UndoRedoManager::new(10);
        assert_eq!(history.current(), None);
        history.commit(1);
        history.commit(2);
        assert_eq!(history.current(), Some(&2));
        assert_eq!(history.cursor(), Some(1));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_and_redo_stop_at_the_ends() {
        let mut history = UndoRedoManager::new(10);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);

        history.commit("a");
        history.commit("b");
        assert_eq!(history.undo(), Some(&"a"));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&"b"));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn undo_after_redo_round_trips() {
        let mut history = UndoRedoManager::new(10);
        for entry in 0..4 {
            history.commit(entry);
        }
        history.undo();
        history.undo();
        let before = history.current().copied();
        history.redo();
        history.undo();
        assert_eq!(history.current().copied(), before);
    }

    #[test]
    fn commit_drops_redo_tail() {
        let mut history = UndoRedoManager::new(10);
        history.commit(1);
        history.commit(2);
        history.commit(3);
        history.undo();
        history.undo();
        history.commit(4);
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.redo(), Some(&4));
        assert!(!history.can_redo());
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut history = UndoRedoManager::new(3);
        for entry in 0..10 {
            history.commit(entry);
            assert!(history.len() <= 3);
        }
        assert_eq!(history.current(), Some(&9));
        assert_eq!(history.undo(), Some(&8));
        assert_eq!(history.undo(), Some(&7));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn discard_redo_keeps_cursor_entry() {
        let mut history = UndoRedoManager::new(10);
        history.commit('a');
        history.commit('b');
        history.undo();
        history.discard_redo();
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Some(&'a'));
    }

    #[test]
    fn debouncer_releases_after_quiet_window() {
        let start = Instant::now();
        let delay = Duration::from_millis(300);
        let mut debouncer = Debouncer::new(delay, DebouncePolicy::KeepLast);

        debouncer.schedule(1, start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert_eq!(debouncer.poll(start + delay), Some(1));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn rescheduling_restarts_the_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300), DebouncePolicy::KeepLast);

        debouncer.schedule(1, start);
        debouncer.schedule(2, start + Duration::from_millis(200));
        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), Some(2));
    }

    #[test]
    fn keep_first_retains_the_burst_head() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300), DebouncePolicy::KeepFirst);

        debouncer.schedule(1, start);
        debouncer.schedule(2, start + Duration::from_millis(100));
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(400)));
        assert_eq!(debouncer.flush(), Some(1));
        assert_eq!(debouncer.flush(), None);
    }
}
