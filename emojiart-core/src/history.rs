//! Undo history of full-state snapshots.
//!
//! Every mutation registers an [`UndoRecord`] holding the state as it was
//! before the mutation. Undoing a step restores those snapshots through the
//! same registration path, so the records registered while undoing form the
//! redo step, and records registered while redoing form the next undo step.
//!
//! Records can be collected into a group that undoes as a single step.
//! At most one group is open at a time; starting a group while one is open
//! is a no-op.

/// A named, reversible step: restoring `snapshot` undoes it.
#[derive(Debug, Clone)]
pub struct UndoRecord<S> {
    /// Human-readable label, e.g. "Move".
    pub label: String,
    /// State prior to the step.
    pub snapshot: S,
}

impl<S> UndoRecord<S> {
    /// Create a record.
    pub fn new(label: impl Into<String>, snapshot: S) -> Self {
        Self {
            label: label.into(),
            snapshot,
        }
    }
}

/// One user-visible undo step.
#[derive(Debug, Clone)]
pub struct UndoGroup<S> {
    label: String,
    records: Vec<UndoRecord<S>>,
}

impl<S> UndoGroup<S> {
    fn new(label: String) -> Self {
        Self {
            label,
            records: Vec::new(),
        }
    }

    /// The label shown for this step.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Records in registration order. Apply them in reverse to undo.
    pub fn into_records(self) -> Vec<UndoRecord<S>> {
        self.records
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Undoing,
    Redoing,
}

/// Undo and redo stacks with grouping.
#[derive(Debug)]
pub struct UndoHistory<S> {
    undo_stack: Vec<UndoGroup<S>>,
    redo_stack: Vec<UndoGroup<S>>,
    /// A group has been started and not yet ended.
    group_open: bool,
    /// The open group already has a slot on the undo stack.
    group_started: bool,
    mode: Mode,
    /// Inverse step collected while undoing or redoing.
    pending: Option<UndoGroup<S>>,
}

impl<S> Default for UndoHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> UndoHistory<S> {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            group_open: false,
            group_started: false,
            mode: Mode::Normal,
            pending: None,
        }
    }

    /// Open a group if none is open.
    pub fn begin_group(&mut self) {
        if self.mode != Mode::Normal || self.group_open {
            return;
        }
        self.group_open = true;
        self.group_started = false;
    }

    /// Close the open group, if any.
    pub fn end_group(&mut self) {
        self.group_open = false;
        self.group_started = false;
    }

    /// Whether a group is currently accumulating records.
    #[must_use]
    pub fn is_group_open(&self) -> bool {
        self.group_open
    }

    /// Register a record.
    ///
    /// Outside of undo/redo this clears the redo stack and either joins the
    /// open group or becomes a step of its own.
    pub fn register(&mut self, record: UndoRecord<S>) {
        match self.mode {
            Mode::Undoing | Mode::Redoing => {
                let pending = self
                    .pending
                    .get_or_insert_with(|| UndoGroup::new(record.label.clone()));
                pending.records.push(record);
            }
            Mode::Normal => {
                self.redo_stack.clear();
                if self.group_open && self.group_started {
                    if let Some(group) = self.undo_stack.last_mut() {
                        group.records.push(record);
                        return;
                    }
                }
                let mut group = UndoGroup::new(record.label.clone());
                group.records.push(record);
                self.undo_stack.push(group);
                if self.group_open {
                    self.group_started = true;
                }
            }
        }
    }

    /// Take the next undo step and enter undo mode.
    ///
    /// Closes any open group first. Returns `None` if there is nothing to
    /// undo. Must be paired with [`UndoHistory::finish`].
    pub fn begin_undo(&mut self) -> Option<UndoGroup<S>> {
        self.end_group();
        let group = self.undo_stack.pop()?;
        self.mode = Mode::Undoing;
        self.pending = Some(UndoGroup::new(group.label.clone()));
        Some(group)
    }

    /// Take the next redo step and enter redo mode.
    ///
    /// Returns `None` if there is nothing to redo. Must be paired with
    /// [`UndoHistory::finish`].
    pub fn begin_redo(&mut self) -> Option<UndoGroup<S>> {
        self.end_group();
        let group = self.redo_stack.pop()?;
        self.mode = Mode::Redoing;
        self.pending = Some(UndoGroup::new(group.label.clone()));
        Some(group)
    }

    /// Leave undo/redo mode, filing the collected inverse step.
    pub fn finish(&mut self) {
        let pending = self.pending.take().filter(|group| !group.records.is_empty());
        match (self.mode, pending) {
            (Mode::Undoing, Some(group)) => self.redo_stack.push(group),
            (Mode::Redoing, Some(group)) => self.undo_stack.push(group),
            _ => {}
        }
        self.mode = Mode::Normal;
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the next undo step.
    #[must_use]
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(UndoGroup::label)
    }

    /// Label of the next redo step.
    #[must_use]
    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(UndoGroup::label)
    }

    /// Number of undo steps.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a history over a plain integer state the way the document does.
    struct Counter {
        value: i32,
        history: UndoHistory<i32>,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                value: 0,
                history: UndoHistory::new(),
            }
        }

        fn set(&mut self, label: &str, value: i32) {
            let prior = self.value;
            self.value = value;
            self.history.register(UndoRecord::new(label, prior));
        }

        fn restore(&mut self, record: UndoRecord<i32>) {
            let prior = self.value;
            self.value = record.snapshot;
            self.history.register(UndoRecord::new(record.label, prior));
        }

        fn undo(&mut self) {
            let group = self.history.begin_undo().expect("undo available");
            for record in group.into_records().into_iter().rev() {
                self.restore(record);
            }
            self.history.finish();
        }

        fn redo(&mut self) {
            let group = self.history.begin_redo().expect("redo available");
            for record in group.into_records().into_iter().rev() {
                self.restore(record);
            }
            self.history.finish();
        }
    }

    #[test]
    fn test_undo_then_redo() {
        let mut counter = Counter::new();
        counter.set("One", 1);
        counter.set("Two", 2);
        assert_eq!(counter.history.undo_label(), Some("Two"));

        counter.undo();
        assert_eq!(counter.value, 1);
        assert!(counter.history.can_redo());
        assert_eq!(counter.history.redo_label(), Some("Two"));

        counter.redo();
        assert_eq!(counter.value, 2);
        assert!(!counter.history.can_redo());
        assert_eq!(counter.history.undo_depth(), 2);
    }

    #[test]
    fn test_new_registration_clears_redo() {
        let mut counter = Counter::new();
        counter.set("One", 1);
        counter.undo();
        assert!(counter.history.can_redo());
        counter.set("Three", 3);
        assert!(!counter.history.can_redo());
    }

    #[test]
    fn test_group_undoes_as_one_step() {
        let mut counter = Counter::new();
        counter.set("Before", 5);
        counter.history.begin_group();
        counter.set("A", 6);
        counter.history.begin_group();
        counter.set("B", 7);
        counter.history.end_group();
        counter.set("After", 8);

        assert_eq!(counter.history.undo_depth(), 3);
        counter.undo();
        assert_eq!(counter.value, 7);
        counter.undo();
        assert_eq!(counter.value, 5);
        counter.redo();
        assert_eq!(counter.value, 7);
        counter.undo();
        assert_eq!(counter.value, 5);
    }

    #[test]
    fn test_empty_group_leaves_no_step() {
        let mut history: UndoHistory<i32> = UndoHistory::new();
        history.begin_group();
        history.end_group();
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_closes_open_group() {
        let mut counter = Counter::new();
        counter.history.begin_group();
        counter.set("A", 1);
        counter.undo();
        assert!(!counter.history.is_group_open());
        counter.set("B", 2);
        assert_eq!(counter.history.undo_depth(), 1);
    }

    #[test]
    fn test_begin_undo_on_empty_history() {
        let mut history: UndoHistory<i32> = UndoHistory::new();
        assert!(history.begin_undo().is_none());
        assert!(history.begin_redo().is_none());
    }
}
