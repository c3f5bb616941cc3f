//! Undo/Redo transaction stack.
//!
//! Every transaction is a **document snapshot** pair: the exported JSON
//! before and after the change. Undo reloads `before`, redo reloads `after`.
//!
//! Drag gestures are batched: the snapshot taken when the gesture starts is
//! paired with the state when it ends, so one drag is one undo step no
//! matter how many pointer moves it took.

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub before: String,
    pub after: String,
    pub description: String,
}

#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    max_depth: usize,
    /// Last committed document state.
    current: String,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    batch_dirty: bool,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(64)),
            redo_stack: Vec::new(),
            max_depth,
            current: String::new(),
            batch_depth: 0,
            batch_dirty: false,
        }
    }

    /// Forget all transactions and treat `snapshot` as the base state.
    pub fn reset(&mut self, snapshot: String) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = snapshot;
        self.batch_depth = 0;
        self.batch_dirty = false;
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// Close a batch. Returns `true` when the outermost batch closed with
    /// pending changes; the caller then commits with `record`.
    pub fn end_batch(&mut self) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        std::mem::take(&mut self.batch_dirty)
    }

    /// Record the document's new state. Inside a batch this only marks the
    /// batch dirty. Returns `true` when a transaction was pushed.
    pub fn record(&mut self, snapshot: String, description: &str) -> bool {
        if self.batch_depth > 0 {
            self.batch_dirty = true;
            return false;
        }
        if snapshot == self.current {
            return false;
        }
        let before = std::mem::replace(&mut self.current, snapshot.clone());
        self.undo_stack.push(Transaction {
            before,
            after: snapshot,
            description: description.to_string(),
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        true
    }

    /// Pop the last transaction; returns the snapshot to load.
    pub fn undo(&mut self) -> Option<(String, String)> {
        let tx = self.undo_stack.pop()?;
        self.current = tx.before.clone();
        let out = (tx.before.clone(), tx.description.clone());
        self.redo_stack.push(tx);
        Some(out)
    }

    pub fn redo(&mut self) -> Option<(String, String)> {
        let tx = self.redo_stack.pop()?;
        self.current = tx.after.clone();
        let out = (tx.after.clone(), tx.description.clone());
        self.undo_stack.push(tx);
        Some(out)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }
}
