//! Mutation journal: every architectural write performed by an
//! instruction is recorded as a [`Diff`] so a completed step can be
//! undone and a faulting one rolled back.

use crate::cache::RecorderState;
use crate::state::Xlen;

/// One recorded mutation: the location touched and the value it held at
/// capture time. Applying a diff writes that value back.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(bound(
        serialize = "X::Reg: serde::Serialize",
        deserialize = "X::Reg: serde::Deserialize<'de>"
    ))
)]
pub enum Diff<X: Xlen> {
    /// An integer register write.
    Register {
        /// Register number, 0 to 31.
        index: usize,
        /// Captured register value.
        value: X::Reg,
    },
    /// A floating-point register write.
    FloatRegister {
        /// Register number, 0 to 31.
        index: usize,
        /// Captured raw bit pattern.
        bits: u64,
    },
    /// A program-counter update.
    Pc {
        /// Captured program counter.
        value: X::Reg,
    },
    /// A store's four-byte memory window, captured at the store's own
    /// base address rather than a word boundary.
    MemoryWord {
        /// First byte address of the captured window.
        addr: u32,
        /// Little-endian word read from `addr`.
        value: u32,
    },
    /// A heap-break move.
    HeapEnd {
        /// Captured heap break.
        value: u32,
    },
    /// A cache-recorder update, captured as a whole snapshot.
    CacheAccess {
        /// Captured recorder state.
        state: RecorderState,
    },
}

/// Undo stack: one batch of prior-value diffs per committed step.
#[derive(Debug, Clone, Default)]
pub struct History<X: Xlen> {
    batches: Vec<Vec<Diff<X>>>,
}

impl<X: Xlen> History<X> {
    /// Empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            batches: Vec::new(),
        }
    }

    /// Number of undoable steps.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.batches.len()
    }

    /// True when nothing can be undone.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Pushes the prior-value batch of a committed step.
    pub fn push(&mut self, batch: Vec<Diff<X>>) {
        self.batches.push(batch);
    }

    /// Pops the most recent batch.
    pub fn pop(&mut self) -> Option<Vec<Diff<X>>> {
        self.batches.pop()
    }
}

/// In-flight journal for the step being executed.
///
/// The before buffer collects prior values as locations are about to be
/// written; the after buffer collects the values actually written. On
/// success the before batch moves to the [`History`] and the after batch
/// is handed to the caller; on a mid-step fault the before batch is
/// replayed in reverse to put the state back.
#[derive(Debug, Clone, Default)]
pub struct StepTransaction<X: Xlen> {
    before: Vec<Diff<X>>,
    after: Vec<Diff<X>>,
}

impl<X: Xlen> StepTransaction<X> {
    /// Empty transaction.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Discards both buffers at the start of a step.
    pub fn begin(&mut self) {
        self.before.clear();
        self.after.clear();
    }

    /// Records the prior value of a location about to be written.
    pub fn record_before(&mut self, diff: Diff<X>) {
        self.before.push(diff);
    }

    /// Records the value a location now holds.
    pub fn record_after(&mut self, diff: Diff<X>) {
        self.after.push(diff);
    }

    /// Commits a completed step: the before batch becomes the undo
    /// record, the after batch is returned.
    pub fn commit(&mut self, history: &mut History<X>) -> Vec<Diff<X>> {
        history.push(core::mem::take(&mut self.before));
        core::mem::take(&mut self.after)
    }

    /// Abandons a faulted step, yielding the before batch in reverse
    /// capture order for replay.
    pub fn take_rollback(&mut self) -> Vec<Diff<X>> {
        self.after.clear();
        let mut batch = core::mem::take(&mut self.before);
        batch.reverse();
        batch
    }
}
