//! Cache-access instrumentation: classifies each memory access as a hit
//! or a miss against an idealized cache with unbounded capacity, so a
//! program's locality can be inspected without modelling eviction.

use std::collections::HashSet;

/// Default line size in bytes.
pub const DEFAULT_LINE_BYTES: u32 = 16;

/// Whether an access read or wrote memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// A load.
    Read,
    /// A store.
    Write,
}

/// Complete recorder state, cloneable for journaling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RecorderState {
    reads: u64,
    writes: u64,
    hits: u64,
    misses: u64,
    seen: HashSet<u64>,
}

/// Hit/miss recorder. Each memory operation counts as one access,
/// whatever its width; the first access to a line is a miss and every
/// later one is a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecorder {
    line_bytes: u32,
    state: RecorderState,
}

impl CacheRecorder {
    /// Recorder with the given line size.
    ///
    /// # Panics
    ///
    /// Panics unless `line_bytes` is a power of two.
    #[must_use]
    pub fn new(line_bytes: u32) -> Self {
        assert!(
            line_bytes.is_power_of_two(),
            "cache line size must be a power of two"
        );
        Self {
            line_bytes,
            state: RecorderState::default(),
        }
    }

    /// Line size in bytes.
    #[must_use]
    pub const fn line_bytes(&self) -> u32 {
        self.line_bytes
    }

    /// Records one access to the line containing `addr`.
    pub fn touch(&mut self, addr: u32, kind: AccessKind) {
        match kind {
            AccessKind::Read => self.state.reads += 1,
            AccessKind::Write => self.state.writes += 1,
        }
        let line = u64::from(addr / self.line_bytes);
        if self.state.seen.insert(line) {
            self.state.misses += 1;
        } else {
            self.state.hits += 1;
        }
    }

    /// Total accesses recorded.
    #[must_use]
    pub const fn accesses(&self) -> u64 {
        self.state.reads + self.state.writes
    }

    /// Loads recorded.
    #[must_use]
    pub const fn reads(&self) -> u64 {
        self.state.reads
    }

    /// Stores recorded.
    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.state.writes
    }

    /// Accesses that found their line already resident.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.state.hits
    }

    /// Accesses that touched a line for the first time.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.state.misses
    }

    /// Copy of the full recorder state.
    #[must_use]
    pub fn snapshot(&self) -> RecorderState {
        self.state.clone()
    }

    /// Replaces the recorder state with an earlier snapshot.
    pub fn restore(&mut self, state: RecorderState) {
        self.state = state;
    }
}

impl Default for CacheRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_BYTES)
    }
}
