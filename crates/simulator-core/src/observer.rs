//! Out-of-band update notifications.
//!
//! Ordinary instruction effects reach callers through the diff batches
//! that [`step`](crate::Simulator::step) returns. Mutations made outside
//! a step, argument marshalling and stores that overwrite loaded text,
//! are announced here instead so a front end can refresh what it shows.

/// One out-of-band mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimUpdate {
    /// An integer register changed outside a step.
    Register {
        /// Register number, 0 to 31.
        index: usize,
        /// New value, zero-extended to 64 bits.
        value: u64,
    },
    /// A memory byte changed outside a step.
    Memory {
        /// Byte address touched.
        addr: u32,
    },
    /// A store landed inside loaded text and the listing for one word
    /// is stale.
    TextListing {
        /// Word-aligned byte offset from the start of text.
        offset: u32,
        /// Instruction word now at that offset.
        code: u32,
    },
}

/// Receiver for [`SimUpdate`] notifications.
pub trait SimObserver {
    /// Called once per out-of-band mutation.
    fn on_update(&mut self, update: SimUpdate) {
        let _ = update;
    }
}

/// Observer that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SimObserver for NullObserver {}

#[cfg(test)]
mod tests {
    use super::{NullObserver, SimObserver, SimUpdate};

    struct CountingObserver {
        seen: Vec<SimUpdate>,
    }

    impl SimObserver for CountingObserver {
        fn on_update(&mut self, update: SimUpdate) {
            self.seen.push(update);
        }
    }

    #[test]
    fn observers_receive_updates_in_order() {
        let mut observer = CountingObserver { seen: Vec::new() };
        observer.on_update(SimUpdate::Register {
            index: 2,
            value: 0x7FFF_FFF0,
        });
        observer.on_update(SimUpdate::Memory { addr: 0x10 });
        assert_eq!(observer.seen.len(), 2);
        assert_eq!(
            observer.seen[0],
            SimUpdate::Register {
                index: 2,
                value: 0x7FFF_FFF0,
            }
        );
    }

    #[test]
    fn null_observer_accepts_any_update() {
        let mut observer = NullObserver;
        observer.on_update(SimUpdate::TextListing {
            offset: 0,
            code: 0x13,
        });
    }
}
