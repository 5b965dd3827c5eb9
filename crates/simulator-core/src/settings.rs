use crate::mem::SegmentLayout;

/// Default step budget for a fresh instance.
pub const DEFAULT_MAX_STEPS: u64 = 500_000;

/// Per-instance execution policy.
///
/// Every switch maps to an observable behavior difference; none of them
/// change the instruction set itself.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimulatorSettings {
    /// Step budget; `None` runs without a limit.
    pub max_steps: Option<u64>,
    /// Require every access to be aligned to its size class.
    pub aligned_addresses: bool,
    /// Permit stores into the loaded text segment.
    pub mutable_text: bool,
    /// Permit accesses landing between the heap break and the stack
    /// pointer. When false such accesses fault.
    pub allow_access_between_stack_and_heap: bool,
    /// Treat only a recorded exit code as completion; running past the
    /// end of text keeps going.
    pub ecall_only_exit: bool,
    /// Seed sp/gp (and ra when a `main` entry point is present) while
    /// loading a program.
    pub set_registers_on_init: bool,
    /// Segment base addresses.
    pub layout: SegmentLayout,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            max_steps: Some(DEFAULT_MAX_STEPS),
            aligned_addresses: false,
            mutable_text: false,
            allow_access_between_stack_and_heap: true,
            ecall_only_exit: false,
            set_registers_on_init: true,
            layout: SegmentLayout::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SimulatorSettings, DEFAULT_MAX_STEPS};

    #[test]
    fn defaults_are_permissive_except_text_writes() {
        let settings = SimulatorSettings::default();
        assert_eq!(settings.max_steps, Some(DEFAULT_MAX_STEPS));
        assert!(!settings.aligned_addresses);
        assert!(!settings.mutable_text);
        assert!(settings.allow_access_between_stack_and_heap);
        assert!(!settings.ecall_only_exit);
        assert!(settings.set_registers_on_init);
        assert_eq!(settings.layout.text_begin, 0);
    }
}
