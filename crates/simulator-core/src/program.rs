use std::collections::HashSet;

use crate::isa::MachineCode;

/// A linked program ready to load: its instruction stream, initialized
/// data, entry point, and exported labels.
///
/// Producing one of these is a front-end concern; the core only consumes
/// it. The `name` doubles as `argv[0]` when arguments are marshalled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    /// Program name, marshalled as the zeroth argument.
    pub name: String,
    /// Instruction stream in text order; lengths may vary per entry.
    pub text: Vec<MachineCode>,
    /// Initialized data, loaded at the static-data base.
    pub data: Vec<u8>,
    /// Entry point; the text base when absent.
    pub start_pc: Option<u32>,
    /// Exported global labels.
    pub globals: HashSet<String>,
}

impl ProgramImage {
    /// Empty image with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// True when `label` is exported by the program.
    #[must_use]
    pub fn has_global(&self, label: &str) -> bool {
        self.globals.contains(label)
    }

    /// Total byte length of the instruction stream.
    #[must_use]
    pub fn text_bytes(&self) -> u32 {
        self.text
            .iter()
            .map(|code| code.length().bytes())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::ProgramImage;
    use crate::isa::{InstrLength, MachineCode};

    #[test]
    fn globals_answer_membership() {
        let mut image = ProgramImage::new("fib");
        assert!(!image.has_global("main"));
        image.globals.insert("main".to_owned());
        assert!(image.has_global("main"));
        assert_eq!(image.name, "fib");
        assert_eq!(image.start_pc, None);
    }

    #[test]
    fn text_bytes_sums_variable_lengths() {
        let mut image = ProgramImage::new("mixed");
        image.text = vec![
            MachineCode::new(0x13, InstrLength::Four),
            MachineCode::new(0x0001, InstrLength::Two),
            MachineCode::new(0x3F, InstrLength::Eight),
        ];
        assert_eq!(image.text_bytes(), 14);
    }
}
