use crate::isa::code::{InstrLength, InstructionField, MachineCode};

/// One field test of an instruction format: a required value, or a forbidden
/// one when negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FieldConstraint {
    /// Field the constraint reads.
    pub field: InstructionField,
    /// Value compared against the extracted field.
    pub value: u32,
    /// Inverts the comparison when set.
    pub negate: bool,
}

impl FieldConstraint {
    /// Constraint satisfied when the field equals `value`.
    #[must_use]
    pub const fn require(field: InstructionField, value: u32) -> Self {
        Self {
            field,
            value,
            negate: false,
        }
    }

    /// Constraint satisfied when the field differs from `value`.
    #[must_use]
    pub const fn forbid(field: InstructionField, value: u32) -> Self {
        Self {
            field,
            value,
            negate: true,
        }
    }

    /// Tests the constraint against one machine code.
    #[must_use]
    pub const fn holds(self, code: MachineCode) -> bool {
        let extracted = code.field(self.field);
        if self.negate {
            extracted != self.value
        } else {
            extracted == self.value
        }
    }
}

/// A declared instruction encoding: byte length plus the ordered constraint
/// list that identifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionFormat {
    length: InstrLength,
    constraints: &'static [FieldConstraint],
}

impl InstructionFormat {
    /// Declares a format over a static constraint table.
    #[must_use]
    pub const fn new(length: InstrLength, constraints: &'static [FieldConstraint]) -> Self {
        Self {
            length,
            constraints,
        }
    }

    /// Encoded byte length.
    #[must_use]
    pub const fn length(self) -> InstrLength {
        self.length
    }

    /// Declared constraint table.
    #[must_use]
    pub const fn constraints(self) -> &'static [FieldConstraint] {
        self.constraints
    }

    /// True when every constraint holds for `code`.
    #[must_use]
    pub fn matches(self, code: MachineCode) -> bool {
        self.constraints.iter().all(|c| c.holds(code))
    }

    /// Synthesizes the canonical machine code of this format: all constraint
    /// values written into their fields (negated ones included), everything
    /// else zero.
    #[must_use]
    pub fn fill(self) -> MachineCode {
        let mut code = MachineCode::new(0, self.length);
        for constraint in self.constraints {
            code.set_field(constraint.field, constraint.value);
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldConstraint, InstructionFormat};
    use crate::isa::code::{InstrLength, InstructionField, MachineCode};

    const R_ADD: InstructionFormat = InstructionFormat::new(
        InstrLength::Four,
        &[
            FieldConstraint::require(InstructionField::Opcode, 0b011_0011),
            FieldConstraint::require(InstructionField::Funct3, 0b000),
            FieldConstraint::require(InstructionField::Funct7, 0b000_0000),
        ],
    );

    #[test]
    fn all_constraints_must_hold() {
        let add = MachineCode::new(0x0073_02B3, InstrLength::Four);
        assert!(R_ADD.matches(add));
        // Same opcode and funct3 but funct7 selects sub.
        let sub = MachineCode::new(0x4073_02B3, InstrLength::Four);
        assert!(!R_ADD.matches(sub));
    }

    #[test]
    fn negated_constraint_inverts_the_test() {
        let not_zero_rd = InstructionFormat::new(
            InstrLength::Four,
            const {
                &[
                    FieldConstraint::require(InstructionField::Opcode, 0b011_0011),
                    FieldConstraint::forbid(InstructionField::Rd, 0),
                ]
            },
        );
        let rd_five = MachineCode::new(0x0073_02B3, InstrLength::Four);
        let rd_zero = MachineCode::new(0x0073_0033, InstrLength::Four);
        assert!(not_zero_rd.matches(rd_five));
        assert!(!not_zero_rd.matches(rd_zero));
    }

    #[test]
    fn fill_produces_the_canonical_encoding() {
        let template = R_ADD.fill();
        assert_eq!(template.word(), 0x0000_0033);
        assert_eq!(template.length(), InstrLength::Four);
        assert!(R_ADD.matches(template));
    }

    #[test]
    fn fill_writes_negated_values_too() {
        let format = InstructionFormat::new(
            InstrLength::Four,
            const {
                &[
                    FieldConstraint::require(InstructionField::Opcode, 0b001_0011),
                    FieldConstraint::forbid(InstructionField::Rd, 7),
                ]
            },
        );
        // The canonical encoding carries the forbidden value and therefore
        // does not match its own format.
        let template = format.fill();
        assert_eq!(template.field(InstructionField::Rd), 7);
        assert!(!format.matches(template));
    }
}
