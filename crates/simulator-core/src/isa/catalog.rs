use std::collections::HashMap;

use thiserror::Error;

use crate::fault::Fault;
use crate::isa::code::MachineCode;
use crate::isa::format::InstructionFormat;
use crate::simulator::Simulator;
use crate::state::Xlen;

/// Evaluation handler of one instruction. The handler owns its register,
/// memory, and PC effects, including advancing the PC.
pub type EvalFn<X> = fn(&mut Simulator<X>, MachineCode) -> Result<(), Fault>;

/// One catalog entry: mnemonic, declared format, evaluation handler.
#[derive(Debug, Clone, Copy)]
pub struct InstructionDef<X: Xlen> {
    /// Mnemonic, unique within a catalog.
    pub name: &'static str,
    /// Declared encoding.
    pub format: InstructionFormat,
    /// Semantic handler.
    pub eval: EvalFn<X>,
}

/// Registration-time catalog configuration errors.
///
/// These reject bad instruction-set declarations eagerly; a fully built
/// catalog can never report a decode ambiguity at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The format's positive constraints require conflicting bit values.
    #[error("format for {name} requires conflicting bit values")]
    Unsatisfiable {
        /// Mnemonic of the rejected definition.
        name: &'static str,
    },
    /// The mnemonic is already registered.
    #[error("{name} is already registered")]
    DuplicateName {
        /// Mnemonic of the rejected definition.
        name: &'static str,
    },
    /// Two formats match overlapping encodings and neither strictly narrows
    /// the other.
    #[error("formats for {second} and {first} match overlapping encodings")]
    AmbiguousPair {
        /// Previously registered mnemonic.
        first: &'static str,
        /// Rejected mnemonic.
        second: &'static str,
    },
}

/// Required bits of a format's positive constraints, expanded to bit level
/// so overlapping field slices compare exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BitPattern {
    mask: u32,
    value: u32,
}

fn positive_pattern(format: InstructionFormat) -> Option<BitPattern> {
    let mut mask = 0u32;
    let mut value = 0u32;
    for constraint in format.constraints() {
        if constraint.negate {
            continue;
        }
        let (lo, hi) = constraint.field.range();
        let width = hi - lo;
        let field_mask = if width >= 32 {
            u32::MAX
        } else {
            ((1u32 << width) - 1) << lo
        };
        let field_value = (constraint.value.wrapping_shl(lo)) & field_mask;
        if (value ^ field_value) & (mask & field_mask) != 0 {
            return None;
        }
        mask |= field_mask;
        value |= field_value;
    }
    Some(BitPattern { mask, value })
}

/// True when one format carries a positive constraint whose exact field and
/// value the other format forbids; no code can satisfy both.
fn negation_separates(a: InstructionFormat, b: InstructionFormat) -> bool {
    let one_way = |pos: InstructionFormat, neg: InstructionFormat| {
        pos.constraints().iter().any(|p| {
            !p.negate
                && neg
                    .constraints()
                    .iter()
                    .any(|n| n.negate && n.field == p.field && n.value == p.value)
        })
    };
    one_way(a, b) || one_way(b, a)
}

const OPCODE_MASK: u32 = 0x7F;

/// Registry resolving fetched machine code to exactly one instruction.
///
/// Lookup is indexed by the primary opcode bits; formats whose positive
/// constraints do not pin the whole opcode field stay on a floating list
/// consulted for every code. Where one format strictly narrows another
/// (its required bits are a superset), the narrower format wins. A linear
/// scan over all definitions is kept as a correctness oracle.
#[derive(Debug)]
pub struct Catalog<X: Xlen> {
    defs: Vec<InstructionDef<X>>,
    patterns: Vec<BitPattern>,
    by_opcode: HashMap<u32, Vec<usize>>,
    floating: Vec<usize>,
    by_name: HashMap<&'static str, usize>,
}

impl<X: Xlen> Default for Catalog<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: Xlen> Catalog<X> {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            defs: Vec::new(),
            patterns: Vec::new(),
            by_opcode: HashMap::new(),
            floating: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Number of registered definitions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.defs.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Registers one definition, validating it against every existing one.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Unsatisfiable`] when the format's own constraints
    /// conflict, [`CatalogError::DuplicateName`] on a reused mnemonic, and
    /// [`CatalogError::AmbiguousPair`] when the format overlaps an existing
    /// one without strictly narrowing or widening it.
    pub fn register(&mut self, def: InstructionDef<X>) -> Result<(), CatalogError> {
        let pattern =
            positive_pattern(def.format).ok_or(CatalogError::Unsatisfiable { name: def.name })?;
        if self.by_name.contains_key(def.name) {
            return Err(CatalogError::DuplicateName { name: def.name });
        }
        for (existing, existing_pattern) in self.defs.iter().zip(&self.patterns) {
            if Self::overlap_is_ambiguous(pattern, *existing_pattern)
                && !negation_separates(def.format, existing.format)
            {
                return Err(CatalogError::AmbiguousPair {
                    first: existing.name,
                    second: def.name,
                });
            }
        }
        let index = self.defs.len();
        if pattern.mask & OPCODE_MASK == OPCODE_MASK {
            self.by_opcode
                .entry(pattern.value & OPCODE_MASK)
                .or_default()
                .push(index);
        } else {
            self.floating.push(index);
        }
        self.by_name.insert(def.name, index);
        self.defs.push(def);
        self.patterns.push(pattern);
        Ok(())
    }

    fn overlap_is_ambiguous(a: BitPattern, b: BitPattern) -> bool {
        let common = a.mask & b.mask;
        if (a.value ^ b.value) & common != 0 {
            return false; // disjoint
        }
        // Codes matching both exist; allowed only with a strict-narrowing
        // precedence, which requires one mask to contain the other.
        let narrowing = common == a.mask || common == b.mask;
        !narrowing || a.mask == b.mask
    }

    /// Resolves machine code through the opcode index.
    #[must_use]
    pub fn lookup(&self, code: MachineCode) -> Option<&InstructionDef<X>> {
        let bucket = self.by_opcode.get(&(code.word() & OPCODE_MASK));
        let candidates = bucket
            .into_iter()
            .flatten()
            .chain(self.floating.iter())
            .copied();
        self.best_match(candidates, code)
    }

    /// Resolves machine code by scanning every definition. Slower than
    /// [`Self::lookup`] and kept as its correctness oracle.
    #[must_use]
    pub fn lookup_linear(&self, code: MachineCode) -> Option<&InstructionDef<X>> {
        self.best_match(0..self.defs.len(), code)
    }

    /// Definition registered under `name`.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&InstructionDef<X>> {
        self.by_name.get(name).map(|&i| &self.defs[i])
    }

    /// Canonical encoding of the named instruction, synthesized from its
    /// format.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<MachineCode> {
        self.definition(name).map(|def| def.format.fill())
    }

    /// Registered definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &InstructionDef<X>> {
        self.defs.iter()
    }

    fn best_match(
        &self,
        indices: impl Iterator<Item = usize>,
        code: MachineCode,
    ) -> Option<&InstructionDef<X>> {
        let mut best: Option<(u32, usize)> = None;
        for index in indices {
            if self.defs[index].format.matches(code) {
                let pinned = self.patterns[index].mask.count_ones();
                if best.is_none_or(|(top, _)| pinned > top) {
                    best = Some((pinned, index));
                }
            }
        }
        best.map(|(_, index)| &self.defs[index])
    }
}
