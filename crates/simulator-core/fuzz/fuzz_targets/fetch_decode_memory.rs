#![no_main]

use libfuzzer_sys::fuzz_target;
use simulator_core::mem::{validate_alignment, validate_gap_access, validate_text_store};
use simulator_core::{base_catalog, InstrLength, MachineCode, MemSize, Memory, Rv32};

fuzz_target!(|data: &[u8]| {
    if data.len() < 13 {
        return;
    }

    let first = u16::from_le_bytes([data[0], data[1]]);
    if let Ok(length) = InstrLength::from_first_halfword(first) {
        let mut bits = 0u64;
        for i in 0..length.bytes() as usize {
            bits |= u64::from(*data.get(i).unwrap_or(&0)) << (8 * i);
        }
        let code = MachineCode::new(bits, length);

        if let Ok(catalog) = base_catalog::<Rv32>() {
            // The bucketed lookup must agree with the exhaustive scan.
            let fast = catalog.lookup(code).map(|def| def.name);
            let slow = catalog.lookup_linear(code).map(|def| def.name);
            assert_eq!(fast, slow);
        }
    }

    let addr = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    let value = u32::from_le_bytes([data[2], data[3], data[4], data[5]]);
    let mut mem = Memory::new();
    mem.store_word(addr, value);
    assert_eq!(mem.load_word(addr), value);
    for i in 0..4 {
        assert_eq!(mem.load_byte(addr.wrapping_add(i)), (value >> (8 * i)) & 0xFF);
    }
    for i in 0..4 {
        mem.remove_byte(addr.wrapping_add(i));
    }
    assert_eq!(mem.word_footprint(), 0);

    let size = match data[12] & 0b11 {
        0 => MemSize::Byte,
        1 => MemSize::Half,
        2 => MemSize::Word,
        _ => MemSize::Long,
    };
    let _ = validate_alignment(addr, size);
    let _ = validate_gap_access(addr, size, value, addr ^ value);
    let _ = validate_text_store(addr, size, 0, value);
});
