//! The 85-entry register descriptor table (§3, §4.4).
//!
//! Index 0 is `a0`, as GDB's Xtensa target description expects. Indices
//! 0..64 are the general registers, individually addressable across the
//! whole windowed register file (`a0..a63`), reached by rotating the
//! window into view (§4.4 step 4) rather than by a different opcode.
//! Indices 64..85 are the special registers a debugger actually needs to
//! see: PC, the loop/branch-adjacent scratch the ABI exposes, the hardware
//! breakpoint/watchpoint comparators, and the handful of exception-state
//! registers that matter at the single debug level (6) this driver uses.
//!
//! The many special registers this driver never surfaces individually
//! (`LBEG`/`LEND`/`LCOUNT`, `EPC`/`EPS` at levels other than 6,
//! `EXCSAVE1..7`, `INTSET`/`INTCLEAR`/`INTENABLE`, `CPENABLE`, `PRID`,
//! accumulator regs) are still reachable through
//! [`crate::architecture::xtensa::arch::SpecialRegister`] by anything
//! that wants them; they are simply not part of the table GDB iterates.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::architecture::xtensa::arch::SpecialRegister;
use crate::core::{RegisterClass, RegisterDescriptor, RegisterId};

/// Number of general (window-relative) registers in the full register file.
pub const GENERAL_REGISTER_COUNT: u8 = 64;

/// Total number of entries in the table, including the general registers.
pub const REGISTER_COUNT: usize = GENERAL_REGISTER_COUNT as usize + SPECIAL_REGISTERS.len();

/// The stable GDB-wire index of the program counter (`EPC[6]`, SR 182).
pub const PC_INDEX: RegisterId = RegisterId(GENERAL_REGISTER_COUNT);

struct SpecialEntry {
    name: &'static str,
    register: SpecialRegister,
}

const SPECIAL_REGISTERS: [SpecialEntry; 21] = [
    SpecialEntry { name: "pc", register: SpecialRegister::Epc6 },
    SpecialEntry { name: "sar", register: SpecialRegister::Sar },
    SpecialEntry { name: "litbase", register: SpecialRegister::Litbase },
    SpecialEntry { name: "scompare1", register: SpecialRegister::Scompare1 },
    SpecialEntry { name: "windowbase", register: SpecialRegister::Windowbase },
    SpecialEntry { name: "windowstart", register: SpecialRegister::Windowstart },
    SpecialEntry { name: "ibreakenable", register: SpecialRegister::IBreakEnable },
    SpecialEntry { name: "ibreaka0", register: SpecialRegister::IBreakA0 },
    SpecialEntry { name: "ibreaka1", register: SpecialRegister::IBreakA1 },
    SpecialEntry { name: "dbreaka0", register: SpecialRegister::DBreakA0 },
    SpecialEntry { name: "dbreaka1", register: SpecialRegister::DBreakA1 },
    SpecialEntry { name: "dbreakc0", register: SpecialRegister::DBreakC0 },
    SpecialEntry { name: "dbreakc1", register: SpecialRegister::DBreakC1 },
    SpecialEntry { name: "ps", register: SpecialRegister::Ps },
    SpecialEntry { name: "exccause", register: SpecialRegister::ExcCause },
    SpecialEntry { name: "debugcause", register: SpecialRegister::DebugCause },
    SpecialEntry { name: "excvaddr", register: SpecialRegister::ExcVaddr },
    SpecialEntry { name: "ccount", register: SpecialRegister::CCount },
    SpecialEntry { name: "icount", register: SpecialRegister::ICount },
    SpecialEntry { name: "icountlevel", register: SpecialRegister::ICountLevel },
    SpecialEntry { name: "vecbase", register: SpecialRegister::VecBase },
];

const GENERAL_NAMES: [&str; 64] = [
    "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8", "a9", "a10", "a11", "a12", "a13", "a14",
    "a15", "a16", "a17", "a18", "a19", "a20", "a21", "a22", "a23", "a24", "a25", "a26", "a27",
    "a28", "a29", "a30", "a31", "a32", "a33", "a34", "a35", "a36", "a37", "a38", "a39", "a40",
    "a41", "a42", "a43", "a44", "a45", "a46", "a47", "a48", "a49", "a50", "a51", "a52", "a53",
    "a54", "a55", "a56", "a57", "a58", "a59", "a60", "a61", "a62", "a63",
];

/// Builds the register table in GDB-wire order.
///
/// A `const fn` (rather than a `LazyLock`/`static` built by a loop at
/// runtime) so the table is available with no initialisation cost and no
/// interior mutability to reason about.
const fn build_table() -> [RegisterDescriptor; REGISTER_COUNT] {
    let mut table = [RegisterDescriptor {
        name: "",
        id: RegisterId(0),
        class: RegisterClass::General(0),
    }; REGISTER_COUNT];

    let mut i = 0;
    while i < GENERAL_REGISTER_COUNT as usize {
        table[i] = RegisterDescriptor {
            name: GENERAL_NAMES[i],
            id: RegisterId(i as u8),
            class: RegisterClass::General(i as u8),
        };
        i += 1;
    }

    let mut j = 0;
    while j < SPECIAL_REGISTERS.len() {
        let entry = &SPECIAL_REGISTERS[j];
        table[GENERAL_REGISTER_COUNT as usize + j] = RegisterDescriptor {
            name: entry.name,
            id: RegisterId(GENERAL_REGISTER_COUNT + j as u8),
            class: RegisterClass::Special(entry.register.address()),
        };
        j += 1;
    }

    table
}

/// The full 85-entry register table, in the order GDB expects.
pub static REGISTERS: [RegisterDescriptor; REGISTER_COUNT] = build_table();

/// Name-to-index lookup, built once on first use rather than duplicating the
/// table order by hand. Backs things like a GDB monitor `read <name>` command
/// that a host frontend wants without iterating the 85-entry table linearly.
static REGISTERS_BY_NAME: Lazy<HashMap<&'static str, RegisterId>> =
    Lazy::new(|| REGISTERS.iter().map(|d| (d.name, d.id)).collect());

/// Looks up a register descriptor by its GDB name (e.g. `"pc"`, `"a3"`).
pub fn by_name(name: &str) -> Option<&'static RegisterDescriptor> {
    let id = *REGISTERS_BY_NAME.get(name)?;
    Some(&REGISTERS[id.0 as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_85_entries() {
        assert_eq!(REGISTERS.len(), 85);
    }

    #[test]
    fn pc_is_entry_64_and_maps_to_epc6() {
        let pc = &REGISTERS[PC_INDEX.0 as usize];
        assert_eq!(pc.name, "pc");
        assert_eq!(pc.class, RegisterClass::Special(182));
    }

    #[test]
    fn by_name_finds_pc_and_rejects_unknown_names() {
        assert_eq!(by_name("pc").unwrap().id, PC_INDEX);
        assert_eq!(by_name("a7").unwrap().class, RegisterClass::General(7));
        assert!(by_name("not-a-register").is_none());
    }

    #[test]
    fn general_registers_are_contiguous_from_zero() {
        for (i, entry) in REGISTERS[..64].iter().enumerate() {
            assert_eq!(entry.class, RegisterClass::General(i as u8));
            assert_eq!(entry.id, RegisterId(i as u8));
        }
    }
}
