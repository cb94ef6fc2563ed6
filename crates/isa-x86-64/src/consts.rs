// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! Named constants for the architectural singletons and fixed-length
//! register sequences (spec §6.1). Callers building instructions by hand can
//! use these instead of re-deriving indices, and the opcode table's
//! implicit-flag rows are built on top of the same [`FlagSet`] constants.

use crate::operand::Operand;
use crate::regset::FlagSet;

// -- EFLAGS bits, by their conventional names (spec §6.1) -------------------

pub const EFLAGS_CF: FlagSet = FlagSet::CF;
pub const EFLAGS_RES1: FlagSet = FlagSet::RES1;
pub const EFLAGS_PF: FlagSet = FlagSet::PF;
pub const EFLAGS_RES3: FlagSet = FlagSet::RES3;
pub const EFLAGS_AF: FlagSet = FlagSet::AF;
pub const EFLAGS_RES5: FlagSet = FlagSet::RES5;
pub const EFLAGS_ZF: FlagSet = FlagSet::ZF;
pub const EFLAGS_SF: FlagSet = FlagSet::SF;
pub const EFLAGS_TF: FlagSet = FlagSet::TF;
pub const EFLAGS_IF: FlagSet = FlagSet::IF;
pub const EFLAGS_DF: FlagSet = FlagSet::DF;
pub const EFLAGS_OF: FlagSet = FlagSet::OF;
pub const EFLAGS_IOPL: FlagSet = FlagSet::IOPL;
pub const EFLAGS_NT: FlagSet = FlagSet::NT;
pub const EFLAGS_RES15: FlagSet = FlagSet::RES15;
pub const EFLAGS_RF: FlagSet = FlagSet::RF;
pub const EFLAGS_VM: FlagSet = FlagSet::VM;
pub const EFLAGS_AC: FlagSet = FlagSet::AC;
pub const EFLAGS_VIF: FlagSet = FlagSet::VIF;
pub const EFLAGS_VIP: FlagSet = FlagSet::VIP;
pub const EFLAGS_ID: FlagSet = FlagSet::ID;

/// The EFLAGS bits above, in declaration order (spec §6.1's `eflags` array),
/// reserved bits included.
pub fn eflags() -> [FlagSet; 21] {
    [
        EFLAGS_CF, EFLAGS_RES1, EFLAGS_PF, EFLAGS_RES3, EFLAGS_AF, EFLAGS_RES5, EFLAGS_ZF,
        EFLAGS_SF, EFLAGS_TF, EFLAGS_IF, EFLAGS_DF, EFLAGS_OF, EFLAGS_IOPL, EFLAGS_NT,
        EFLAGS_RES15, EFLAGS_RF, EFLAGS_VM, EFLAGS_AC, EFLAGS_VIF, EFLAGS_VIP, EFLAGS_ID,
    ]
}

// -- FPU control word --------------------------------------------------------

pub const FPU_CONTROL_IM: FlagSet = FlagSet::FPU_IM;
pub const FPU_CONTROL_DM: FlagSet = FlagSet::FPU_DM;
pub const FPU_CONTROL_ZM: FlagSet = FlagSet::FPU_ZM;
pub const FPU_CONTROL_OM: FlagSet = FlagSet::FPU_OM;
pub const FPU_CONTROL_UM: FlagSet = FlagSet::FPU_UM;
pub const FPU_CONTROL_PM: FlagSet = FlagSet::FPU_PM;
pub const FPU_CONTROL_RES6: FlagSet = FlagSet::FPU_RES6;
pub const FPU_CONTROL_RES7: FlagSet = FlagSet::FPU_RES7;
pub const FPU_CONTROL_PC: FlagSet = FlagSet::FPU_PC;
pub const FPU_CONTROL_RC: FlagSet = FlagSet::FPU_RC;
pub const FPU_CONTROL_X: FlagSet = FlagSet::FPU_X;
pub const FPU_CONTROL_RES13: FlagSet = FlagSet::FPU_RES13;
pub const FPU_CONTROL_RES14: FlagSet = FlagSet::FPU_RES14;
pub const FPU_CONTROL_RES15: FlagSet = FlagSet::FPU_RES15;

/// The FPU control word bits above, in declaration order (spec §6.1's
/// `fpu_control` array), reserved bits included.
pub fn fpu_control() -> [FlagSet; 14] {
    [
        FPU_CONTROL_IM, FPU_CONTROL_DM, FPU_CONTROL_ZM, FPU_CONTROL_OM, FPU_CONTROL_UM,
        FPU_CONTROL_PM, FPU_CONTROL_RES6, FPU_CONTROL_RES7, FPU_CONTROL_PC, FPU_CONTROL_RC,
        FPU_CONTROL_X, FPU_CONTROL_RES13, FPU_CONTROL_RES14, FPU_CONTROL_RES15,
    ]
}

// -- FPU status word ---------------------------------------------------------

pub const FPU_STATUS_IE: FlagSet = FlagSet::FPU_IE;
pub const FPU_STATUS_DE: FlagSet = FlagSet::FPU_DE;
pub const FPU_STATUS_ZE: FlagSet = FlagSet::FPU_ZE;
pub const FPU_STATUS_OE: FlagSet = FlagSet::FPU_OE;
pub const FPU_STATUS_UE: FlagSet = FlagSet::FPU_UE;
pub const FPU_STATUS_PE: FlagSet = FlagSet::FPU_PE;
pub const FPU_STATUS_SF: FlagSet = FlagSet::FPU_SF;
pub const FPU_STATUS_ES: FlagSet = FlagSet::FPU_ES;
pub const FPU_STATUS_C0: FlagSet = FlagSet::FPU_C0;
pub const FPU_STATUS_C1: FlagSet = FlagSet::FPU_C1;
pub const FPU_STATUS_C2: FlagSet = FlagSet::FPU_C2;
pub const FPU_STATUS_C3: FlagSet = FlagSet::FPU_C3;
pub const FPU_STATUS_TOP: FlagSet = FlagSet::FPU_TOP;
pub const FPU_STATUS_B: FlagSet = FlagSet::FPU_B;

/// The FPU status word bits above, in declaration order (spec §6.1's
/// `fpu_status` array).
pub fn fpu_status() -> [FlagSet; 14] {
    [
        FPU_STATUS_IE, FPU_STATUS_DE, FPU_STATUS_ZE, FPU_STATUS_OE, FPU_STATUS_UE,
        FPU_STATUS_PE, FPU_STATUS_SF, FPU_STATUS_ES, FPU_STATUS_C0, FPU_STATUS_C1,
        FPU_STATUS_C2, FPU_STATUS_TOP, FPU_STATUS_C3, FPU_STATUS_B,
    ]
}

// -- FPU tag word -------------------------------------------------------------

pub const FPU_TAG0: FlagSet = FlagSet::FPU_TAG0;
pub const FPU_TAG1: FlagSet = FlagSet::FPU_TAG1;
pub const FPU_TAG2: FlagSet = FlagSet::FPU_TAG2;
pub const FPU_TAG3: FlagSet = FlagSet::FPU_TAG3;
pub const FPU_TAG4: FlagSet = FlagSet::FPU_TAG4;
pub const FPU_TAG5: FlagSet = FlagSet::FPU_TAG5;
pub const FPU_TAG6: FlagSet = FlagSet::FPU_TAG6;
pub const FPU_TAG7: FlagSet = FlagSet::FPU_TAG7;

/// One opaque 2-bit field per ST slot (spec §6.1's `tag0..tag7`), indexed by
/// architectural position. Each [`FlagSet`] bit stands in for "tag word
/// field `n` participates" — there's no independently addressable sub-field
/// to distinguish (§9's "opaque tag" treatment), so unlike a real 2-bit tag
/// value this is only ever tested for membership, never decoded.
pub fn fpu_tag(n: u8) -> FlagSet {
    debug_assert!(n < 8, "FPU tag index out of range: {n}");
    fpu_tags()[n as usize]
}

/// The FPU tag-word fields above, in declaration order (spec §6.1's
/// `fpu_tags` array).
pub fn fpu_tags() -> [FlagSet; 8] {
    [
        FPU_TAG0, FPU_TAG1, FPU_TAG2, FPU_TAG3, FPU_TAG4, FPU_TAG5, FPU_TAG6, FPU_TAG7,
    ]
}

// -- MXCSR --------------------------------------------------------------------

pub const MXCSR_IE: FlagSet = FlagSet::MXCSR_IE;
pub const MXCSR_DE: FlagSet = FlagSet::MXCSR_DE;
pub const MXCSR_ZE: FlagSet = FlagSet::MXCSR_ZE;
pub const MXCSR_OE: FlagSet = FlagSet::MXCSR_OE;
pub const MXCSR_UE: FlagSet = FlagSet::MXCSR_UE;
pub const MXCSR_PE: FlagSet = FlagSet::MXCSR_PE;
pub const MXCSR_DAZ: FlagSet = FlagSet::MXCSR_DAZ;
pub const MXCSR_IM: FlagSet = FlagSet::MXCSR_IM;
pub const MXCSR_DM: FlagSet = FlagSet::MXCSR_DM;
pub const MXCSR_ZM: FlagSet = FlagSet::MXCSR_ZM;
pub const MXCSR_OM: FlagSet = FlagSet::MXCSR_OM;
pub const MXCSR_UM: FlagSet = FlagSet::MXCSR_UM;
pub const MXCSR_PM: FlagSet = FlagSet::MXCSR_PM;
pub const MXCSR_RC: FlagSet = FlagSet::MXCSR_RC;
pub const MXCSR_FZ: FlagSet = FlagSet::MXCSR_FZ;

/// The MXCSR bits above, in declaration order (spec §6.1's `mxcsr` array).
pub fn mxcsr() -> [FlagSet; 15] {
    [
        MXCSR_IE, MXCSR_DE, MXCSR_ZE, MXCSR_OE, MXCSR_UE, MXCSR_PE, MXCSR_DAZ, MXCSR_IM,
        MXCSR_DM, MXCSR_ZM, MXCSR_OM, MXCSR_UM, MXCSR_PM, MXCSR_RC, MXCSR_FZ,
    ]
}

// -- Register singletons (thin re-exports of the operand.rs constructors) ----

pub fn al() -> Operand {
    Operand::al()
}
pub fn cl() -> Operand {
    Operand::cl()
}
pub fn ax() -> Operand {
    Operand::ax()
}
pub fn dx() -> Operand {
    Operand::dx()
}
pub fn eax() -> Operand {
    Operand::eax()
}
pub fn rax() -> Operand {
    Operand::rax()
}
pub fn st0() -> Operand {
    Operand::st0()
}
pub fn xmm0() -> Operand {
    Operand::xmm0()
}
pub fn fs() -> Operand {
    Operand::fs()
}
pub fn gs() -> Operand {
    Operand::gs()
}

// -- FPU opaque state (spec §6.1: `fpu_data, fpu_instruction, fpu_opcode, rip`)

pub fn fpu_data() -> Operand {
    Operand::fpu_data()
}
pub fn fpu_instruction() -> Operand {
    Operand::fpu_instruction()
}
pub fn fpu_opcode() -> Operand {
    Operand::fpu_opcode()
}
pub fn rip() -> Operand {
    Operand::rip()
}

// -- Literal-valued immediates and hint/prefix markers -----------------------

pub fn zero() -> Operand {
    Operand::zero()
}
pub fn one() -> Operand {
    Operand::one()
}
pub fn three() -> Operand {
    Operand::three()
}
pub fn taken() -> Operand {
    Operand::taken()
}
pub fn not_taken() -> Operand {
    Operand::not_taken()
}
pub fn pref_66() -> Operand {
    Operand::pref_66()
}
pub fn pref_rex_w() -> Operand {
    Operand::pref_rex_w()
}
pub fn far() -> Operand {
    Operand::far()
}

// -- Homogeneous fixed-length sequences (spec §6.1) --------------------------
//
// The source exposes each register family as a fixed-length array so callers
// can index it directly instead of constructing operands one at a time.

pub fn mms() -> [Operand; 8] {
    std::array::from_fn(|i| Operand::mm(i as u8))
}
pub fn sts() -> [Operand; 8] {
    std::array::from_fn(|i| Operand::st(i as u8))
}
pub fn rbs() -> [Operand; 16] {
    std::array::from_fn(|i| Operand::rb(i as u8))
}
pub fn rls() -> [Operand; 4] {
    std::array::from_fn(|i| Operand::rl(i as u8))
}
pub fn rhs() -> [Operand; 4] {
    std::array::from_fn(|i| Operand::rh(i as u8 + 4))
}
pub fn r16s() -> [Operand; 16] {
    std::array::from_fn(|i| Operand::r16(i as u8))
}
pub fn r32s() -> [Operand; 16] {
    std::array::from_fn(|i| Operand::r32(i as u8))
}
pub fn r64s() -> [Operand; 16] {
    std::array::from_fn(|i| Operand::r64(i as u8))
}
pub fn xmms() -> [Operand; 16] {
    std::array::from_fn(|i| Operand::xmm(i as u8))
}
pub fn ymms() -> [Operand; 16] {
    std::array::from_fn(|i| Operand::ymm(i as u8))
}
pub fn sregs() -> [Operand; 6] {
    std::array::from_fn(|i| Operand::sreg(i as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_indexed_by_architectural_position() {
        assert_eq!(rbs()[1], Operand::rb(1));
        assert_eq!(r64s()[3], Operand::r64(3));
        assert_eq!(rhs()[1], Operand::rh(5));
    }

    #[test]
    fn singletons_match_operand_constructors() {
        assert_eq!(al(), Operand::al());
        assert_eq!(eax(), Operand::eax());
        assert_eq!(xmm0(), Operand::xmm0());
    }

    #[test]
    fn arithmetic_flags_cover_the_expected_eflags_bits() {
        let flags = EFLAGS_CF | EFLAGS_ZF | EFLAGS_OF;
        assert!(flags.contains(FlagSet::CF));
        assert!(flags.contains(FlagSet::ZF));
        assert!(!flags.contains(FlagSet::SF));
    }

    #[test]
    fn eflags_sequence_includes_the_reserved_bits() {
        let seq = eflags();
        assert_eq!(seq.len(), 21);
        assert_eq!(seq[1], EFLAGS_RES1);
        assert_eq!(seq[13], EFLAGS_NT);
        assert_eq!(seq[14], EFLAGS_RES15);
        assert_eq!(seq[20], EFLAGS_ID);
    }

    #[test]
    fn mxcsr_sequence_matches_declaration_order() {
        let seq = mxcsr();
        assert_eq!(seq.len(), 15);
        assert_eq!(seq[0], MXCSR_IE);
        assert_eq!(seq[6], MXCSR_DAZ);
        assert_eq!(seq[13], MXCSR_RC);
        assert_eq!(seq[14], MXCSR_FZ);
    }

    #[test]
    fn fpu_tag_indexes_its_own_dedicated_bit_not_fpu_status() {
        for n in 0..8 {
            let bit = fpu_tag(n);
            assert_eq!(bit, fpu_tags()[n as usize]);
            assert!(!bit.intersects(FPU_STATUS_C0 | FPU_STATUS_C1 | FPU_STATUS_C2 | FPU_STATUS_TOP));
        }
        assert_ne!(fpu_tag(0), FPU_STATUS_C0);
        assert_ne!(fpu_tag(4), fpu_tag(5));
    }

    #[test]
    fn fpu_control_and_status_sequences_have_the_documented_length() {
        assert_eq!(fpu_control().len(), 14);
        assert_eq!(fpu_status().len(), 14);
    }

    #[test]
    fn fpu_opaque_state_constants_are_distinct_and_check() {
        let states = [fpu_data(), fpu_instruction(), fpu_opcode(), rip()];
        for s in &states {
            assert!(s.check());
        }
        for i in 0..states.len() {
            for j in (i + 1)..states.len() {
                assert_ne!(states[i], states[j]);
            }
        }
    }
}
