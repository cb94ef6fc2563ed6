// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! `RegSet` and `FlagSet` (spec §3.4).
//!
//! Each GPR width is tracked on its own bitmap so that, e.g., inserting
//! `%cl` does not imply membership of `%ecx` — EXTEND semantics are expressed
//! by the caller inserting at the wider width explicitly (§3.4, §4.2).

use bitflags::bitflags;

bitflags! {
    /// A 16-bit-wide membership bitmap, one bit per register index 0..16.
    /// Used for every GPR width, XMM, and YMM.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Mask16: u16 {
        const R0 = 1 << 0;
        const R1 = 1 << 1;
        const R2 = 1 << 2;
        const R3 = 1 << 3;
        const R4 = 1 << 4;
        const R5 = 1 << 5;
        const R6 = 1 << 6;
        const R7 = 1 << 7;
        const R8 = 1 << 8;
        const R9 = 1 << 9;
        const R10 = 1 << 10;
        const R11 = 1 << 11;
        const R12 = 1 << 12;
        const R13 = 1 << 13;
        const R14 = 1 << 14;
        const R15 = 1 << 15;
    }
}

bitflags! {
    /// An 8-bit-wide membership bitmap: MM0..7, ST0..7, or SREG (ES,CS,SS,DS,FS,GS, 2 spare).
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Mask8: u8 {
        const R0 = 1 << 0;
        const R1 = 1 << 1;
        const R2 = 1 << 2;
        const R3 = 1 << 3;
        const R4 = 1 << 4;
        const R5 = 1 << 5;
        const R6 = 1 << 6;
        const R7 = 1 << 7;
    }
}

impl Mask16 {
    pub fn from_index(index: u8) -> Self {
        debug_assert!(index < 16, "register index out of range: {index}");
        Self::from_bits_truncate(1u16 << index)
    }
}

impl Mask8 {
    pub fn from_index(index: u8) -> Self {
        debug_assert!(index < 8, "register index out of range: {index}");
        Self::from_bits_truncate(1u8 << index)
    }
}

/// The set of all concrete architectural registers an instruction touches.
///
/// Per-width GPR membership is kept on separate bitmaps (qword, dword, word,
/// the REX-extended byte family `Rb`, the legacy high-byte family `Rh`), plus
/// MM, ST, XMM, YMM, and segment registers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegSet {
    pub gpr64: Mask16,
    pub gpr32: Mask16,
    pub gpr16: Mask16,
    pub gpr8_rb: Mask16,
    pub gpr8_rh: Mask8,
    pub mm: Mask8,
    pub st: Mask8,
    pub xmm: Mask16,
    pub ymm: Mask16,
    pub sreg: Mask8,
}

impl RegSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.gpr64.is_empty()
            && self.gpr32.is_empty()
            && self.gpr16.is_empty()
            && self.gpr8_rb.is_empty()
            && self.gpr8_rh.is_empty()
            && self.mm.is_empty()
            && self.st.is_empty()
            && self.xmm.is_empty()
            && self.ymm.is_empty()
            && self.sreg.is_empty()
    }

    /// Union in place (§3.4's `+=`).
    pub fn union_with(&mut self, other: &RegSet) {
        self.gpr64 |= other.gpr64;
        self.gpr32 |= other.gpr32;
        self.gpr16 |= other.gpr16;
        self.gpr8_rb |= other.gpr8_rb;
        self.gpr8_rh |= other.gpr8_rh;
        self.mm |= other.mm;
        self.st |= other.st;
        self.xmm |= other.xmm;
        self.ymm |= other.ymm;
        self.sreg |= other.sreg;
    }

    pub fn union(mut self, other: &RegSet) -> Self {
        self.union_with(other);
        self
    }

    pub fn insert_gpr64(&mut self, index: u8) {
        self.gpr64 |= Mask16::from_index(index);
    }
    pub fn insert_gpr32(&mut self, index: u8) {
        self.gpr32 |= Mask16::from_index(index);
    }
    pub fn insert_gpr16(&mut self, index: u8) {
        self.gpr16 |= Mask16::from_index(index);
    }
    /// `Rb` family: full 0..16 range (REX-extended byte registers).
    pub fn insert_gpr8_rb(&mut self, index: u8) {
        self.gpr8_rb |= Mask16::from_index(index);
    }
    /// `Rh` family: AH/CH/DH/BH, physical index 4..8 stored at bit 0..4.
    pub fn insert_gpr8_rh(&mut self, index: u8) {
        debug_assert!((4..8).contains(&index), "Rh index out of range: {index}");
        self.gpr8_rh |= Mask8::from_index(index - 4);
    }
    pub fn insert_mm(&mut self, index: u8) {
        self.mm |= Mask8::from_index(index);
    }
    pub fn insert_st(&mut self, index: u8) {
        self.st |= Mask8::from_index(index);
    }
    pub fn insert_xmm(&mut self, index: u8) {
        self.xmm |= Mask16::from_index(index);
    }
    pub fn insert_ymm(&mut self, index: u8) {
        self.ymm |= Mask16::from_index(index);
    }
    pub fn insert_sreg(&mut self, index: u8) {
        self.sreg |= Mask8::from_index(index);
    }

    pub fn contains_gpr64(&self, index: u8) -> bool {
        self.gpr64.contains(Mask16::from_index(index))
    }
    pub fn contains_gpr32(&self, index: u8) -> bool {
        self.gpr32.contains(Mask16::from_index(index))
    }
    pub fn contains_xmm(&self, index: u8) -> bool {
        self.xmm.contains(Mask16::from_index(index))
    }
    pub fn contains_ymm(&self, index: u8) -> bool {
        self.ymm.contains(Mask16::from_index(index))
    }

    /// Is every bit of `self` also set in `other`? Used by the monotonicity
    /// tests of spec.md §8 (must-X ⊆ maybe-X).
    pub fn is_subset_of(&self, other: &RegSet) -> bool {
        other.gpr64.contains(self.gpr64)
            && other.gpr32.contains(self.gpr32)
            && other.gpr16.contains(self.gpr16)
            && other.gpr8_rb.contains(self.gpr8_rb)
            && other.gpr8_rh.contains(self.gpr8_rh)
            && other.mm.contains(self.mm)
            && other.st.contains(self.st)
            && other.xmm.contains(self.xmm)
            && other.ymm.contains(self.ymm)
            && other.sreg.contains(self.sreg)
    }
}

bitflags! {
    /// EFLAGS condition/arithmetic bits, plus the FPU control/status/tag and
    /// MXCSR bitfields the opcode table's flag rows draw from (§3.4, §6.1).
    ///
    /// Each register gets its own 32-bit-aligned lane (EFLAGS at 0, FPU
    /// control at 32, FPU status at 64, FPU tag word at 96, MXCSR at 112) and
    /// every named field sits at that register's real architectural bit
    /// offset within its lane — including the reserved bits spec §6.1 names
    /// (`res1`/`res3`/`res5`/`res15` for EFLAGS, `res6`/`res7`/`res13..15` for
    /// FPU control), which exist here purely as addressable identifiers, not
    /// as anything a caller would set.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FlagSet: u128 {
        // EFLAGS (lane 0, bits 0..=21)
        const CF    = 1 << 0;
        const RES1  = 1 << 1;
        const PF    = 1 << 2;
        const RES3  = 1 << 3;
        const AF    = 1 << 4;
        const RES5  = 1 << 5;
        const ZF    = 1 << 6;
        const SF    = 1 << 7;
        const TF    = 1 << 8;
        const IF    = 1 << 9;
        const DF    = 1 << 10;
        const OF    = 1 << 11;
        const IOPL  = 0b11 << 12;
        const NT    = 1 << 14;
        const RES15 = 1 << 15;
        const RF    = 1 << 16;
        const VM    = 1 << 17;
        const AC    = 1 << 18;
        const VIF   = 1 << 19;
        const VIP   = 1 << 20;
        const ID    = 1 << 21;

        // FPU control word (lane 32, bits 0..=15 of the control word)
        const FPU_IM    = 1 << 32;
        const FPU_DM    = 1 << 33;
        const FPU_ZM    = 1 << 34;
        const FPU_OM    = 1 << 35;
        const FPU_UM    = 1 << 36;
        const FPU_PM    = 1 << 37;
        const FPU_RES6  = 1 << 38;
        const FPU_RES7  = 1 << 39;
        const FPU_PC    = 0b11 << 40;
        const FPU_RC    = 0b11 << 42;
        const FPU_X     = 1 << 44;
        const FPU_RES13 = 1 << 45;
        const FPU_RES14 = 1 << 46;
        const FPU_RES15 = 1 << 47;

        // FPU status word (lane 64, bits 0..=15 of the status word)
        const FPU_IE  = 1 << 64;
        const FPU_DE  = 1 << 65;
        const FPU_ZE  = 1 << 66;
        const FPU_OE  = 1 << 67;
        const FPU_UE  = 1 << 68;
        const FPU_PE  = 1 << 69;
        const FPU_SF  = 1 << 70;
        const FPU_ES  = 1 << 71;
        const FPU_C0  = 1 << 72;
        const FPU_C1  = 1 << 73;
        const FPU_C2  = 1 << 74;
        const FPU_TOP = 0b111 << 75;
        const FPU_C3  = 1 << 78;
        const FPU_B   = 1 << 79;

        // FPU tag word (lane 96): one opaque 2-bit field per ST slot,
        // represented as one identifying bit each (§9's "opaque tag" choice).
        const FPU_TAG0 = 1 << 96;
        const FPU_TAG1 = 1 << 97;
        const FPU_TAG2 = 1 << 98;
        const FPU_TAG3 = 1 << 99;
        const FPU_TAG4 = 1 << 100;
        const FPU_TAG5 = 1 << 101;
        const FPU_TAG6 = 1 << 102;
        const FPU_TAG7 = 1 << 103;

        // MXCSR (lane 112, bits 0..=15 of the register)
        const MXCSR_IE  = 1 << 112;
        const MXCSR_DE  = 1 << 113;
        const MXCSR_ZE  = 1 << 114;
        const MXCSR_OE  = 1 << 115;
        const MXCSR_UE  = 1 << 116;
        const MXCSR_PE  = 1 << 117;
        const MXCSR_DAZ = 1 << 118;
        const MXCSR_IM  = 1 << 119;
        const MXCSR_DM  = 1 << 120;
        const MXCSR_ZM  = 1 << 121;
        const MXCSR_OM  = 1 << 122;
        const MXCSR_UM  = 1 << 123;
        const MXCSR_PM  = 1 << 124;
        const MXCSR_RC  = 0b11 << 125;
        const MXCSR_FZ  = 1 << 127;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_width_insertion_does_not_imply_other_widths() {
        let mut set = RegSet::empty();
        set.insert_gpr8_rb(1); // %cl
        assert!(!set.contains_gpr32(1));
        set.insert_gpr32(1);
        assert!(set.contains_gpr32(1));
        assert!(!set.contains_gpr64(1));
    }

    #[test]
    fn subset_and_union() {
        let mut a = RegSet::empty();
        a.insert_gpr64(0);
        let mut b = a;
        b.insert_gpr64(1);
        assert!(a.is_subset_of(&b));
        assert!(!b.is_subset_of(&a));

        let u = a.union(&b);
        assert!(u.contains_gpr64(0));
        assert!(u.contains_gpr64(1));
    }
}
