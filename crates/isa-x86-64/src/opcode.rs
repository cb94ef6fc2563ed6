// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! The opcode enumeration and its static per-row tables (spec §4.7).
//!
//! The full system generates one row per encodable instruction form from the
//! Intel opcode reference (~3803 rows); that generation pipeline is an
//! external input and explicitly out of scope (spec §1). This module embeds
//! a hand-curated subset big enough to exercise every `Type` variant, every
//! property-flag shape named in §3.3/§4.2, the full self-xor family of §4.3,
//! and both memory and `Moffs` operand kinds — see SPEC_FULL.md §1.1. The
//! struct-of-arrays `OpcodeRow`/`table()` shape scales to the full row count
//! without an interface change; filling it in the rest of the way is data
//! entry against that external IR, not a change to this module.

use std::sync::LazyLock;

use bitflags::bitflags;
use strum::{EnumCount, EnumIter};

use crate::regset::{FlagSet, RegSet};
use crate::ty::Type;

bitflags! {
    /// The eight independent per-operand-slot properties of spec §3.3.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OperandProp: u8 {
        const MUST_READ    = 1 << 0;
        const MAYBE_READ   = 1 << 1;
        const MUST_WRITE   = 1 << 2;
        const MAYBE_WRITE  = 1 << 3;
        const MUST_EXTEND  = 1 << 4;
        const MAYBE_EXTEND = 1 << 5;
        const MUST_UNDEF   = 1 << 6;
        const MAYBE_UNDEF  = 1 << 7;
    }
}

impl OperandProp {
    /// Definite read: both `MUST_READ` and `MAYBE_READ` (monotonicity, §8,
    /// requires MUST-sets to be subsets of MAYBE-sets, so a definite
    /// property always sets both bits).
    pub const READ: OperandProp =
        OperandProp::MUST_READ.union(OperandProp::MAYBE_READ);
    pub const WRITE: OperandProp =
        OperandProp::MUST_WRITE.union(OperandProp::MAYBE_WRITE);
    pub const EXTEND: OperandProp =
        OperandProp::MUST_EXTEND.union(OperandProp::MAYBE_EXTEND);
    pub const UNDEF: OperandProp =
        OperandProp::MUST_UNDEF.union(OperandProp::MAYBE_UNDEF);
    /// Conditional write: possible but not definite (e.g. `CMOVcc`).
    pub const MAYBE_WRITE_ONLY: OperandProp = OperandProp::MAYBE_WRITE;
}

/// One opcode's static row: arity, operand types, per-slot properties, the
/// memory-operand slot index (if any), implicit register sets, and touched
/// flags. Entry 0 is the synthetic `LABEL_DEFN` row (§3.3).
#[derive(Debug, Clone)]
pub struct OpcodeRow {
    pub mnemonic: &'static str,
    pub arity: u8,
    pub types: [Option<Type>; 4],
    pub props: [OperandProp; 4],
    pub mem_index: Option<u8>,
    pub implicit_must_read: RegSet,
    pub implicit_maybe_read: RegSet,
    pub implicit_must_write: RegSet,
    pub implicit_maybe_write: RegSet,
    pub implicit_must_undef: RegSet,
    pub implicit_maybe_undef: RegSet,
    pub flags: FlagSet,
}

/// One tag per row of the static tables (§4.7). Declared in the same order
/// the rows are pushed in [`table`], so `opcode as usize` indexes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter)]
pub enum Opcode {
    LabelDefn,
    MovR64R64,
    MovR64M64,
    MovM64R64,
    LeaR64M64,
    XorRbRb,
    XorRlRl,
    XorRhRh,
    XorR16R16,
    XorR32R32,
    XorR64R64,
    PxorMmMm,
    PxorXmmXmm,
    VpxorXmmXmmXmm,
    VpxorYmmYmmYmm,
    AddR32R32,
    AddR64R64,
    AddR64Imm32,
    SubR32R32,
    CmpR32R32,
    CmpR64Imm32,
    TestR32R32,
    CmoveR32R32,
    PushR64,
    PopR64,
    PushFs,
    PushGs,
    PopFs,
    PopGs,
    CallRel32,
    CallLabel,
    JmpRel32,
    JmpRel8,
    JccRel8Hint,
    Ret,
    Nop,
    Cpuid,
    MovRaxMoffs64,
    MovMoffs64Rax,
    MovR64Imm64,
    MovR16Imm16,
    MovRbImm8,
    MovR8M8,
    MovR16M16,
    MovR32M32,
    MovdqaXmmM128,
    VmovdqaYmmM256,
    FxsaveM512,
    FaddSt0St,
    FxchSt0St,
    MovqXmmXmm,
    VaddpsXmmXmmXmm,
    MovR16Sreg,
    MovSregR16,
    JmpfFarptr1664,
    ShlR32One,
    EnterImm16Zero,
    IntThree,
    CvtsiSdXmmR32,
    BsrR32R32,
}

impl Opcode {
    pub fn row(self) -> &'static OpcodeRow {
        &table()[self as usize]
    }

    pub fn mnemonic(self) -> &'static str {
        self.row().mnemonic
    }
}

/// The ten-opcode self-xor set of spec §4.3. `usize` is the slot index of
/// the *first* source register; two-operand forms compare slots 0/1, the
/// VEX three-operand forms compare slots 1/2.
pub fn self_xor_source_slots(op: Opcode) -> Option<(usize, usize)> {
    use Opcode::*;
    match op {
        PxorMmMm | PxorXmmXmm | XorRbRb | XorRlRl | XorRhRh | XorR16R16 | XorR32R32
        | XorR64R64 => Some((0, 1)),
        VpxorXmmXmmXmm | VpxorYmmYmmYmm => Some((1, 2)),
        _ => None,
    }
}

struct RowBuilder {
    mnemonic: &'static str,
    types: [Option<Type>; 4],
    props: [OperandProp; 4],
    mem_index: Option<u8>,
    implicit_must_read: RegSet,
    implicit_maybe_read: RegSet,
    implicit_must_write: RegSet,
    implicit_maybe_write: RegSet,
    implicit_must_undef: RegSet,
    implicit_maybe_undef: RegSet,
    flags: FlagSet,
}

impl RowBuilder {
    fn new(mnemonic: &'static str) -> Self {
        RowBuilder {
            mnemonic,
            types: [None; 4],
            props: [OperandProp::empty(); 4],
            mem_index: None,
            implicit_must_read: RegSet::empty(),
            implicit_maybe_read: RegSet::empty(),
            implicit_must_write: RegSet::empty(),
            implicit_maybe_write: RegSet::empty(),
            implicit_must_undef: RegSet::empty(),
            implicit_maybe_undef: RegSet::empty(),
            flags: FlagSet::empty(),
        }
    }

    fn slot(mut self, i: usize, ty: Type, prop: OperandProp) -> Self {
        self.types[i] = Some(ty);
        self.props[i] = prop;
        self
    }

    fn mem_index(mut self, i: usize) -> Self {
        self.mem_index = Some(i as u8);
        self
    }

    fn must_read(mut self, f: impl FnOnce(&mut RegSet)) -> Self {
        f(&mut self.implicit_must_read);
        self.implicit_maybe_read = self.implicit_must_read;
        self
    }

    fn maybe_read(mut self, f: impl FnOnce(&mut RegSet)) -> Self {
        f(&mut self.implicit_maybe_read);
        self
    }

    fn must_write(mut self, f: impl FnOnce(&mut RegSet)) -> Self {
        f(&mut self.implicit_must_write);
        self.implicit_maybe_write = self.implicit_must_write;
        self
    }

    fn flags(mut self, flags: FlagSet) -> Self {
        self.flags = flags;
        self
    }

    fn arity(&self) -> u8 {
        self.types.iter().filter(|t| t.is_some()).count() as u8
    }

    fn build(self) -> OpcodeRow {
        OpcodeRow {
            mnemonic: self.mnemonic,
            arity: self.arity(),
            types: self.types,
            props: self.props,
            mem_index: self.mem_index,
            implicit_must_read: self.implicit_must_read,
            implicit_maybe_read: self.implicit_maybe_read,
            implicit_must_write: self.implicit_must_write,
            implicit_maybe_write: self.implicit_maybe_write,
            implicit_must_undef: self.implicit_must_undef,
            implicit_maybe_undef: self.implicit_maybe_undef,
            flags: self.flags,
        }
    }
}

const ARITHMETIC_FLAGS: FlagSet = FlagSet::CF
    .union(FlagSet::PF)
    .union(FlagSet::AF)
    .union(FlagSet::ZF)
    .union(FlagSet::SF)
    .union(FlagSet::OF);

fn build_rows() -> Vec<OpcodeRow> {
    use OperandProp as P;
    use Type::*;

    vec![
        // Synthetic row (§3.3): one LABEL operand, MUST_READ, no mnemonic body.
        RowBuilder::new("")
            .slot(0, Label, P::READ)
            .build(),
        RowBuilder::new("mov").slot(0, R64, P::WRITE).slot(1, R64, P::READ).build(),
        RowBuilder::new("mov")
            .slot(0, R64, P::WRITE)
            .slot(1, M64, P::READ)
            .mem_index(1)
            .build(),
        RowBuilder::new("mov")
            .slot(0, M64, OperandProp::empty())
            .slot(1, R64, P::READ)
            .mem_index(0)
            .build(),
        RowBuilder::new("lea")
            .slot(0, R64, P::WRITE)
            .slot(1, M64, OperandProp::empty())
            .mem_index(1)
            .build(),
        RowBuilder::new("xor").slot(0, Rb, P::READ | P::WRITE).slot(1, Rb, P::READ).build(),
        RowBuilder::new("xor").slot(0, Rl, P::READ | P::WRITE).slot(1, Rl, P::READ).build(),
        RowBuilder::new("xor").slot(0, Rh, P::READ | P::WRITE).slot(1, Rh, P::READ).build(),
        RowBuilder::new("xor").slot(0, R16, P::READ | P::WRITE).slot(1, R16, P::READ).build(),
        RowBuilder::new("xor")
            .slot(0, R32, P::READ | P::EXTEND)
            .slot(1, R32, P::READ)
            .flags(ARITHMETIC_FLAGS)
            .build(),
        RowBuilder::new("xor").slot(0, R64, P::READ | P::WRITE).slot(1, R64, P::READ).build(),
        RowBuilder::new("pxor").slot(0, Mm, P::READ | P::WRITE).slot(1, Mm, P::READ).build(),
        RowBuilder::new("pxor")
            .slot(0, Xmm, P::READ | P::EXTEND)
            .slot(1, Xmm, P::READ)
            .build(),
        RowBuilder::new("vpxor")
            .slot(0, Xmm, P::WRITE)
            .slot(1, Xmm, P::READ)
            .slot(2, Xmm, P::READ)
            .build(),
        RowBuilder::new("vpxor")
            .slot(0, Ymm, P::WRITE)
            .slot(1, Ymm, P::READ)
            .slot(2, Ymm, P::READ)
            .build(),
        RowBuilder::new("add")
            .slot(0, R32, P::READ | P::EXTEND)
            .slot(1, R32, P::READ)
            .flags(ARITHMETIC_FLAGS)
            .build(),
        RowBuilder::new("add")
            .slot(0, R64, P::READ | P::WRITE)
            .slot(1, R64, P::READ)
            .flags(ARITHMETIC_FLAGS)
            .build(),
        RowBuilder::new("add")
            .slot(0, R64, P::READ | P::WRITE)
            .slot(1, Imm32, P::READ)
            .flags(ARITHMETIC_FLAGS)
            .build(),
        RowBuilder::new("sub")
            .slot(0, R32, P::READ | P::EXTEND)
            .slot(1, R32, P::READ)
            .flags(ARITHMETIC_FLAGS)
            .build(),
        RowBuilder::new("cmp")
            .slot(0, R32, P::READ)
            .slot(1, R32, P::READ)
            .flags(ARITHMETIC_FLAGS)
            .build(),
        RowBuilder::new("cmp")
            .slot(0, R64, P::READ)
            .slot(1, Imm32, P::READ)
            .flags(ARITHMETIC_FLAGS)
            .build(),
        RowBuilder::new("test")
            .slot(0, R32, P::READ)
            .slot(1, R32, P::READ)
            .flags(ARITHMETIC_FLAGS)
            .build(),
        // CMOVcc: destination is only conditionally written (no MUST_WRITE),
        // but the source is read unconditionally (§8's maybe-only coverage).
        RowBuilder::new("cmove")
            .slot(0, R32, P::MAYBE_WRITE_ONLY | OperandProp::MAYBE_EXTEND)
            .slot(1, R32, P::READ)
            .flags(FlagSet::ZF)
            .build(),
        RowBuilder::new("push")
            .slot(0, R64, P::READ)
            .must_read(|r| r.insert_gpr64(4)) // %rsp
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("pop")
            .slot(0, R64, P::WRITE)
            .must_read(|r| r.insert_gpr64(4))
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("push")
            .slot(0, Fs, P::READ)
            .must_read(|r| r.insert_gpr64(4))
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("push")
            .slot(0, Gs, P::READ)
            .must_read(|r| r.insert_gpr64(4))
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("pop")
            .slot(0, Fs, P::WRITE)
            .must_read(|r| r.insert_gpr64(4))
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("pop")
            .slot(0, Gs, P::WRITE)
            .must_read(|r| r.insert_gpr64(4))
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("call")
            .slot(0, Rel32, P::READ)
            .must_read(|r| r.insert_gpr64(4))
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("call")
            .slot(0, Label, P::READ)
            .must_read(|r| r.insert_gpr64(4))
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("jmp").slot(0, Rel32, P::READ).build(),
        RowBuilder::new("jmp").slot(0, Rel8, P::READ).build(),
        RowBuilder::new("jcc")
            .slot(0, Rel8, P::READ)
            .slot(1, Hint, OperandProp::empty())
            .flags(FlagSet::ZF)
            .build(),
        RowBuilder::new("ret")
            .must_read(|r| r.insert_gpr64(4))
            .must_write(|r| r.insert_gpr64(4))
            .build(),
        RowBuilder::new("nop").build(),
        RowBuilder::new("cpuid")
            .must_read(|r| r.insert_gpr32(0))
            .maybe_read(|r| r.insert_gpr32(1))
            .must_write(|r| {
                r.insert_gpr32(0);
                r.insert_gpr32(1);
                r.insert_gpr32(2);
                r.insert_gpr32(3);
            })
            .build(),
        RowBuilder::new("mov")
            .slot(0, Rax, P::WRITE)
            .slot(1, Moffs64, OperandProp::empty())
            .build(),
        RowBuilder::new("mov")
            .slot(0, Moffs64, OperandProp::empty())
            .slot(1, Rax, P::READ)
            .build(),
        RowBuilder::new("mov").slot(0, R64, P::WRITE).slot(1, Imm64, P::READ).build(),
        RowBuilder::new("mov").slot(0, R16, P::WRITE).slot(1, Imm16, P::READ).build(),
        RowBuilder::new("mov").slot(0, Rb, P::WRITE).slot(1, Imm8, P::READ).build(),
        RowBuilder::new("mov")
            .slot(0, Rb, P::WRITE)
            .slot(1, M8, P::READ)
            .mem_index(1)
            .build(),
        RowBuilder::new("mov")
            .slot(0, R16, P::WRITE)
            .slot(1, M16, P::READ)
            .mem_index(1)
            .build(),
        RowBuilder::new("mov")
            .slot(0, R32, P::READ | P::EXTEND)
            .slot(1, M32, P::READ)
            .mem_index(1)
            .build(),
        RowBuilder::new("movdqa")
            .slot(0, Xmm, P::READ | P::EXTEND)
            .slot(1, M128, P::READ)
            .mem_index(1)
            .build(),
        RowBuilder::new("vmovdqa")
            .slot(0, Ymm, P::WRITE)
            .slot(1, M256, P::READ)
            .mem_index(1)
            .build(),
        RowBuilder::new("fxsave").slot(0, M512, OperandProp::empty()).mem_index(0).build(),
        RowBuilder::new("fadd")
            .slot(0, St0, P::READ | P::WRITE)
            .slot(1, St, P::READ)
            .build(),
        RowBuilder::new("fxch")
            .slot(0, St0, P::READ | P::WRITE)
            .slot(1, St, P::READ | P::WRITE)
            .build(),
        RowBuilder::new("movq")
            .slot(0, Xmm, P::WRITE | P::EXTEND)
            .slot(1, Xmm, P::READ)
            .build(),
        RowBuilder::new("vaddps")
            .slot(0, Xmm, P::WRITE)
            .slot(1, Xmm, P::READ)
            .slot(2, Xmm, P::READ)
            .build(),
        RowBuilder::new("mov").slot(0, R16, P::WRITE).slot(1, Sreg, P::READ).build(),
        RowBuilder::new("mov").slot(0, Sreg, P::WRITE).slot(1, R16, P::READ).build(),
        RowBuilder::new("ljmp")
            .slot(0, Far, OperandProp::empty())
            .slot(1, FarPtr1664, OperandProp::empty())
            .mem_index(1)
            .build(),
        RowBuilder::new("shl")
            .slot(0, R32, P::READ | P::EXTEND)
            .slot(1, One, OperandProp::empty())
            .flags(ARITHMETIC_FLAGS)
            .build(),
        RowBuilder::new("enter")
            .slot(0, Imm16, P::READ)
            .slot(1, Zero, OperandProp::empty())
            .must_read(|r| r.insert_gpr64(5)) // %rbp
            .must_write(|r| r.insert_gpr64(5))
            .build(),
        RowBuilder::new("int").slot(0, Three, OperandProp::empty()).build(),
        // Legacy-SSE write to an XMM register: the upper 128 bits of the
        // corresponding YMM register become architecturally undefined on
        // AVX-capable hardware (Intel SDM, SSE/AVX transition notes). §4.2's
        // undef-widening rule applies here, not just to write/extend.
        RowBuilder::new("cvtsi2sd")
            .slot(0, Xmm, P::WRITE | P::UNDEF)
            .slot(1, R32, P::READ)
            .build(),
        // BSR/BSF: destination is undefined when the source is zero (Intel
        // SDM). Conditional, so MAYBE_UNDEF only, alongside the conditional
        // write already modeled by CMOVcc above.
        RowBuilder::new("bsr")
            .slot(0, R32, P::MAYBE_WRITE_ONLY | OperandProp::MAYBE_EXTEND | OperandProp::MAYBE_UNDEF)
            .slot(1, R32, P::READ)
            .flags(FlagSet::ZF)
            .build(),
    ]
}

pub fn table() -> &'static [OpcodeRow] {
    static TABLE: LazyLock<Vec<OpcodeRow>> = LazyLock::new(build_rows);
    let rows = &*TABLE;
    debug_assert_eq!(rows.len(), Opcode::COUNT, "one row per Opcode variant");
    rows
}
