// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! The six end-to-end scenarios of spec.md §8, exercised through the crate's
//! public API only (no access to private module internals).

use anna_isa_x86_64::{Instruction, Mem, Opcode, Operand};
use pretty_assertions::assert_eq;

#[test]
fn scenario_1_self_xor_r64() {
    let insn = Instruction::with_operands(Opcode::XorR64R64, [Operand::r64(0), Operand::r64(0)]);
    assert!(insn.check());
    assert!(insn.must_read().is_empty());
    assert!(insn.must_write().contains_gpr64(0));
    assert_eq!(insn.to_att_string(), "xorq %rax, %rax");
}

#[test]
fn scenario_2_add_r32_r32_extends_to_r64() {
    let insn = Instruction::with_operands(Opcode::AddR32R32, [Operand::r32(1), Operand::r32(2)]);
    assert!(insn.check());
    assert!(insn.must_read().contains_gpr32(1));
    assert!(insn.must_read().contains_gpr32(2));
    assert!(insn.must_write().contains_gpr64(1));
}

#[test]
fn scenario_3_mov_r64_from_rbp_relative_memory() {
    let mem = Mem::new().with_base(5).with_disp(-8);
    let insn = Instruction::with_operands(
        Opcode::MovR64M64,
        [Operand::r64(0), Operand::mem(anna_isa_x86_64::Type::M64, mem)],
    );
    assert!(insn.check());
    assert!(insn.must_read().contains_gpr64(5));
    assert!(insn.must_write().contains_gpr64(0));
    assert_eq!(insn.to_att_string(), "movq -0x8(%rbp), %rax");
}

#[test]
fn scenario_4_self_pxor_xmm_widens_to_ymm() {
    let insn = Instruction::with_operands(Opcode::PxorXmmXmm, [Operand::xmm(3), Operand::xmm(3)]);
    assert!(insn.check());
    assert!(insn.must_read().is_empty());
    assert!(insn.must_write().contains_ymm(3));
}

#[test]
fn scenario_5_rip_relative_memory() {
    let mem = Mem::rip_relative(0x20);
    let insn = Instruction::with_operands(
        Opcode::MovR64M64,
        [Operand::r64(0), Operand::mem(anna_isa_x86_64::Type::M64, mem)],
    );
    assert!(insn.check());
    assert_eq!(insn.to_att_string(), "movq 0x20(%rip), %rax");

    let invalid = Instruction::with_operands(
        Opcode::MovR64M64,
        [
            Operand::r64(0),
            Operand::mem(anna_isa_x86_64::Type::M64, mem.with_base(5)),
        ],
    );
    assert!(!invalid.check());
}

#[test]
fn scenario_6_label_defn() {
    let insn = Instruction::label_defn("loop_start");
    assert!(insn.check());
    assert_eq!(insn.arity(), 1);
    assert_eq!(insn.to_att_string(), "loop_start:");
    assert!(insn.opcode.row().props[0].contains(anna_isa_x86_64::OperandProp::MUST_READ));
}

#[test]
fn universal_invariant_predefined_constants_all_check() {
    use anna_isa_x86_64::consts;
    assert!(consts::al().check());
    assert!(consts::rax().check());
    assert!(consts::xmm0().check());
    assert!(consts::st0().check());
    assert!(consts::fs().check());
    assert!(consts::gs().check());
    assert!(consts::zero().check());
    assert!(consts::one().check());
    assert!(consts::three().check());
    for op in consts::r64s() {
        assert!(op.check());
    }
    for op in consts::xmms() {
        assert!(op.check());
    }
}

#[test]
fn universal_invariant_every_opcode_row_has_a_well_formed_arity() {
    use strum::IntoEnumIterator;
    for op in Opcode::iter() {
        let row = op.row();
        assert!(row.arity <= 4);
        for i in 0..row.arity as usize {
            assert!(row.types[i].is_some());
        }
        if let Some(mem_i) = row.mem_index {
            assert!(row.types[mem_i as usize].unwrap().is_memory());
        }
    }
}
