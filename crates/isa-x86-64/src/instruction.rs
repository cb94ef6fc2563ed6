// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! `Instruction`: opcode + up to four operand slots (spec §3.3), the
//! liveness projection (§4.2), the self-xor special case (§4.3), structural
//! `check` (§4.4), the AT&T writer (§4.5), and ordering/equality/hash (§4.6).

use crate::opcode::{self_xor_source_slots, Opcode, OperandProp};
use crate::operand::{Operand, Payload};
use crate::regset::RegSet;
use crate::ty::Type;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: [Option<Operand>; 4],
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: [Option<Operand>; 4]) -> Self {
        Instruction { opcode, operands }
    }

    /// Build from a short operand list, padding the remaining slots with
    /// `None`. Panics if more than four operands are given — four is the
    /// hard-coded arity ceiling of §3.3.
    pub fn with_operands(opcode: Opcode, operands: impl IntoIterator<Item = Operand>) -> Self {
        let mut slots: [Option<Operand>; 4] = [const { None }; 4];
        for (n, op) in operands.into_iter().enumerate() {
            slots[n] = Some(op);
        }
        Instruction::new(opcode, slots)
    }

    pub fn label_defn(name: impl Into<Box<str>>) -> Self {
        Instruction::with_operands(Opcode::LabelDefn, [Operand::label(name)])
    }

    pub fn arity(&self) -> usize {
        self.opcode.row().arity as usize
    }

    pub fn slot_type(&self, i: usize) -> Option<Type> {
        self.opcode.row().types.get(i).copied().flatten()
    }

    /// §4.4: every slot `i < arity` holds an operand whose declared type
    /// matches the opcode's table and which is itself structurally valid.
    /// Slots beyond arity are not inspected.
    pub fn check(&self) -> bool {
        let row = self.opcode.row();
        for i in 0..row.arity as usize {
            let Some(expected_ty) = row.types[i] else {
                return false;
            };
            let Some(operand) = &self.operands[i] else {
                return false;
            };
            if operand.ty != expected_ty {
                return false;
            }
            if !operand.check() {
                return false;
            }
        }
        true
    }

    /// §4.3: is this one of the ten self-xor idioms, with equal source
    /// operands? The slot-index pair differs for the two-operand forms
    /// (0, 1) and the VEX three-operand forms (1, 2) — see
    /// [`self_xor_source_slots`].
    ///
    /// Design note §9 flags a source bug where `XOR_RH_RH` compares its
    /// operands through an `Rl` view instead of `Rh`. This port compares
    /// operand *payloads* directly (an `Operand` already carries its own
    /// `Type`, unlike the source's bit-reinterpreting subclass view), so the
    /// bug's precondition doesn't exist here; the discrepancy is recorded in
    /// DESIGN.md rather than silently reproduced, since spec §9 asks for the
    /// intended (correct) behavior.
    pub fn is_xor_reg_reg(&self) -> bool {
        let Some((i, j)) = self_xor_source_slots(self.opcode) else {
            return false;
        };
        match (&self.operands[i], &self.operands[j]) {
            (Some(a), Some(b)) => a.payload == b.payload,
            _ => false,
        }
    }

    fn explicit_read(&self, must: bool) -> RegSet {
        let row = self.opcode.row();
        let mut set = RegSet::empty();
        if self.is_xor_reg_reg() {
            return set;
        }
        for i in 0..row.arity as usize {
            let ty = row.types[i].expect("slot within arity has a declared type");
            let Some(operand) = &self.operands[i] else {
                continue;
            };
            if ty.is_memory() {
                if let Payload::Mem(mem) = &operand.payload {
                    if let Some(base) = mem.base {
                        set.insert_gpr64(base);
                    }
                    if let Some((index, _)) = mem.index {
                        set.insert_gpr64(index);
                    }
                }
                continue;
            }
            if ty.is_moffs() {
                if let Payload::Moffs(moffs) = &operand.payload
                    && let Some(seg) = moffs.seg {
                        set.insert_sreg(seg);
                    }
                continue;
            }
            let prop = row.props[i];
            let reads = if must {
                prop.contains(OperandProp::MUST_READ)
            } else {
                prop.contains(OperandProp::MAYBE_READ)
            };
            if !reads {
                continue;
            }
            if let Payload::Reg(index) = &operand.payload {
                insert_widened(&mut set, ty.widest(), *index);
            }
        }
        set
    }

    fn explicit_write(&self, must: bool) -> RegSet {
        let row = self.opcode.row();
        let mut set = RegSet::empty();
        for i in 0..row.arity as usize {
            let ty = row.types[i].expect("slot within arity has a declared type");
            let prop = row.props[i];
            let extends = if must {
                prop.contains(OperandProp::MUST_EXTEND)
            } else {
                prop.contains(OperandProp::MAYBE_EXTEND)
            };
            let writes = if must {
                prop.contains(OperandProp::MUST_WRITE)
            } else {
                prop.contains(OperandProp::MAYBE_WRITE)
            };
            if !extends && !writes {
                break;
            }
            let Some(operand) = &self.operands[i] else {
                break;
            };
            let Payload::Reg(index) = &operand.payload else {
                break;
            };
            if extends {
                let target = ty
                    .extend_target()
                    .expect("MUST_EXTEND/MAYBE_EXTEND only valid on R32/Eax/Xmm/Xmm0 slots");
                insert_widened(&mut set, target, *index);
            } else {
                insert_widened(&mut set, ty.widest(), *index);
            }
        }
        set
    }

    fn explicit_undef(&self, must: bool) -> RegSet {
        let row = self.opcode.row();
        let mut set = RegSet::empty();
        for i in 0..row.arity as usize {
            let ty = row.types[i].expect("slot within arity has a declared type");
            let prop = row.props[i];
            let undef = if must {
                prop.contains(OperandProp::MUST_UNDEF)
            } else {
                prop.contains(OperandProp::MAYBE_UNDEF)
            };
            if !undef {
                break;
            }
            let Some(operand) = &self.operands[i] else {
                break;
            };
            let Payload::Reg(index) = &operand.payload else {
                break;
            };
            // Quirk mirrored from the source (spec §4.2/§9): an XMM/XMM0
            // undef contribution widens to YMM, as if the whole register is
            // clobbered, for both the must- and maybe- variants.
            let widest = match ty.widest() {
                Type::Xmm => Type::Ymm,
                other => other,
            };
            insert_widened(&mut set, widest, *index);
        }
        set
    }

    pub fn must_read(&self) -> RegSet {
        self.opcode.row().implicit_must_read.union(&self.explicit_read(true))
    }
    pub fn maybe_read(&self) -> RegSet {
        self.opcode.row().implicit_maybe_read.union(&self.explicit_read(false))
    }
    pub fn must_write(&self) -> RegSet {
        self.opcode.row().implicit_must_write.union(&self.explicit_write(true))
    }
    pub fn maybe_write(&self) -> RegSet {
        self.opcode.row().implicit_maybe_write.union(&self.explicit_write(false))
    }
    pub fn must_undef(&self) -> RegSet {
        self.opcode.row().implicit_must_undef.union(&self.explicit_undef(true))
    }
    pub fn maybe_undef(&self) -> RegSet {
        self.opcode.row().implicit_maybe_undef.union(&self.explicit_undef(false))
    }

    /// The single GPR/memory width suffix implied by this instruction's
    /// operands (`b`/`w`/`l`/`q`), or `None` if nothing disambiguates one
    /// (vector/FPU ops, branches, `int3`, ...). See §4.5 / §6.2.
    fn size_suffix(&self) -> Option<char> {
        let row = self.opcode.row();
        row.types[..row.arity as usize]
            .iter()
            .flatten()
            .find_map(|ty| ty.att_size_suffix())
    }

    /// §4.5: AT&T rendering. Operand slots print in reverse of the internal
    /// (Intel) order; `LABEL_DEFN` is the one opcode with no mnemonic body.
    pub fn write_att(&self, out: &mut String) {
        let row = self.opcode.row();
        if self.opcode == Opcode::LabelDefn {
            if let Some(op) = &self.operands[0] {
                op.write_att(out);
            }
            out.push(':');
            return;
        }

        out.push_str(row.mnemonic);
        if let Some(suffix) = self.size_suffix() {
            out.push(suffix);
        }

        let arity = row.arity as usize;
        if arity > 0 {
            out.push(' ');
            let mut first = true;
            for i in (0..arity).rev() {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                if let Some(op) = &self.operands[i] {
                    op.write_att(out);
                }
            }
        }
    }

    pub fn to_att_string(&self) -> String {
        let mut s = String::new();
        self.write_att(&mut s);
        s
    }
}

/// Insert `index` into `set` using the RegSet bucket that matches `widest`
/// (the sub-sumption lattice's canonical payload-extraction lens, §3.2/§9).
fn insert_widened(set: &mut RegSet, widest: Type, index: u8) {
    match widest {
        Type::Rh => set.insert_gpr8_rh(index),
        Type::Rb | Type::Rl => set.insert_gpr8_rb(index),
        Type::R16 => set.insert_gpr16(index),
        Type::R32 => set.insert_gpr32(index),
        Type::R64 => set.insert_gpr64(index),
        Type::Mm => set.insert_mm(index),
        Type::St => set.insert_st(index),
        Type::Xmm => set.insert_xmm(index),
        Type::Ymm => set.insert_ymm(index),
        Type::Fs => set.insert_sreg(4),
        Type::Gs => set.insert_sreg(5),
        Type::Sreg => set.insert_sreg(index),
        other => debug_assert!(false, "register-bearing widest type expected, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::{Mem, Scale};

    #[test]
    fn self_xor_r64_zeroes_read_and_writes() {
        let insn = Instruction::with_operands(Opcode::XorR64R64, [Operand::r64(0), Operand::r64(0)]);
        assert!(insn.check());
        assert!(insn.must_read().is_empty());
        assert!(insn.must_write().contains_gpr64(0));
        assert_eq!(insn.to_att_string(), "xorq %rax, %rax");
    }

    #[test]
    fn non_self_xor_reads_both_operands() {
        let insn = Instruction::with_operands(Opcode::XorR64R64, [Operand::r64(0), Operand::r64(1)]);
        assert!(insn.check());
        assert!(insn.must_read().contains_gpr64(0));
        assert!(insn.must_read().contains_gpr64(1));
    }

    #[test]
    fn add_r32_r32_extends_destination_to_full_gpr64() {
        let insn = Instruction::with_operands(Opcode::AddR32R32, [Operand::r32(2), Operand::r32(3)]);
        assert!(insn.check());
        assert!(insn.must_read().contains_gpr32(2));
        assert!(insn.must_read().contains_gpr32(3));
        assert!(insn.must_write().contains_gpr64(2));
        assert!(!insn.must_write().contains_gpr32(2));
    }

    #[test]
    fn memory_operand_forces_base_and_index_reads_regardless_of_read_flag() {
        let mem = Mem::new().with_base(3).with_index(1, Scale::X1);
        let insn = Instruction::with_operands(
            Opcode::MovR64M64,
            [Operand::r64(0), Operand::mem(Type::M64, mem)],
        );
        assert!(insn.check());
        assert!(insn.must_read().contains_gpr64(3));
        assert!(insn.must_read().contains_gpr64(1));
        assert!(insn.must_write().contains_gpr64(0));
        assert_eq!(insn.to_att_string(), "movq (%rbx,%rcx,1), %rax");
    }

    #[test]
    fn mov_r64_m64_matches_scenario_3() {
        let mem = Mem::new().with_base(5).with_disp(-8); // %rbp
        let insn = Instruction::with_operands(
            Opcode::MovR64M64,
            [Operand::r64(0), Operand::mem(Type::M64, mem)],
        );
        assert!(insn.check());
        assert!(insn.must_read().contains_gpr64(5));
        assert!(insn.must_write().contains_gpr64(0));
        assert_eq!(insn.to_att_string(), "movq -0x8(%rbp), %rax");
    }

    #[test]
    fn self_pxor_xmm_extends_to_ymm_on_write() {
        let insn = Instruction::with_operands(Opcode::PxorXmmXmm, [Operand::xmm(3), Operand::xmm(3)]);
        assert!(insn.check());
        assert!(insn.must_read().is_empty());
        assert!(insn.must_write().contains_ymm(3));
        assert_eq!(insn.to_att_string(), "pxor %xmm3, %xmm3");
    }

    #[test]
    fn rip_relative_memory_checks_and_prints() {
        let mem = Mem::rip_relative(0x20);
        let insn = Instruction::with_operands(
            Opcode::MovR64M64,
            [Operand::r64(0), Operand::mem(Type::M64, mem)],
        );
        assert!(insn.check());
        assert_eq!(insn.to_att_string(), "movq 0x20(%rip), %rax");

        let bad_mem = mem.with_base(5);
        let bad = Instruction::with_operands(
            Opcode::MovR64M64,
            [Operand::r64(0), Operand::mem(Type::M64, bad_mem)],
        );
        assert!(!bad.check());
    }

    #[test]
    fn label_defn_prints_colon_and_is_must_read_in_its_table_row() {
        let insn = Instruction::label_defn("L");
        assert!(insn.check());
        assert_eq!(insn.arity(), 1);
        assert_eq!(insn.slot_type(0), Some(Type::Label));
        assert_eq!(insn.to_att_string(), "L:");
        assert!(insn.opcode.row().props[0].contains(OperandProp::MUST_READ));
    }

    #[test]
    fn must_sets_are_subsets_of_maybe_sets() {
        let insn = Instruction::with_operands(Opcode::CmoveR32R32, [Operand::r32(0), Operand::r32(1)]);
        assert!(insn.check());
        assert!(insn.must_read().is_subset_of(&insn.maybe_read()));
        assert!(insn.must_write().is_subset_of(&insn.maybe_write()));
        assert!(insn.must_undef().is_subset_of(&insn.maybe_undef()));
        // CMOVcc's destination write is possible but never definite.
        assert!(insn.must_write().is_empty());
        assert!(insn.maybe_write().contains_gpr64(0));
    }

    #[test]
    fn legacy_sse_write_undefines_the_whole_ymm_register() {
        let insn = Instruction::with_operands(
            Opcode::CvtsiSdXmmR32,
            [Operand::xmm(2), Operand::r32(0)],
        );
        assert!(insn.check());
        assert!(insn.must_undef().contains_ymm(2));
        assert!(!insn.must_undef().contains_xmm(2));
    }

    #[test]
    fn bsr_undefines_destination_only_when_source_may_be_zero() {
        let insn = Instruction::with_operands(Opcode::BsrR32R32, [Operand::r32(0), Operand::r32(1)]);
        assert!(insn.check());
        assert!(insn.must_undef().is_empty());
        assert!(insn.maybe_undef().contains_gpr32(0));
        assert!(insn.must_undef().is_subset_of(&insn.maybe_undef()));
    }

    #[test]
    fn ordering_is_a_strict_total_order() {
        let a = Instruction::with_operands(Opcode::XorR64R64, [Operand::r64(0), Operand::r64(0)]);
        let b = Instruction::with_operands(Opcode::XorR64R64, [Operand::r64(0), Operand::r64(1)]);
        assert!(a < b);
        assert!(b >= a);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn equal_instructions_hash_equal_and_print_identically() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = Instruction::with_operands(Opcode::AddR64R64, [Operand::r64(0), Operand::r64(1)]);
        let b = Instruction::with_operands(Opcode::AddR64R64, [Operand::r64(0), Operand::r64(1)]);
        assert_eq!(a, b);
        assert_eq!(a.to_att_string(), b.to_att_string());

        let mut ha = DefaultHasher::new();
        a.hash(&mut ha);
        let mut hb = DefaultHasher::new();
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn vpxor_xmm_self_xor_compares_slots_one_and_two() {
        let insn = Instruction::with_operands(
            Opcode::VpxorXmmXmmXmm,
            [Operand::xmm(0), Operand::xmm(5), Operand::xmm(5)],
        );
        assert!(insn.is_xor_reg_reg());
        assert!(insn.must_read().is_empty());
        assert!(insn.must_write().contains_xmm(0));
    }
}
