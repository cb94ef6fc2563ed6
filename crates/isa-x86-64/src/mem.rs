// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! The memory-expression family `M<T>` (spec §4.1.1) and the absolute
//! `Moffs` operand (spec §3.1).
//!
//! `M<T>` is parameterized in the source by the value-width type `T`; here
//! the width lives on the surrounding `Type::M_*` tag (see `operand.rs`) and
//! `Mem` itself is the one runtime shape shared by every width, exactly as
//! design note §9 calls for ("the memory formatter does not depend on
//! width").

use std::fmt::Write as _;

use crate::names;

/// SIB scale factor. Stored as the literal multiplier, not a 2-bit code, so
/// the writer (§4.1.1 rule 3) can print it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scale {
    X1 = 1,
    X2 = 2,
    X4 = 4,
    X8 = 8,
}

impl Scale {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<Scale> {
        match v {
            1 => Some(Scale::X1),
            2 => Some(Scale::X2),
            4 => Some(Scale::X4),
            8 => Some(Scale::X8),
            _ => None,
        }
    }
}

/// `[seg:] [base] [+ index*scale] [+ disp]`, or RIP-relative `[rip + disp]`.
///
/// Base/index are always GPR64 indices (0..16): the source's 32-bit
/// compatibility addressing is represented purely by `addr_size_override`,
/// which only changes how the writer *prints* base/index (§4.1.1 rule 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mem {
    pub seg: Option<u8>,
    pub base: Option<u8>,
    pub index: Option<(u8, Scale)>,
    pub disp: i32,
    pub rip_relative: bool,
    pub addr_size_override: bool,
}

impl Mem {
    pub fn new() -> Self {
        Mem {
            seg: None,
            base: None,
            index: None,
            disp: 0,
            rip_relative: false,
            addr_size_override: false,
        }
    }

    pub fn with_base(mut self, base: u8) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_index(mut self, index: u8, scale: Scale) -> Self {
        self.index = Some((index, scale));
        self
    }

    pub fn with_disp(mut self, disp: i32) -> Self {
        self.disp = disp;
        self
    }

    pub fn with_seg(mut self, seg: u8) -> Self {
        self.seg = Some(seg);
        self
    }

    pub fn rip_relative(disp: i32) -> Self {
        Mem {
            rip_relative: true,
            disp,
            ..Mem::new()
        }
    }

    /// §4.1.1 validity: segment/base/index individually valid, scale is one
    /// of 1/2/4/8 by construction, index is never RSP/ESP (index 4), and
    /// RIP-relative mode excludes both base and index.
    pub fn check(&self) -> bool {
        if let Some(seg) = self.seg
            && seg >= 6 {
                return false;
            }
        if let Some(base) = self.base
            && base >= 16 {
                return false;
            }
        if let Some((index, _)) = self.index
            && (index >= 16 || index == 4) {
                return false;
            }
        if self.rip_relative && (self.base.is_some() || self.index.is_some()) {
            return false;
        }
        true
    }

    pub fn write_att(&self, out: &mut String) {
        if let Some(seg) = self.seg {
            let _ = write!(out, "%{}:", names::SREG[seg as usize]);
        }

        let has_base_or_index = self.base.is_some() || self.index.is_some();
        if self.disp != 0 || !has_base_or_index {
            if self.disp < 0 {
                let _ = write!(out, "-0x{:x}", (self.disp as i64).unsigned_abs());
            } else {
                let _ = write!(out, "0x{:x}", self.disp);
            }
        }

        if self.rip_relative || has_base_or_index {
            out.push('(');
            if self.rip_relative {
                out.push_str("%rip");
            } else {
                let reg_name = |index: u8| -> &'static str {
                    if self.addr_size_override {
                        names::R32[index as usize]
                    } else {
                        names::R64[index as usize]
                    }
                };
                if let Some(base) = self.base {
                    let _ = write!(out, "%{}", reg_name(base));
                }
                if let Some((index, scale)) = self.index {
                    let _ = write!(out, ",%{},{}", reg_name(index), scale.as_u8());
                }
            }
            out.push(')');
        }
    }
}

impl Default for Mem {
    fn default() -> Self {
        Mem::new()
    }
}

/// An absolute `Moffs*` operand: no base/index register exists at all, just
/// an address and an optional segment override (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Moffs {
    pub seg: Option<u8>,
    pub addr: u64,
}

impl Moffs {
    pub fn new(addr: u64) -> Self {
        Moffs { seg: None, addr }
    }

    pub fn with_seg(mut self, seg: u8) -> Self {
        self.seg = Some(seg);
        self
    }

    pub fn check(&self) -> bool {
        self.seg.is_none_or(|seg| seg < 6)
    }

    pub fn write_att(&self, out: &mut String) {
        if let Some(seg) = self.seg {
            let _ = write!(out, "%{}:", names::SREG[seg as usize]);
        }
        let _ = write!(out, "0x{:x}", self.addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rip_relative_excludes_base_and_index() {
        let m = Mem::rip_relative(0x20);
        assert!(m.check());
        let bad = m.with_base(5);
        assert!(!bad.check());
    }

    #[test]
    fn index_cannot_be_rsp() {
        let m = Mem::new().with_base(0).with_index(4, Scale::X1);
        assert!(!m.check());
    }

    #[test]
    fn writer_elides_zero_disp_with_base() {
        let m = Mem::new().with_base(5); // %rbp, disp 0
        let mut s = String::new();
        m.write_att(&mut s);
        assert_eq!(s, "(%rbp)");
    }

    #[test]
    fn writer_keeps_disp_with_no_base_or_index() {
        let m = Mem::new().with_disp(0);
        let mut s = String::new();
        m.write_att(&mut s);
        assert_eq!(s, "0x0");
    }

    #[test]
    fn writer_rip_relative() {
        let m = Mem::rip_relative(0x20);
        let mut s = String::new();
        m.write_att(&mut s);
        assert_eq!(s, "0x20(%rip)");
    }

    #[test]
    fn writer_negative_disp() {
        let m = Mem::new().with_base(5).with_disp(-8);
        let mut s = String::new();
        m.write_att(&mut s);
        assert_eq!(s, "-0x8(%rbp)");
    }
}
