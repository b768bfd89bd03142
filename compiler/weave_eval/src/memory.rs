//! Byte-addressed stack memory.
//!
//! Frames are carved from one contiguous region with a bump pointer. A
//! function reserves its allocas on entry and releases everything above its
//! [`Mark`] on return. Addresses below [`Memory::BASE`] are never handed
//! out, so a zero pointer is always invalid. Only the live part of the
//! region (below the bump pointer) is accessible.

use weave_ir::{Scalar, Type};

use crate::error::{EvalError, EvalResult};

/// Saved bump pointer, restored by [`Memory::release`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark(u64);

/// Little-endian stack memory.
#[derive(Debug)]
pub struct Memory {
    bytes: Vec<u8>,
    top: u64,
    limit: u64,
}

impl Memory {
    /// First valid address.
    pub const BASE: u64 = 16;

    /// Memory that can hold `capacity` bytes of frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            top: Self::BASE,
            limit: Self::BASE + capacity as u64,
        }
    }

    /// Bytes currently reserved by live frames.
    pub fn in_use(&self) -> u64 {
        self.top - Self::BASE
    }

    pub fn mark(&self) -> Mark {
        Mark(self.top)
    }

    /// Release every allocation made since `mark`.
    pub fn release(&mut self, mark: Mark) {
        debug_assert!(mark.0 <= self.top, "released a mark above the stack top");
        self.top = mark.0;
    }

    /// Reserve `size` zeroed bytes aligned to `align`, returning the address.
    pub fn alloc(&mut self, size: u64, align: u64) -> EvalResult<u64> {
        let align = align.max(1);
        let start = self.top.next_multiple_of(align);
        let end = start + size.max(1);
        if end > self.limit {
            return Err(EvalError::StackOverflow {
                requested: size,
                available: self.limit.saturating_sub(self.top),
            });
        }
        let (lo, hi) = (Self::offset(start), Self::offset(end));
        if self.bytes.len() < hi {
            self.bytes.resize(hi, 0);
        }
        self.bytes[lo..hi].fill(0);
        self.top = end;
        Ok(start)
    }

    pub fn read(&self, addr: u64, len: u64) -> EvalResult<&[u8]> {
        self.check(addr, len)?;
        let lo = Self::offset(addr);
        Ok(&self.bytes[lo..lo + len as usize])
    }

    pub fn write(&mut self, addr: u64, data: &[u8]) -> EvalResult<()> {
        self.check(addr, data.len() as u64)?;
        let lo = Self::offset(addr);
        self.bytes[lo..lo + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Load a scalar of type `ty` from `addr`.
    pub fn load(&self, ty: &Type, addr: u64) -> EvalResult<Scalar> {
        let bytes = self.read(addr, ty.size())?;
        Scalar::from_le_bytes(ty, bytes)
            .ok_or_else(|| EvalError::malformed(format!("cannot load a value of type {ty}")))
    }

    /// Store `value` at `addr`.
    pub fn store(&mut self, value: Scalar, addr: u64) -> EvalResult<()> {
        self.write(addr, &value.to_le_bytes())
    }

    fn check(&self, addr: u64, len: u64) -> EvalResult<()> {
        let in_bounds = addr >= Self::BASE
            && addr
                .checked_add(len)
                .is_some_and(|end| end <= self.top);
        if in_bounds {
            Ok(())
        } else {
            Err(EvalError::OutOfBounds { addr, len })
        }
    }

    #[inline]
    fn offset(addr: u64) -> usize {
        (addr - Self::BASE) as usize
    }
}
