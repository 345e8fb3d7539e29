//! RAM-backed flash for host builds and tests.
//!
//! Behaves like NOR: cells start erased (`0xFF`), programming requires
//! erased cells, and erase resets a range.  A read fault can be injected to
//! exercise the error paths.

use log::debug;

use crate::app::ports::{ERASED_BYTE, FlashError, FlashPort};
use crate::storage::layout::FLASH_SIZE;

#[derive(Debug, Clone)]
pub struct MemoryFlash {
    cells: Vec<u8>,
    fail_reads: bool,
}

impl MemoryFlash {
    /// A fully erased device large enough for every region.
    pub fn new() -> Self {
        Self::with_size(FLASH_SIZE)
    }

    pub fn with_size(size: u32) -> Self {
        debug!("MemoryFlash: {size} bytes");
        Self {
            cells: vec![ERASED_BYTE; size as usize],
            fail_reads: false,
        }
    }

    /// Make every subsequent read fail with [`FlashError::IoError`].
    pub fn set_read_fault(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Overwrite cells without the erased check (simulates data written by
    /// an external tool).
    pub fn poke(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        let range = self.range(addr, data.len())?;
        self.cells[range].copy_from_slice(data);
        Ok(())
    }

    fn range(&self, addr: u32, len: usize) -> Result<core::ops::Range<usize>, FlashError> {
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(FlashError::OutOfBounds)?;
        if end > self.cells.len() {
            return Err(FlashError::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl Default for MemoryFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashPort for MemoryFlash {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        if self.fail_reads {
            return Err(FlashError::IoError);
        }
        let range = self.range(addr, buf.len())?;
        buf.copy_from_slice(&self.cells[range]);
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        let range = self.range(addr, data.len())?;
        if self.cells[range.clone()].iter().any(|&b| b != ERASED_BYTE) {
            return Err(FlashError::NotErased);
        }
        self.cells[range].copy_from_slice(data);
        Ok(())
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError> {
        let range = self.range(addr, len as usize)?;
        self.cells[range].fill(ERASED_BYTE);
        Ok(())
    }

    fn capacity(&self) -> u32 {
        self.cells.len() as u32
    }
}
