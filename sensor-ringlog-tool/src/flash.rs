use embedded_storage::nor_flash::{
    check_erase, check_read, check_write, ErrorType, NorFlash, NorFlashError, NorFlashErrorKind,
    ReadNorFlash,
};
use sensor_ringlog::platform::Crc;

use crate::crc::crc32_update;

pub const FLASH_SECTOR_SIZE: usize = 4096;

/// A partition dump held in memory, behaving like the ESP32 SPI flash: writes can only clear
/// bits and erases work on whole 4 KiB sectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFlash {
    buf: Vec<u8>,
}

impl MemoryFlash {
    /// An erased flash of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![0xFF; size],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buf: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryFlashError(NorFlashErrorKind);

impl NorFlashError for MemoryFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        self.0
    }
}

impl ErrorType for MemoryFlash {
    type Error = MemoryFlashError;
}

impl ReadNorFlash for MemoryFlash {
    const READ_SIZE: usize = 4;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        check_read(self, offset, bytes.len()).map_err(MemoryFlashError)?;

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl NorFlash for MemoryFlash {
    const WRITE_SIZE: usize = 4;

    const ERASE_SIZE: usize = FLASH_SECTOR_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        check_erase(self, from, to).map_err(MemoryFlashError)?;

        self.buf[from as usize..to as usize].fill(0xFF);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        check_write(self, offset, bytes.len()).map_err(MemoryFlashError)?;

        let offset = offset as usize;
        for (dst, &src) in self.buf[offset..offset + bytes.len()].iter_mut().zip(bytes) {
            *dst &= src;
        }
        Ok(())
    }
}

impl Crc for MemoryFlash {
    fn crc32(init: u32, data: &[u8]) -> u32 {
        crc32_update(init, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_only_clear_bits() {
        let mut flash = MemoryFlash::new(FLASH_SECTOR_SIZE);
        flash.write(0, &[0x0F, 0xF0, 0xFF, 0x00]).unwrap();
        flash.write(0, &[0xF0, 0xF0, 0x0F, 0xFF]).unwrap();
        assert_eq!(&flash.as_bytes()[..4], &[0x00, 0xF0, 0x0F, 0x00]);

        flash.erase(0, FLASH_SECTOR_SIZE as u32).unwrap();
        assert!(flash.as_bytes().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn rejects_unaligned_access() {
        let mut flash = MemoryFlash::new(FLASH_SECTOR_SIZE);
        assert_eq!(
            flash.write(2, &[0; 4]).unwrap_err().kind(),
            NorFlashErrorKind::NotAligned
        );
        assert_eq!(
            flash.read(FLASH_SECTOR_SIZE as u32, &mut [0; 4]).unwrap_err().kind(),
            NorFlashErrorKind::OutOfBounds
        );
    }
}
