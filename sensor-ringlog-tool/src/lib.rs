//! Host side companion of `sensor-ringlog`: decodes notification captures and raw partition
//! dumps of a sensor node and exports the records as CSV.

pub mod capture;
pub mod crc;
pub mod error;
pub mod flash;
pub mod image;

mod csv;

pub use capture::{decode_hex, Header, Session};
pub use error::Error;
pub use flash::{MemoryFlash, FLASH_SECTOR_SIZE};
pub use image::{MetaImage, RecordLog};
pub use sensor_ringlog::{Packet, Persisted, Record, Status};

/// A record together with its logical index on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggedRecord {
    pub index: u32,
    pub record: Record,
}

impl LoggedRecord {
    pub fn new(index: u32, record: Record) -> Self {
        Self { index, record }
    }
}
