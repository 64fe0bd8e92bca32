//! Decoding of raw partition dumps read back from a node, e.g. with `espflash read-flash`.

use std::fs;
use std::io::Write;
use std::path::Path;

use sensor_ringlog::{MetaStore, Persisted, Record, RECORD_SIZE};

use crate::error::Error;
use crate::flash::{MemoryFlash, FLASH_SECTOR_SIZE};
use crate::LoggedRecord;

/// Content of a metadata partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetaImage {
    pub persisted: Persisted,
}

impl MetaImage {
    pub fn new(persisted: Persisted) -> Self {
        Self { persisted }
    }

    /// Mounts a copy of the dump the way the node does on boot. Keys with a corrupt latest
    /// item fall back to their previous value, keys without any valid item to zero.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        check_size(bytes.len())?;

        let mut flash = MemoryFlash::from_bytes(bytes);
        let mut store = MetaStore::new(0, bytes.len(), &mut flash);
        store.mount(false).map_err(Error::Metadata)?;

        Ok(Self::new(store.load()))
    }

    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::parse(&fs::read(path)?)
    }

    /// Builds a metadata partition of `size` bytes holding the persisted scalars.
    pub fn generate(&self, size: usize) -> Result<Vec<u8>, Error> {
        check_size(size)?;

        let mut flash = MemoryFlash::new(size);
        let mut store = MetaStore::new(0, size, &mut flash);
        store.mount(false).map_err(Error::Metadata)?;
        store.save(&self.persisted).map_err(Error::Metadata)?;
        drop(store);

        Ok(flash.into_inner())
    }

    pub fn generate_file<P: AsRef<Path>>(&self, path: P, size: usize) -> Result<(), Error> {
        let data = self.generate(size)?;
        fs::File::create(path)?.write_all(&data)?;
        Ok(())
    }
}

fn check_size(size: usize) -> Result<(), Error> {
    if size == 0 || !size.is_multiple_of(FLASH_SECTOR_SIZE) || size / FLASH_SECTOR_SIZE < 2 {
        return Err(Error::InvalidPartitionSize(size));
    }
    Ok(())
}

/// The readable records of a data partition dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLog {
    /// Number of record slots in the partition
    pub capacity: u32,
    /// Records of the window `[next_index - capacity, next_index)` in logical order. Slots
    /// that were never written are left out.
    pub records: Vec<LoggedRecord>,
}

impl RecordLog {
    /// Decodes the committed records of a data partition.
    ///
    /// Records that were still staged in RAM when the dump was taken are not part of it. A
    /// wrapped log needs a write pointer of at least `capacity`.
    pub fn from_image(data: &[u8], persisted: &Persisted) -> Result<Self, Error> {
        let capacity = u32::try_from(data.len() / RECORD_SIZE)
            .map_err(|_| Error::InvalidValue(format!("image too large: {} bytes", data.len())))?;
        if capacity == 0 {
            return Err(Error::EmptyImage(data.len()));
        }

        let committed = persisted.next_index;
        if persisted.wrapped && committed < capacity {
            return Err(Error::InvalidValue(format!(
                "log marked wrapped but write pointer {committed} is below capacity {capacity}"
            )));
        }
        let floor = committed.saturating_sub(capacity);

        let records = (floor..committed)
            .filter_map(|index| {
                let offset = (index % capacity) as usize * RECORD_SIZE;
                let raw: &[u8; RECORD_SIZE] = data[offset..offset + RECORD_SIZE].try_into().ok()?;
                if raw.iter().all(|&b| b == 0xFF) {
                    return None;
                }
                Some(LoggedRecord::new(index, Record::from_bytes(raw)))
            })
            .collect();

        Ok(Self { capacity, records })
    }

    pub fn from_image_file<P: AsRef<Path>>(path: P, persisted: &Persisted) -> Result<Self, Error> {
        Self::from_image(&fs::read(path)?, persisted)
    }

    /// Serialize the records to CSV.
    pub fn to_csv(&self) -> Result<String, Error> {
        crate::csv::write_csv_content(&self.records)
    }

    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        crate::csv::write_csv(&self.records, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_roundtrip() {
        let image = MetaImage::new(Persisted {
            next_index: 1234,
            last_sent_index: 1000,
            wrapped: true,
        });
        let bytes = image.generate(2 * FLASH_SECTOR_SIZE).unwrap();
        assert_eq!(MetaImage::parse(&bytes).unwrap(), image);
    }

    #[test]
    fn blank_metadata_is_zero() {
        let bytes = vec![0xFF; 2 * FLASH_SECTOR_SIZE];
        assert_eq!(MetaImage::parse(&bytes).unwrap(), MetaImage::default());
    }

    #[test]
    fn metadata_size_is_checked() {
        assert!(matches!(
            MetaImage::parse(&[0xFF; FLASH_SECTOR_SIZE]),
            Err(Error::InvalidPartitionSize(FLASH_SECTOR_SIZE))
        ));
    }

    #[test]
    fn window_after_wrap() {
        // three slots, five records written: slot 0 = #3, slot 1 = #4, slot 2 = #2
        let mut data = Vec::new();
        for temp in [3, 4, 2] {
            data.extend_from_slice(&Record::new(temp, 0, 0, 0).to_bytes());
        }
        let persisted = Persisted {
            next_index: 5,
            last_sent_index: 0,
            wrapped: true,
        };

        let log = RecordLog::from_image(&data, &persisted).unwrap();
        assert_eq!(log.capacity, 3);
        let indices: Vec<(u32, i16)> = log
            .records
            .iter()
            .map(|logged| (logged.index, logged.record.temp_x10))
            .collect();
        assert_eq!(indices, vec![(2, 2), (3, 3), (4, 4)]);
    }

    #[test]
    fn erased_slots_are_skipped() {
        let mut data = vec![0xFF; 4 * RECORD_SIZE];
        data[..RECORD_SIZE].copy_from_slice(&Record::new(1, 2, 3, 4).to_bytes());
        let persisted = Persisted {
            next_index: 2,
            ..Persisted::default()
        };

        let log = RecordLog::from_image(&data, &persisted).unwrap();
        assert_eq!(
            log.records,
            vec![LoggedRecord::new(0, Record::new(1, 2, 3, 4))]
        );
    }

    #[test]
    fn wrapped_flag_needs_a_full_log() {
        let data = vec![0xFF; 4 * RECORD_SIZE];
        let mut persisted = Persisted {
            next_index: 3,
            last_sent_index: 0,
            wrapped: true,
        };
        assert!(matches!(
            RecordLog::from_image(&data, &persisted),
            Err(Error::InvalidValue(_))
        ));

        persisted.next_index = 4;
        assert!(RecordLog::from_image(&data, &persisted).unwrap().records.is_empty());
    }
}
