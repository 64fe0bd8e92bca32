use std::path::Path;

use csv::{Writer, WriterBuilder};
use serde::Serialize;

use crate::error::Error;
use crate::LoggedRecord;

const COLUMNS: [&str; 5] = ["index", "temp_c", "press_kpa", "hum_pct", "battery_v"];

#[derive(Serialize)]
struct Row {
    index: u32,
    temp_c: f32,
    press_kpa: u16,
    hum_pct: u8,
    battery_v: f32,
}

impl From<&LoggedRecord> for Row {
    fn from(logged: &LoggedRecord) -> Self {
        Self {
            index: logged.index,
            temp_c: logged.record.temperature_c(),
            press_kpa: logged.record.press_kpa,
            hum_pct: logged.record.hum_pct,
            battery_v: logged.record.battery_v(),
        }
    }
}

/// Serialize records to a CSV file at the given `output_path`, one row per record in the
/// given order. The header row is written even if there are no records.
pub(crate) fn write_csv<P: AsRef<Path>>(
    records: &[LoggedRecord],
    output_path: P,
) -> Result<(), Error> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(output_path)?;
    write_records(&mut wtr, records)
}

/// Serialize records to CSV and return the content as a `String`.
pub(crate) fn write_csv_content(records: &[LoggedRecord]) -> Result<String, Error> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    write_records(&mut wtr, records)?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| Error::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::InvalidValue(format!("CSV output is not valid UTF-8: {}", e)))
}

fn write_records<W: std::io::Write>(
    wtr: &mut Writer<W>,
    records: &[LoggedRecord],
) -> Result<(), Error> {
    wtr.write_record(COLUMNS)?;
    for logged in records {
        wtr.serialize(Row::from(logged))?;
    }

    wtr.flush()?;
    Ok(())
}
