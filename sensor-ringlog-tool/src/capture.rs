//! Decoding of notification streams captured on the client side, e.g. with a BLE sniffer or
//! the logging of a phone app.

use std::fs;
use std::path::Path;

use sensor_ringlog::Packet;

use crate::error::Error;
use crate::LoggedRecord;

/// Content of the header packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub interval_sec: u16,
    pub total: u16,
    pub last_sent: u16,
}

/// One transfer session as seen by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub header: Option<Header>,
    /// Records in the order they were received, indexed by the sequence number of their
    /// data packet
    pub records: Vec<LoggedRecord>,
    /// Count reported by the end packet, `None` while the session is still open
    pub total_sent: Option<u16>,
}

impl Session {
    /// Parse a capture with one hex encoded packet per line.
    ///
    /// Anything up to the last `:` of a line is treated as a prefix (timestamps, handle
    /// names) and ignored, as are spaces, dashes and a leading `0x`. Blank lines and lines
    /// starting with `#` are skipped. A header packet starts a new session, so a capture with
    /// several sessions yields the last one.
    pub fn from_capture(text: &str) -> Result<Self, Error> {
        let mut session = Session::default();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let invalid = |reason: String| Error::InvalidLine {
                line: number + 1,
                reason,
            };

            let raw = decode_hex(line).map_err(|e| invalid(e.to_string()))?;
            let packet = Packet::decode(&raw).map_err(|e| invalid(e.to_string()))?;
            session.push(packet);
        }

        Ok(session)
    }

    /// Parse a capture file, see [`Session::from_capture`].
    pub fn from_capture_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_capture(&fs::read_to_string(path)?)
    }

    /// Applies one received packet.
    pub fn push(&mut self, packet: Packet) {
        match packet {
            Packet::Header {
                interval_sec,
                total,
                last_sent,
            } => {
                *self = Session {
                    header: Some(Header {
                        interval_sec,
                        total,
                        last_sent,
                    }),
                    ..Session::default()
                };
            }
            Packet::Data { seq, .. } => {
                for (i, record) in packet.records().iter().enumerate() {
                    self.records
                        .push(LoggedRecord::new(u32::from(seq) + i as u32, *record));
                }
            }
            Packet::End { total_sent } => self.total_sent = Some(total_sent),
        }
    }

    /// Header and end packet were received and every announced record arrived.
    pub fn is_complete(&self) -> bool {
        self.header.is_some()
            && self
                .total_sent
                .is_some_and(|sent| usize::from(sent) == self.records.len())
    }

    /// Serialize the received records to CSV.
    pub fn to_csv(&self) -> Result<String, Error> {
        crate::csv::write_csv_content(&self.records)
    }

    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        crate::csv::write_csv(&self.records, path)
    }
}

/// Hex payload of a single line or command line argument.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let payload = text.rsplit(':').next().unwrap_or(text).trim();
    let payload = payload
        .strip_prefix("0x")
        .or_else(|| payload.strip_prefix("0X"))
        .unwrap_or(payload);
    let digits: String = payload
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    hex::decode(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_ringlog::Record;

    #[test]
    fn hex_prefixes_and_separators() {
        assert_eq!(decode_hex("0a0B").unwrap(), vec![0x0A, 0x0B]);
        assert_eq!(decode_hex("12:00:01 notif: 0a 0b").unwrap(), vec![0x0A, 0x0B]);
        assert_eq!(decode_hex("value: 0x0A-0B").unwrap(), vec![0x0A, 0x0B]);
        assert!(decode_hex("0a0").is_err());
    }

    #[test]
    fn header_starts_a_new_session() {
        let mut session = Session::default();
        session.push(Packet::header(10, 1, 0));
        session.push(Packet::data(4, &[Record::new(1, 2, 3, 4)]));
        session.push(Packet::header(10, 0, 5));

        assert_eq!(
            session,
            Session {
                header: Some(Header {
                    interval_sec: 10,
                    total: 0,
                    last_sent: 5,
                }),
                ..Session::default()
            }
        );
        assert!(!session.is_complete());

        session.push(Packet::end(0));
        assert!(session.is_complete());
    }

    #[test]
    fn bad_lines_are_reported() {
        let err = Session::from_capture("# comment\n\n0011\n").unwrap_err();
        assert!(matches!(err, Error::InvalidLine { line: 3, .. }));

        let err = Session::from_capture(&"07".repeat(20)).unwrap_err();
        assert!(matches!(err, Error::InvalidLine { line: 1, .. }));
    }
}
