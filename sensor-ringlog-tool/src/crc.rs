/// CRC32 using the IEEE 802.3 polynomial (0xEDB88320, bit-reversed 0x04C11DB7).
///
/// Continues a running checksum the way zlib's `crc32()` and the ESP ROM `crc32_le` do, which
/// is what the node uses for its metadata pages and items. `crc32_update(0, data)` is the plain
/// checksum of `data`.
pub fn crc32_update(init: u32, data: &[u8]) -> u32 {
    let mut crc = !init;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
        }
    }

    !crc
}

pub fn crc32(data: &[u8]) -> u32 {
    crc32_update(0, data)
}
