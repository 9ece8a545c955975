//! CRC-16/CCITT checksum as mandated by the EMVCo Merchant Presented QR
//! specification: polynomial `0x1021`, initial register `0xFFFF`, MSB-first,
//! no input/output reflection, no final XOR.

const POLYNOMIAL: u16 = 0x1021;
const INITIAL: u16 = 0xFFFF;

/// Computes the checksum over `data`, rendered as 4 uppercase hex digits.
pub fn checksum(data: &[u8]) -> String {
    let mut crc = INITIAL;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    format!("{crc:04X}")
}

/// Checks the trailing 4 characters of `payload` against the checksum of
/// everything before them. The covered prefix includes the `6304` tag+length
/// of the checksum field itself; comparison is case-insensitive.
///
/// Payloads shorter than 4 characters are invalid, not an error.
pub fn verify(payload: &str) -> bool {
    let n = payload.len();
    if n < 4 || !payload.is_char_boundary(n - 4) {
        return false;
    }
    let (data, claimed) = payload.split_at(n - 4);
    checksum(data.as_bytes()).eq_ignore_ascii_case(claimed)
}
