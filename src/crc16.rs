//! Table-driven CRC16/XMODEM.
//!
//! Polynomial `0x1021`, initial value `0`, no reflection, no final XOR.

/// CRC16/XMODEM generator polynomial.
pub const POLYNOMIAL: u16 = 0x1021;

/// A 256-entry lookup table for a CRC16 polynomial.
///
/// The table is built by a `const fn`, so [`Crc16Table::XMODEM`] is baked
/// into the binary and can be shared freely between threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crc16Table {
    entries: [u16; 256],
}

impl Crc16Table {
    /// The table for CRC16/XMODEM.
    pub const XMODEM: Crc16Table = Crc16Table::new(POLYNOMIAL);

    /// Builds the lookup table for `poly`.
    #[must_use]
    pub const fn new(poly: u16) -> Self {
        let mut entries = [0u16; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = (i as u16) << 8;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 0x8000 != 0 {
                    (crc << 1) ^ poly
                } else {
                    crc << 1
                };
                bit += 1;
            }
            entries[i] = crc;
            i += 1;
        }
        Crc16Table { entries }
    }

    /// Table entry for `index`.
    #[must_use]
    pub const fn entry(&self, index: u8) -> u16 {
        self.entries[index as usize]
    }

    /// Computes the checksum of `data`, starting from a zero register.
    #[must_use]
    pub fn checksum(&self, data: &[u8]) -> u16 {
        data.iter().fold(0u16, |crc, &byte| {
            let index = ((crc >> 8) as u8) ^ byte;
            (crc << 8) ^ self.entry(index)
        })
    }
}

impl Default for Crc16Table {
    fn default() -> Self {
        Crc16Table::XMODEM
    }
}
