/// Running CRC-8 as used in 1-Wire ROM codes and scratchpads.
///
/// The polynomial is x^8 + x^5 + x^4 + 1. The register is shifted right
/// before feedback, so the feedback lands on bit positions 3, 4 and 7
/// (the 0x8c mask).
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc8(u8);

impl Crc8 {
    /// Current CRC value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Fold one byte into the running CRC.
    pub fn update(&mut self, byte: u8) {
        let mut crc = self.0;
        let mut data = byte;
        for _ in 0..8 {
            let feedback = (crc ^ data) & 0x01;
            crc >>= 1;
            if feedback != 0 {
                crc ^= 0x8c;
            }
            data >>= 1;
        }
        self.0 = crc;
    }

    /// CRC of a whole buffer in one pass.
    pub fn of(data: &[u8]) -> u8 {
        let mut crc = Crc8::default();
        for &byte in data {
            crc.update(byte);
        }
        crc.0
    }

    /// Validate a sequence whose last byte is the CRC of the preceding
    /// bytes. Folding the stored CRC into the CRC of the payload yields
    /// zero exactly when they match.
    pub fn validate(sequence: &[u8]) -> bool {
        Self::of(sequence) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::Crc8;

    // ROM code of a real DS18B20; byte 7 is the CRC of bytes 0..7.
    const ROM: [u8; 8] = [0x28, 0x6e, 0x38, 0xdd, 0x06, 0x00, 0x00, 0x39];

    #[test]
    fn known_rom_code_validates() {
        assert_eq!(Crc8::of(&ROM[..7]), ROM[7]);
        assert!(Crc8::validate(&ROM));
    }

    #[test]
    fn corrupted_rom_code_fails() {
        let mut rom = ROM;
        rom[3] ^= 0x10;
        assert!(!Crc8::validate(&rom));
    }

    #[test]
    fn iterative_update_matches_one_pass() {
        let payloads: [[u8; 7]; 3] = [
            [0x28, 0x6e, 0x38, 0xdd, 0x06, 0x00, 0x00],
            [0xff; 7],
            [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40],
        ];
        for payload in payloads {
            let mut crc = Crc8::default();
            for &byte in &payload {
                crc.update(byte);
            }
            assert_eq!(crc.value(), Crc8::of(&payload));
        }
    }

    #[test]
    fn crc_of_empty_is_zero() {
        assert_eq!(Crc8::of(&[]), 0);
    }
}
