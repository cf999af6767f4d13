//! Decoding of the factory-fused calibration coefficients.

use core::fmt;

/// Size of the first calibration block (`calib00..calib23` plus `dig_H1` at 0xA1).
pub const BLOCK_A_LEN: usize = 25;
/// Size of the second calibration block (`calib26..calib32`, 0xE1..0xE7).
pub const BLOCK_B_LEN: usize = 7;

/// Constructs an unsigned 16-bit value from two register bytes.
pub const fn build_u16(msb: u8, lsb: u8) -> u16 {
    ((msb as u16) << 8) | lsb as u16
}

/// Constructs a two's-complement 16-bit value from two register bytes.
pub const fn build_s16(msb: u8, lsb: u8) -> i16 {
    build_u16(msb, lsb) as i16
}

/// Reinterprets a register byte as a two's-complement 8-bit value.
pub const fn build_s8(b: u8) -> i8 {
    b as i8
}

/// Identifies which of the two calibration blocks was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibBlock {
    /// Block starting at 0x88.
    A,
    /// Block starting at 0xE1.
    B,
}

/// A calibration block was shorter than the coefficient layout requires.
///
/// Without the full set of coefficients no compensation is possible, so this
/// is fatal for the driver session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MalformedCalibrationData {
    /// The offending block.
    pub block: CalibBlock,
    /// Required number of bytes.
    pub expected: usize,
    /// Number of bytes supplied.
    pub actual: usize,
}

impl fmt::Display for MalformedCalibrationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "calibration block {:?} too short: expected {} bytes, got {}",
            self.block, self.expected, self.actual
        )
    }
}

/// Factory-fused calibration coefficients read from the sensor.
/// These are unique to every individual chip and required for the compensation formulas.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibData {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    /// 12-bit signed, shares register 0xE5 with `dig_h5`.
    pub dig_h4: i16,
    /// 12-bit signed, shares register 0xE5 with `dig_h4`.
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl CalibData {
    /// Decodes the coefficients from the two raw calibration blocks.
    ///
    /// `block_a` holds the 24 bytes read from 0x88 followed by `dig_H1`
    /// (0xA1), `block_b` the 7 bytes read from 0xE1. Trailing bytes beyond
    /// [`BLOCK_A_LEN`] / [`BLOCK_B_LEN`] are ignored.
    ///
    /// # Errors
    /// Returns [`MalformedCalibrationData`] if either block is too short.
    pub fn decode(block_a: &[u8], block_b: &[u8]) -> Result<Self, MalformedCalibrationData> {
        let a = check_len(block_a, BLOCK_A_LEN, CalibBlock::A)?;
        let b = check_len(block_b, BLOCK_B_LEN, CalibBlock::B)?;

        // See BME280 datasheet, Table 16: Compensation parameter storage
        Ok(CalibData {
            dig_t1: build_u16(a[1], a[0]),
            dig_t2: build_s16(a[3], a[2]),
            dig_t3: build_s16(a[5], a[4]),
            dig_p1: build_u16(a[7], a[6]),
            dig_p2: build_s16(a[9], a[8]),
            dig_p3: build_s16(a[11], a[10]),
            dig_p4: build_s16(a[13], a[12]),
            dig_p5: build_s16(a[15], a[14]),
            dig_p6: build_s16(a[17], a[16]),
            dig_p7: build_s16(a[19], a[18]),
            dig_p8: build_s16(a[21], a[20]),
            dig_p9: build_s16(a[23], a[22]),
            dig_h1: a[24],
            dig_h2: build_s16(b[1], b[0]),
            dig_h3: b[2],
            // 0xE4 holds H4[11:4], 0xE5[3:0] holds H4[3:0]
            dig_h4: ((build_s8(b[3]) as i16) << 4) | (b[4] & 0x0F) as i16,
            // 0xE6 holds H5[11:4], 0xE5[7:4] holds H5[3:0]
            dig_h5: ((build_s8(b[5]) as i16) << 4) | (b[4] >> 4) as i16,
            dig_h6: build_s8(b[6]),
        })
    }
}

fn check_len(
    block: &[u8],
    expected: usize,
    which: CalibBlock,
) -> Result<&[u8], MalformedCalibrationData> {
    if block.len() < expected {
        return Err(MalformedCalibrationData {
            block: which,
            expected,
            actual: block.len(),
        });
    }
    Ok(&block[..expected])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Calibration bytes of the Bosch datasheet example
    /// (T1=27504, T2=26435, T3=-1000, P1=36477 ...), with a hand-picked
    /// humidity set (H1=75, H2=362, H3=0, H4=324, H5=0, H6=30).
    pub(crate) const DATASHEET_BLOCK_A: [u8; BLOCK_A_LEN] = [
        112, 107, 67, 103, 24, 252, 125, 142, 67, 214, 208, 11, 39, 11, 140, 0, 249, 255, 140,
        60, 248, 198, 112, 23, 75,
    ];
    pub(crate) const DATASHEET_BLOCK_B: [u8; BLOCK_B_LEN] = [106, 1, 0, 20, 4, 0, 30];

    #[test]
    fn build_s16_twos_complement() {
        assert_eq!(build_s16(0xFF, 0xFF), -1);
        assert_eq!(build_s16(0x00, 0x01), 1);
        assert_eq!(build_s16(0x7F, 0xFF), 32767);
        assert_eq!(build_s16(0x80, 0x00), -32768);
    }

    #[test]
    fn build_u16_keeps_high_bit() {
        assert_eq!(build_u16(0xFF, 0xFF), 65535);
        assert_eq!(build_u16(0x6B, 0x70), 27504);
    }

    #[test]
    fn build_s8_twos_complement() {
        assert_eq!(build_s8(0x80), -128);
        assert_eq!(build_s8(0x7F), 127);
        assert_eq!(build_s8(0x00), 0);
        assert_eq!(build_s8(0xFF), -1);
    }

    #[test]
    fn decode_datasheet_coefficients() {
        let calib = CalibData::decode(&DATASHEET_BLOCK_A, &DATASHEET_BLOCK_B).unwrap();

        assert_eq!(calib.dig_t1, 27504);
        assert_eq!(calib.dig_t2, 26435);
        assert_eq!(calib.dig_t3, -1000);
        assert_eq!(calib.dig_p1, 36477);
        assert_eq!(calib.dig_p2, -10685);
        assert_eq!(calib.dig_p3, 3024);
        assert_eq!(calib.dig_p4, 2855);
        assert_eq!(calib.dig_p5, 140);
        assert_eq!(calib.dig_p6, -7);
        assert_eq!(calib.dig_p7, 15500);
        assert_eq!(calib.dig_p8, -14600);
        assert_eq!(calib.dig_p9, 6000);
        assert_eq!(calib.dig_h1, 75);
        assert_eq!(calib.dig_h2, 362);
        assert_eq!(calib.dig_h3, 0);
        assert_eq!(calib.dig_h4, 324);
        assert_eq!(calib.dig_h5, 0);
        assert_eq!(calib.dig_h6, 30);
    }

    #[test]
    fn decode_is_idempotent() {
        let first = CalibData::decode(&DATASHEET_BLOCK_A, &DATASHEET_BLOCK_B).unwrap();
        let second = CalibData::decode(&DATASHEET_BLOCK_A, &DATASHEET_BLOCK_B).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn h4_h5_nibble_interleave() {
        let block_b = [0, 0, 0, 0x12, 0xAB, 0x34, 0];
        let calib = CalibData::decode(&DATASHEET_BLOCK_A, &block_b).unwrap();
        // 0x12 << 4 | 0xB
        assert_eq!(calib.dig_h4, 0x12B);
        // 0x34 << 4 | 0xA
        assert_eq!(calib.dig_h5, 0x34A);
    }

    #[test]
    fn h4_h5_negative_high_byte() {
        let block_b = [0, 0, 0, 0xF2, 0xAB, 0x80, 0];
        let calib = CalibData::decode(&DATASHEET_BLOCK_A, &block_b).unwrap();
        // -14 << 4 | 0xB
        assert_eq!(calib.dig_h4, -213);
        // -128 << 4 | 0xA
        assert_eq!(calib.dig_h5, -2038);
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut block_a = [0xEE; 26];
        block_a[..BLOCK_A_LEN].copy_from_slice(&DATASHEET_BLOCK_A);
        let calib = CalibData::decode(&block_a, &DATASHEET_BLOCK_B).unwrap();
        assert_eq!(calib.dig_h1, 75);
    }

    #[test]
    fn decode_rejects_short_blocks() {
        let err = CalibData::decode(&DATASHEET_BLOCK_A[..24], &DATASHEET_BLOCK_B).unwrap_err();
        assert_eq!(
            err,
            MalformedCalibrationData {
                block: CalibBlock::A,
                expected: 25,
                actual: 24
            }
        );

        let err = CalibData::decode(&DATASHEET_BLOCK_A, &[]).unwrap_err();
        assert_eq!(err.block, CalibBlock::B);
        assert_eq!(err.expected, 7);
        assert_eq!(err.actual, 0);
    }
}
