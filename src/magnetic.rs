/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Magnetic field samples.
//!
//! The output registers hold one 16 bit two's complement value per axis,
//! low byte first, at a fixed sensitivity of 1.5 milligauss per LSB.

/// Sensitivity in milligauss per LSB
pub const MILLIGAUSS_PER_LSB: f32 = 1.5;

const MICROTESLA_PER_MILLIGAUSS: f32 = 0.1;

/// Magnetic field in milligauss
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct MagneticField {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl MagneticField {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Decode the OUTX_L..OUTZ_H block and scale to milligauss.
    ///
    /// Scaling truncates toward zero and saturates at the i16 range.
    pub fn from_raw_bytes(data: &[u8; 6]) -> Self {
        Self {
            x: scale(i16::from_le_bytes([data[0], data[1]])),
            y: scale(i16::from_le_bytes([data[2], data[3]])),
            z: scale(i16::from_le_bytes([data[4], data[5]])),
        }
    }

    pub fn to_microtesla(&self) -> [f32; 3] {
        [
            self.x as f32 * MICROTESLA_PER_MILLIGAUSS,
            self.y as f32 * MICROTESLA_PER_MILLIGAUSS,
            self.z as f32 * MICROTESLA_PER_MILLIGAUSS,
        ]
    }
}

fn scale(raw: i16) -> i16 {
    (raw as f32 * MILLIGAUSS_PER_LSB) as i16
}
