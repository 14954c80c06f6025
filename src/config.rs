/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Sensor configuration and its encoding into the CFG_REG_A/B/C and
//! INT_CTRL_REG bitfields.
//!
//! The numeric value of each option enum is the field value written to the
//! device; the `cfg_reg_*` functions place each field at its bit position.

use core::ops::BitOr;

/// Temperature compensation of the magnetic readings (CFG_REG_A bit 7)
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TempCompensation {
    Disabled = 0,
    Enabled = 1,
}

/// Resolution / power trade-off (CFG_REG_A bit 4)
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PowerMode {
    HighResolution = 0,
    LowPower = 1,
}

/// Output data rate (CFG_REG_A bits 3:2)
#[repr(u8)]
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum DataRate {
    Rate_10Hz = 0b00,
    Rate_20Hz = 0b01,
    Rate_50Hz = 0b10,
    Rate_100Hz = 0b11,
}

impl DataRate {
    /// Output data rate in Hz
    pub fn hertz(&self) -> u8 {
        match self {
            Self::Rate_10Hz => 10,
            Self::Rate_20Hz => 20,
            Self::Rate_50Hz => 50,
            Self::Rate_100Hz => 100,
        }
    }
}

/// Operating mode (CFG_REG_A bits 1:0)
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum OperatingMode {
    /// Conversions run back to back at the output data rate
    Continuous = 0b00,
    /// A single conversion per trigger, then back to idle
    OneShot = 0b01,
    Idle = 0b10,
}

/// Hard-iron offset cancellation
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum OffsetCancellation {
    Disabled = 0,
    Enabled = 1,
}

/// Set pulse frequency used by offset cancellation (CFG_REG_B bit 2)
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum OffsetPulse {
    /// Set pulse released every 63 output samples
    Pulsed = 0,
    /// Set pulse released only at power-on
    Continuous = 1,
}

/// Whether the interrupt threshold is compared against offset-corrected data
/// (CFG_REG_B bit 3)
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IrqOffset {
    WithoutOffset = 0,
    WithOffset = 1,
}

/// Digital low pass filter, ODR/4 bandwidth when enabled (CFG_REG_B bit 0)
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum LowPassFilter {
    Disabled = 0,
    Enabled = 1,
}

/// Data-ready signal routing (CFG_REG_C bits 1:0)
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum DataReadyPin {
    Disabled = 0,
    OnPin = 1,
}

/// Interrupt signal routing (CFG_REG_C bit 6)
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum InterruptPin {
    Disabled = 0,
    OnPin = 1,
}

/// INT_CTRL_REG contents. Combine the flags with `|`.
///
/// Bits 3 and 4 are reserved and can not be set through this type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct IrqConfig(u8);

impl IrqConfig {
    pub const NONE: Self = Self(0);
    /// Threshold interrupt on the X axis
    pub const X_THRESHOLD: Self = Self(1 << 0);
    /// Threshold interrupt on the Y axis
    pub const Y_THRESHOLD: Self = Self(1 << 1);
    /// Threshold interrupt on the Z axis
    pub const Z_THRESHOLD: Self = Self(1 << 2);
    /// INT line is active high (default active low)
    pub const ACTIVE_HIGH: Self = Self(1 << 5);
    /// Interrupt is latched until INT_SOURCE_REG is read
    pub const LATCHED: Self = Self(1 << 6);
    pub const ENABLED: Self = Self(1 << 7);

    const RESERVED: u8 = (1 << 3) | (1 << 4);

    /// Raw register value
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Build from a raw register value, dropping the reserved bits
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & !Self::RESERVED)
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for IrqConfig {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Everything `initialize` writes to the device.
///
/// The value is only read during initialization; the driver keeps no copy of it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    /// Hard-iron offsets, in raw output LSB
    pub offset_x: i16,
    pub offset_y: i16,
    pub offset_z: i16,
    /// Threshold for the axis interrupts, in raw output LSB
    pub int_threshold: i16,
    pub temp_compensation: TempCompensation,
    pub power_mode: PowerMode,
    pub data_rate: DataRate,
    pub operating_mode: OperatingMode,
    pub offset_cancellation: OffsetCancellation,
    pub offset_pulse: OffsetPulse,
    pub irq_offset: IrqOffset,
    pub low_pass_filter: LowPassFilter,
    pub data_ready_pin: DataReadyPin,
    pub interrupt_pin: InterruptPin,
    pub irq_config: IrqConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            offset_z: 0,
            int_threshold: 0,
            temp_compensation: TempCompensation::Enabled,
            power_mode: PowerMode::HighResolution,
            data_rate: DataRate::Rate_10Hz,
            operating_mode: OperatingMode::Continuous,
            offset_cancellation: OffsetCancellation::Disabled,
            offset_pulse: OffsetPulse::Pulsed,
            irq_offset: IrqOffset::WithoutOffset,
            low_pass_filter: LowPassFilter::Disabled,
            data_ready_pin: DataReadyPin::Disabled,
            interrupt_pin: InterruptPin::Disabled,
            irq_config: IrqConfig::NONE,
        }
    }
}

/// CFG_REG_A: temp comp (7), power mode (4), data rate (3:2), operating mode (1:0)
pub fn cfg_reg_a(config: &Config) -> u8 {
    ((config.temp_compensation as u8) << 7)
        | ((config.power_mode as u8) << 4)
        | ((config.data_rate as u8) << 2)
        | (config.operating_mode as u8)
}

/// CFG_REG_B: irq with offset (3), offset pulse (2), low pass filter (0).
///
/// Offset cancellation sits in bit 4 (OFF_CANC_ONE_SHOT) in one-shot mode
/// and in bit 1 (OFF_CANC) otherwise.
pub fn cfg_reg_b(config: &Config) -> u8 {
    let mut val = ((config.irq_offset as u8) << 3)
        | ((config.offset_pulse as u8) << 2)
        | (config.low_pass_filter as u8);

    let off_canc = config.offset_cancellation as u8;
    if config.operating_mode == OperatingMode::OneShot {
        val |= off_canc << 4;
    } else {
        val |= off_canc << 1;
    }
    val
}

/// CFG_REG_C: interrupt pin (6), data-ready pin (1:0).
///
/// Bit 4 (BDU) is always set.
pub fn cfg_reg_c(config: &Config) -> u8 {
    const BDU: u8 = 1 << 4;
    ((config.interrupt_pin as u8) << 6) | BDU | (config.data_ready_pin as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: [DataRate; 4] = [
        DataRate::Rate_10Hz,
        DataRate::Rate_20Hz,
        DataRate::Rate_50Hz,
        DataRate::Rate_100Hz,
    ];
    const MODES: [OperatingMode; 3] = [
        OperatingMode::Continuous,
        OperatingMode::OneShot,
        OperatingMode::Idle,
    ];

    #[test]
    fn cfg_a_packs_every_field() {
        for temp in [TempCompensation::Disabled, TempCompensation::Enabled] {
            for power in [PowerMode::HighResolution, PowerMode::LowPower] {
                for rate in RATES {
                    for mode in MODES {
                        let config = Config {
                            temp_compensation: temp,
                            power_mode: power,
                            data_rate: rate,
                            operating_mode: mode,
                            ..Config::default()
                        };
                        let expected = ((temp as u8) << 7)
                            | ((power as u8) << 4)
                            | ((rate as u8) << 2)
                            | mode as u8;
                        assert_eq!(cfg_reg_a(&config), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn cfg_a_single_fields() {
        let base = Config {
            temp_compensation: TempCompensation::Disabled,
            ..Config::default()
        };
        assert_eq!(cfg_reg_a(&base), 0x00);
        assert_eq!(
            cfg_reg_a(&Config { temp_compensation: TempCompensation::Enabled, ..base }),
            0x80
        );
        assert_eq!(cfg_reg_a(&Config { power_mode: PowerMode::LowPower, ..base }), 0x10);
        assert_eq!(cfg_reg_a(&Config { data_rate: DataRate::Rate_100Hz, ..base }), 0x0C);
        assert_eq!(cfg_reg_a(&Config { data_rate: DataRate::Rate_50Hz, ..base }), 0x08);
        assert_eq!(
            cfg_reg_a(&Config { operating_mode: OperatingMode::OneShot, ..base }),
            0x01
        );
        assert_eq!(cfg_reg_a(&Config { operating_mode: OperatingMode::Idle, ..base }), 0x02);
    }

    #[test]
    fn cfg_b_offset_cancellation_moves_with_mode() {
        for mode in MODES {
            let config = Config {
                operating_mode: mode,
                offset_cancellation: OffsetCancellation::Enabled,
                ..Config::default()
            };
            let expected = if mode == OperatingMode::OneShot { 1 << 4 } else { 1 << 1 };
            assert_eq!(cfg_reg_b(&config), expected);
        }
    }

    #[test]
    fn cfg_b_other_fields_ignore_mode() {
        for mode in MODES {
            let config = Config {
                operating_mode: mode,
                irq_offset: IrqOffset::WithOffset,
                offset_pulse: OffsetPulse::Continuous,
                low_pass_filter: LowPassFilter::Enabled,
                ..Config::default()
            };
            assert_eq!(cfg_reg_b(&config), 0b0000_1101);
        }
        let base = Config::default();
        assert_eq!(cfg_reg_b(&Config { irq_offset: IrqOffset::WithOffset, ..base }), 0x08);
        assert_eq!(cfg_reg_b(&Config { offset_pulse: OffsetPulse::Continuous, ..base }), 0x04);
        assert_eq!(cfg_reg_b(&Config { low_pass_filter: LowPassFilter::Enabled, ..base }), 0x01);
    }

    #[test]
    fn cfg_c_always_sets_bdu() {
        let base = Config::default();
        assert_eq!(cfg_reg_c(&base), 0x10);
        assert_eq!(cfg_reg_c(&Config { interrupt_pin: InterruptPin::OnPin, ..base }), 0x50);
        assert_eq!(cfg_reg_c(&Config { data_ready_pin: DataReadyPin::OnPin, ..base }), 0x11);
        let both = Config {
            interrupt_pin: InterruptPin::OnPin,
            data_ready_pin: DataReadyPin::OnPin,
            ..base
        };
        assert_eq!(cfg_reg_c(&both) & 0x10, 0x10);
        assert_eq!(cfg_reg_c(&both), 0x51);
    }

    #[test]
    fn irq_config_flags() {
        let cfg = IrqConfig::X_THRESHOLD
            | IrqConfig::Y_THRESHOLD
            | IrqConfig::Z_THRESHOLD
            | IrqConfig::ACTIVE_HIGH
            | IrqConfig::LATCHED
            | IrqConfig::ENABLED;
        assert_eq!(cfg.bits(), 0b1110_0111);
        assert!(cfg.contains(IrqConfig::LATCHED | IrqConfig::ENABLED));
        assert!(!IrqConfig::X_THRESHOLD.contains(IrqConfig::ENABLED));
        assert_eq!(IrqConfig::from_bits_truncate(0xFF).bits(), 0b1110_0111);
    }

    #[test]
    fn data_rate_hertz() {
        assert_eq!(DataRate::Rate_10Hz.hertz(), 10);
        assert_eq!(DataRate::Rate_100Hz.hertz(), 100);
    }
}
