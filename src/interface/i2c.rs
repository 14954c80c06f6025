/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use embedded_hal as hal;
use hal::delay::DelayNs;
use hal::digital::InputPin;

use super::{interrupt_ioctl, Command, InterruptMask, SensorInterface, BOOT_DELAY_MS};
use crate::Error;
#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

/// 7-bit I2C address of the sensor (0x3C / 0x3D as 8-bit write / read)
pub const DEFAULT_ADDRESS: u8 = 0x1E;

/// Largest payload of a single register write
const MAX_WRITE_LEN: usize = 16;

/// This combines the I2C peripheral with the sensor's
/// interrupt line and the delay source used during bring-up
pub struct I2cInterface<I2C, PIN, M, D> {
    /// i2c port, possibly shared with other devices
    i2c: I2C,
    /// address for i2c communications
    address: u8,
    /// the sensor's INT/DRDY pin (GPIO input)
    irq_pin: PIN,
    irq_mask: M,
    delay: D,
}

impl<I2C, PIN, M, D, CommE, PinE> I2cInterface<I2C, PIN, M, D>
where
    I2C: hal::i2c::I2c<Error = CommE>,
    PIN: InputPin<Error = PinE>,
    M: InterruptMask,
    D: DelayNs,
{
    pub fn new(i2c: I2C, address: u8, irq_pin: PIN, irq_mask: M, delay: D) -> Self {
        Self {
            i2c,
            address,
            irq_pin,
            irq_mask,
            delay,
        }
    }

    /// Release owned resources
    pub fn release(self) -> (I2C, PIN, M, D) {
        (self.i2c, self.irq_pin, self.irq_mask, self.delay)
    }
}

impl<I2C, PIN, M, D, CommE, PinE> SensorInterface for I2cInterface<I2C, PIN, M, D>
where
    I2C: hal::i2c::I2c<Error = CommE>,
    PIN: InputPin<Error = PinE>,
    M: InterruptMask,
    D: DelayNs,
    CommE: core::fmt::Debug,
    PinE: core::fmt::Debug,
{
    type InterfaceError = Error<CommE, PinE>;

    fn init(&mut self) -> Result<(), Self::InterfaceError> {
        self.delay.delay_ms(BOOT_DELAY_MS);
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Self::InterfaceError> {
        // leave the bus itself alone, other devices may be using it
        self.irq_mask.mask();
        Ok(())
    }

    fn register_read(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::InterfaceError> {
        let rc = self.i2c.write_read(self.address, &[reg], buffer);
        if rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("i2c read from reg 0x{:x} failed", reg);
        }
        rc.map_err(Error::Comm)
    }

    fn register_write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::InterfaceError> {
        if data.len() > MAX_WRITE_LEN {
            return Err(Error::Length);
        }
        let mut block = [0u8; MAX_WRITE_LEN + 1];
        block[0] = reg;
        block[1..=data.len()].copy_from_slice(data);

        let rc = self.i2c.write(self.address, &block[..=data.len()]);
        if rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("i2c write to reg 0x{:x} failed", reg);
        }
        rc.map_err(Error::Comm)
    }

    fn ioctl(&mut self, command: Command) -> Result<u8, Self::InterfaceError> {
        interrupt_ioctl(&mut self.irq_pin, &mut self.irq_mask, command).map_err(Error::Pin)
    }
}
