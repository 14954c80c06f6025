/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

pub mod i2c;
pub mod spi;

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;
use embedded_hal::digital::InputPin;

pub use self::i2c::I2cInterface;
pub use self::spi::SpiInterface;

/// Requests for the device's interrupt line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Command {
    /// Let the interrupt line reach the MCU
    EnableInterrupt,
    /// Keep the interrupt line from reaching the MCU
    DisableInterrupt,
    /// Sample the interrupt pin: 1 if high, 0 if low
    ReadInterruptPin,
}

/// A method of communicating with the sensor
pub trait SensorInterface {
    /// Interface error type
    type InterfaceError: core::fmt::Debug;

    /// Bring up the device-specific parts of the transport.
    /// May block, and may be called more than once.
    fn init(&mut self) -> Result<(), Self::InterfaceError>;

    /// Release device-specific resources only; a shared bus stays up.
    fn deinit(&mut self) -> Result<(), Self::InterfaceError>;

    /// Read `buffer.len()` consecutive registers starting at `reg`
    fn register_read(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::InterfaceError>;

    /// Write `data` to consecutive registers starting at `reg`
    fn register_write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::InterfaceError>;

    /// Interrupt line control, see [`Command`] for the returned value
    fn ioctl(&mut self, command: Command) -> Result<u8, Self::InterfaceError>;
}

impl<T> SensorInterface for &mut T
where
    T: SensorInterface + ?Sized,
{
    type InterfaceError = T::InterfaceError;

    fn init(&mut self) -> Result<(), Self::InterfaceError> {
        T::init(self)
    }

    fn deinit(&mut self) -> Result<(), Self::InterfaceError> {
        T::deinit(self)
    }

    fn register_read(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::InterfaceError> {
        T::register_read(self, reg, buffer)
    }

    fn register_write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::InterfaceError> {
        T::register_write(self, reg, data)
    }

    fn ioctl(&mut self, command: Command) -> Result<u8, Self::InterfaceError> {
        T::ioctl(self, command)
    }
}

/// Gate between the sensor's interrupt pin and the MCU interrupt controller
pub trait InterruptMask {
    fn mask(&mut self);
    fn unmask(&mut self);
}

/// For setups that poll the sensor and never route its interrupt
impl InterruptMask for () {
    fn mask(&mut self) {}
    fn unmask(&mut self) {}
}

/// The sensor's interrupt line as seen by the Cortex-M NVIC
#[derive(Copy, Clone, Debug)]
pub struct Nvic<I>(pub I);

impl<I> InterruptMask for Nvic<I>
where
    I: InterruptNumber,
{
    fn mask(&mut self) {
        NVIC::mask(self.0);
    }

    fn unmask(&mut self) {
        // the handler for this line is installed by the application before
        // the driver is initialized
        unsafe { NVIC::unmask(self.0) }
    }
}

/// Sensor boot time after power up, in milliseconds
pub(crate) const BOOT_DELAY_MS: u32 = 20;

/// Interrupt line handling shared by the bus interfaces
pub(crate) fn interrupt_ioctl<PIN, M>(
    pin: &mut PIN,
    mask: &mut M,
    command: Command,
) -> Result<u8, PIN::Error>
where
    PIN: InputPin,
    M: InterruptMask,
{
    match command {
        Command::EnableInterrupt => {
            mask.unmask();
            Ok(0)
        }
        Command::DisableInterrupt => {
            mask.mask();
            Ok(0)
        }
        Command::ReadInterruptPin => Ok(pin.is_high()? as u8),
    }
}
