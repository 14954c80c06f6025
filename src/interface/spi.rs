/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use embedded_hal as hal;
use hal::delay::DelayNs;
use hal::digital::InputPin;
use hal::spi::Operation;

use super::{interrupt_ioctl, Command, InterruptMask, SensorInterface, BOOT_DELAY_MS};
use crate::Error;
#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

/// This combines the SPI device (chip select is handled by the
/// `SpiDevice` implementation) with the sensor's interrupt line
/// and the delay source used during bring-up.
///
/// 3-wire SPI only: SDI/SDO must be a single shared data line. The sensor
/// powers up in 3-wire mode and `initialize` never sets CFG_REG_C bit 2
/// (4WSPI), so on 4-wire wiring MISO is never driven and every read returns
/// bus noise. `SPI` must be a half-duplex (bidirectional data line) device.
pub struct SpiInterface<SPI, PIN, M, D> {
    /// the SPI device to use when communicating
    spi: SPI,
    /// the sensor's INT/DRDY pin (GPIO input)
    irq_pin: PIN,
    irq_mask: M,
    delay: D,
}

impl<SPI, PIN, M, D, CommE, PinE> SpiInterface<SPI, PIN, M, D>
where
    SPI: hal::spi::SpiDevice<u8, Error = CommE>,
    PIN: InputPin<Error = PinE>,
    M: InterruptMask,
    D: DelayNs,
{
    /// Combined with register address for reading
    const DIR_READ: u8 = 0x80; // same as 1<<7

    pub fn new(spi: SPI, irq_pin: PIN, irq_mask: M, delay: D) -> Self {
        Self {
            spi,
            irq_pin,
            irq_mask,
            delay,
        }
    }

    /// Release owned resources
    pub fn release(self) -> (SPI, PIN, M, D) {
        (self.spi, self.irq_pin, self.irq_mask, self.delay)
    }
}

impl<SPI, PIN, M, D, CommE, PinE> SensorInterface for SpiInterface<SPI, PIN, M, D>
where
    SPI: hal::spi::SpiDevice<u8, Error = CommE>,
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
        self.irq_mask.mask();
        Ok(())
    }

    fn register_read(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::InterfaceError> {
        let rc = self
            .spi
            .transaction(&mut [Operation::Write(&[reg | Self::DIR_READ]), Operation::Read(buffer)]);

        if rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("spi read from reg 0x{:x} failed", reg);
        }
        rc.map_err(Error::Comm)
    }

    fn register_write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::InterfaceError> {
        let rc = self
            .spi
            .transaction(&mut [Operation::Write(&[reg]), Operation::Write(data)]);

        if rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("spi write to reg 0x{:x} failed", reg);
        }
        rc.map_err(Error::Comm)
    }

    fn ioctl(&mut self, command: Command) -> Result<u8, Self::InterfaceError> {
        interrupt_ioctl(&mut self.irq_pin, &mut self.irq_mask, command).map_err(Error::Pin)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use embedded_hal::spi::{ErrorKind, ErrorType, SpiDevice};
    use std::vec;

    fn no_pin() -> [PinTransaction; 0] {
        []
    }

    /// SPI device whose every transaction fails
    struct DeadSpi;

    impl ErrorType for DeadSpi {
        type Error = ErrorKind;
    }

    impl SpiDevice<u8> for DeadSpi {
        fn transaction(&mut self, _operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn multi_byte_read_is_half_duplex() {
        // address phase and data phase are separate, never a full-duplex transfer
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x68 | 0x80]),
            SpiTransaction::read_vec(vec![0x00, 0x01, 0x00, 0x00, 0x00, 0xFF]),
            SpiTransaction::transaction_end(),
        ];
        let mut iface = SpiInterface::new(
            SpiMock::new(&expectations),
            PinMock::new(&no_pin()),
            (),
            NoopDelay::new(),
        );

        let mut block = [0u8; 6];
        iface.register_read(0x68, &mut block).unwrap();
        assert_eq!(block, [0x00, 0x01, 0x00, 0x00, 0x00, 0xFF]);

        let (mut spi, mut pin, _, _) = iface.release();
        spi.done();
        pin.done();
    }

    #[test]
    fn failed_transactions_report_comm_error() {
        let mut iface = SpiInterface::new(DeadSpi, PinMock::new(&no_pin()), (), NoopDelay::new());

        let res = iface.register_write(0x60, &[0x20]);
        assert!(matches!(res, Err(Error::Comm(ErrorKind::Other))));
        let mut status = [0u8; 1];
        let res = iface.register_read(0x67, &mut status);
        assert!(matches!(res, Err(Error::Comm(ErrorKind::Other))));

        let (_, mut pin, _, _) = iface.release();
        pin.done();
    }

    #[test]
    fn read_sets_direction_bit() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x4F | 0x80]),
            SpiTransaction::read_vec(vec![0x40]),
            SpiTransaction::transaction_end(),
        ];
        let mut iface = SpiInterface::new(
            SpiMock::new(&expectations),
            PinMock::new(&no_pin()),
            (),
            NoopDelay::new(),
        );

        let mut id = [0u8; 1];
        iface.register_read(0x4F, &mut id).unwrap();
        assert_eq!(id[0], 0x40);

        let (mut spi, mut pin, _, _) = iface.release();
        spi.done();
        pin.done();
    }

    #[test]
    fn write_sends_address_then_payload() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x65]),
            SpiTransaction::write_vec(vec![0xE8, 0x03]),
            SpiTransaction::transaction_end(),
        ];
        let mut iface = SpiInterface::new(
            SpiMock::new(&expectations),
            PinMock::new(&no_pin()),
            (),
            NoopDelay::new(),
        );

        iface.register_write(0x65, &1000i16.to_le_bytes()).unwrap();

        let (mut spi, mut pin, _, _) = iface.release();
        spi.done();
        pin.done();
    }

    #[test]
    fn read_interrupt_pin() {
        let no_spi: [SpiTransaction<u8>; 0] = [];
        let pin_expectations = [PinTransaction::get(PinState::High)];
        let mut iface = SpiInterface::new(
            SpiMock::new(&no_spi),
            PinMock::new(&pin_expectations),
            (),
            NoopDelay::new(),
        );

        assert_eq!(iface.ioctl(Command::ReadInterruptPin).unwrap(), 1);
        iface.init().unwrap();

        let (mut spi, mut pin, _, _) = iface.release();
        spi.done();
        pin.done();
    }
}
