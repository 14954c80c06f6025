/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

#![no_std]

use embedded_hal as hal;
use hal::delay::DelayNs;
use hal::digital::InputPin;

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

mod config;
mod interface;
mod magnetic;
mod report;

pub use config::{
    cfg_reg_a, cfg_reg_b, cfg_reg_c, Config, DataRate, DataReadyPin, InterruptPin, IrqConfig,
    IrqOffset, LowPassFilter, OffsetCancellation, OffsetPulse, OperatingMode, PowerMode,
    TempCompensation,
};
pub use interface::i2c::DEFAULT_ADDRESS;
pub use interface::{
    Command, I2cInterface, InterruptMask, Nvic, SensorInterface, SpiInterface,
};
pub use magnetic::{MagneticField, MILLIGAUSS_PER_LSB};
pub use report::{InitReport, Step};

/// Errors in this crate
#[derive(Debug)]
pub enum Error<CommE, PinE> {
    /// Sensor communication error
    Comm(CommE),
    /// Pin reading error
    Pin(PinE),

    /// Register write longer than the interface supports
    Length,
}

/// Whether a fresh sample is waiting in the output registers
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum DataReady {
    Ready,
    NotReady,
}

/// Interrupt sources latched in INT_SOURCE_REG
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct InterruptSource(pub u8);

impl InterruptSource {
    pub fn x_positive(&self) -> bool {
        self.0 & (1 << 7) != 0
    }
    pub fn y_positive(&self) -> bool {
        self.0 & (1 << 6) != 0
    }
    pub fn z_positive(&self) -> bool {
        self.0 & (1 << 5) != 0
    }
    pub fn x_negative(&self) -> bool {
        self.0 & (1 << 4) != 0
    }
    pub fn y_negative(&self) -> bool {
        self.0 & (1 << 3) != 0
    }
    pub fn z_negative(&self) -> bool {
        self.0 & (1 << 2) != 0
    }
    /// Internal measurement range overflow
    pub fn range_overflow(&self) -> bool {
        self.0 & (1 << 1) != 0
    }
    /// An interrupt event is pending
    pub fn interrupt(&self) -> bool {
        self.0 & (1 << 0) != 0
    }
}

pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create and initialize a new driver using I2C interface
    pub fn new_i2c<I2C, PIN, M, D, CommE, PinE>(
        &self,
        i2c: I2C,
        address: u8,
        irq_pin: PIN,
        irq_mask: M,
        delay: D,
    ) -> (Iis2mdc<I2cInterface<I2C, PIN, M, D>>, InitReport)
    where
        I2C: hal::i2c::I2c<Error = CommE>,
        PIN: InputPin<Error = PinE>,
        M: InterruptMask,
        D: DelayNs,
        CommE: core::fmt::Debug,
        PinE: core::fmt::Debug,
    {
        let iface = I2cInterface::new(i2c, address, irq_pin, irq_mask, delay);
        Iis2mdc::initialize(&self.config, iface)
    }

    /// Create and initialize a new driver using SPI interface.
    /// The sensor must be wired for 3-wire SPI, see [`SpiInterface`].
    pub fn new_spi<SPI, PIN, M, D, CommE, PinE>(
        &self,
        spi: SPI,
        irq_pin: PIN,
        irq_mask: M,
        delay: D,
    ) -> (Iis2mdc<SpiInterface<SPI, PIN, M, D>>, InitReport)
    where
        SPI: hal::spi::SpiDevice<u8, Error = CommE>,
        PIN: InputPin<Error = PinE>,
        M: InterruptMask,
        D: DelayNs,
        CommE: core::fmt::Debug,
        PinE: core::fmt::Debug,
    {
        let iface = SpiInterface::new(spi, irq_pin, irq_mask, delay);
        Iis2mdc::initialize(&self.config, iface)
    }
}

/// Driver handle for one IIS2MDC.
///
/// Not reentrant: callers sharing a handle between contexts must serialize access.
pub struct Iis2mdc<SI> {
    pub(crate) si: SI,

    pub(crate) data_ready: DataReady,
    /// Last decoded sample, milligauss
    pub(crate) field: MagneticField,
}

impl<SI> Iis2mdc<SI>
where
    SI: SensorInterface,
{
    /// Bind to `sensor_interface` and configure the sensor.
    ///
    /// Every step is attempted even if earlier ones fail; failures are
    /// recorded in the returned report. The device interrupt is masked for
    /// the whole sequence and unmasked as the last bus action.
    pub fn initialize(config: &Config, sensor_interface: SI) -> (Self, InitReport) {
        let mut dev = Self {
            si: sensor_interface,
            data_ready: DataReady::NotReady,
            field: MagneticField::default(),
        };
        let mut report = InitReport::default();

        let rc = dev.si.init();
        check(&mut report, Step::BusInit, rc);
        let rc = dev.si.ioctl(Command::DisableInterrupt);
        check(&mut report, Step::DisableInterrupt, rc);

        let mut chip_id = [0u8; 1];
        let rc = dev.si.register_read(REG_WHO_AM_I, &mut chip_id);
        if check(&mut report, Step::ReadIdentity, rc) {
            report.record_device_id(chip_id[0]);
            if chip_id[0] != DEVICE_ID {
                #[cfg(feature = "rttdebug")]
                rprintln!("bogus whoami: 0x{:0x}  ", chip_id[0]);
            }
        }

        let words = [
            (Step::WriteOffsetX, REG_OFFSET_X_L, config.offset_x),
            (Step::WriteOffsetY, REG_OFFSET_Y_L, config.offset_y),
            (Step::WriteOffsetZ, REG_OFFSET_Z_L, config.offset_z),
            (Step::WriteThreshold, REG_INT_THS_L, config.int_threshold),
        ];
        for (step, reg, val) in words {
            let rc = dev.si.register_write(reg, &val.to_le_bytes());
            check(&mut report, step, rc);
        }

        let bytes = [
            (Step::WriteCfgA, REG_CFG_A, cfg_reg_a(config)),
            (Step::WriteCfgB, REG_CFG_B, cfg_reg_b(config)),
            (Step::WriteCfgC, REG_CFG_C, cfg_reg_c(config)),
            (Step::WriteIntCtrl, REG_INT_CTRL, config.irq_config.bits()),
        ];
        for (step, reg, val) in bytes {
            let rc = dev.si.register_write(reg, &[val]);
            check(&mut report, step, rc);
        }

        // drop any sample latched while configuring
        let mut stale = [0u8; 6];
        let rc = dev.si.register_read(REG_OUTX_L, &mut stale);
        check(&mut report, Step::FlushOutput, rc);

        let rc = dev.si.ioctl(Command::EnableInterrupt);
        check(&mut report, Step::EnableInterrupt, rc);

        (dev, report)
    }

    /// Reset the sensor and release the interface's device-specific
    /// resources. The interface is handed back; a shared bus is left running.
    pub fn deinitialize(mut self) -> SI {
        let _ = self.reset();
        if let Err(_e) = self.si.deinit() {
            #[cfg(feature = "rttdebug")]
            rprintln!("deinit failed: {:?}", _e);
        }
        self.si
    }

    /// Perform a soft reset on the sensor. Does not wait for the reset to complete.
    pub fn reset(&mut self) -> Result<(), SI::InterfaceError> {
        /// reboot the device registers to their default values
        const SOFT_RST: u8 = 1 << 5;

        let rc = self.si.register_write(REG_CFG_A, &[SOFT_RST]);
        if rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("reset failed");
        }
        rc
    }

    /// Trigger a single conversion. Only meaningful in one-shot mode.
    ///
    /// If CFG_REG_A can not be read, it is taken as 0x00 and the trigger is
    /// still written; the read error is returned.
    pub fn start_conversion(&mut self) -> Result<(), SI::InterfaceError> {
        const MD_CONTINUOUS: u8 = 1 << 1;
        const MD_SINGLE: u8 = 1 << 0;

        let mut cfg_a = [0u8; 1];
        let read_rc = self.si.register_read(REG_CFG_A, &mut cfg_a);
        if read_rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("read cfg A failed");
            cfg_a[0] = 0;
        }

        let val = (cfg_a[0] & !MD_CONTINUOUS) | MD_SINGLE;
        let write_rc = self.si.register_write(REG_CFG_A, &[val]);
        if write_rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("write cfg A failed");
        }
        read_rc.and(write_rc)
    }

    /// Poll the status register and, once all three axes have new data,
    /// read and convert the sample.
    ///
    /// A failed read of the output registers is logged only: the sample is
    /// decoded from whatever the buffer holds and `Ready` is still returned.
    pub fn read_magnetic(&mut self) -> DataReady {
        const ZYXDA: u8 = 0b0000_0111;

        let mut status = [0u8; 1];
        if self.si.register_read(REG_STATUS, &mut status).is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("read status failed");
            return DataReady::NotReady;
        }
        if status[0] & ZYXDA != ZYXDA {
            self.data_ready = DataReady::NotReady;
            return DataReady::NotReady;
        }

        let mut block = [0u8; 6];
        if self.si.register_read(REG_OUTX_L, &mut block).is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("read output regs failed");
        }
        // the sample has been consumed
        self.data_ready = DataReady::NotReady;
        self.field = MagneticField::from_raw_bytes(&block);

        DataReady::Ready
    }

    /// Data-ready state as of the last `read_magnetic`
    pub fn data_ready(&self) -> DataReady {
        self.data_ready
    }

    /// Last sample read, in milligauss
    pub fn magnetic(&self) -> MagneticField {
        self.field
    }

    pub fn mag_x(&self) -> i16 {
        self.field.x
    }

    pub fn mag_y(&self) -> i16 {
        self.field.y
    }

    pub fn mag_z(&self) -> i16 {
        self.field.z
    }

    /// Current level of the interrupt pin
    pub fn interrupt_pin(&mut self) -> Result<bool, SI::InterfaceError> {
        Ok(self.si.ioctl(Command::ReadInterruptPin)? != 0)
    }

    /// Read INT_SOURCE_REG. Reading clears a latched interrupt.
    pub fn read_interrupt_source(&mut self) -> Result<InterruptSource, SI::InterfaceError> {
        let mut val = [0u8; 1];
        self.read_register(REG_INT_SOURCE, &mut val)?;
        Ok(InterruptSource(val[0]))
    }

    /// Raw read of `buffer.len()` registers starting at `reg`
    pub fn read_register(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), SI::InterfaceError> {
        let rc = self.si.register_read(reg, buffer);
        if rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("read reg failed. address: 0x{:x}", reg);
        }
        rc
    }

    /// Raw write of `data` to registers starting at `reg`
    pub fn write_register(&mut self, reg: u8, data: &[u8]) -> Result<(), SI::InterfaceError> {
        let rc = self.si.register_write(reg, data);
        if rc.is_err() {
            #[cfg(feature = "rttdebug")]
            rprintln!("write reg failed. address: 0x{:x}", reg);
        }
        rc
    }
}

/// Record a failed init step, returns true on success
fn check<T, E>(report: &mut InitReport, step: Step, rc: Result<T, E>) -> bool
where
    E: core::fmt::Debug,
{
    match rc {
        Ok(_) => true,
        Err(_e) => {
            #[cfg(feature = "rttdebug")]
            rprintln!("init step {:?} (reg {:?}) failed: {:?}", step, step.register(), _e);
            report.record_failure(step);
            false
        }
    }
}

/// Register map
///
pub(crate) const REG_OFFSET_X_L: u8 = 0x45;
pub(crate) const REG_OFFSET_Y_L: u8 = 0x47;
pub(crate) const REG_OFFSET_Z_L: u8 = 0x49;

pub(crate) const REG_WHO_AM_I: u8 = 0x4F;

pub(crate) const REG_CFG_A: u8 = 0x60;
pub(crate) const REG_CFG_B: u8 = 0x61;
pub(crate) const REG_CFG_C: u8 = 0x62;

pub(crate) const REG_INT_CTRL: u8 = 0x63;
const REG_INT_SOURCE: u8 = 0x64;
pub(crate) const REG_INT_THS_L: u8 = 0x65;

const REG_STATUS: u8 = 0x67;
pub(crate) const REG_OUTX_L: u8 = 0x68;
// const REG_TEMP_OUT_L: u8 = 0x6E;

/// Expected WHO_AM_I value
pub const DEVICE_ID: u8 = 0x40;
