use iis2mdc::{Builder, Config, DataReady, OperatingMode, DEFAULT_ADDRESS};
use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::{Delay, I2cdev, SysfsPin};

fn main() {
    let i2c = I2cdev::new("/dev/i2c-1").expect("I2C device");

    let drdy = SysfsPin::new(27); // sensor INT/DRDY line
    drdy.export().expect("drdy export");
    while !drdy.is_exported() {}
    drdy.set_direction(Direction::In).expect("drdy direction");

    let config = Config {
        operating_mode: OperatingMode::OneShot,
        ..Config::default()
    };

    // no interrupt controller to gate here, the pin is only polled
    let (mut mag, report) = Builder::new(config).new_i2c(i2c, DEFAULT_ADDRESS, drdy, (), Delay {});
    println!("device id: {:?}", report.device_id());
    for step in report.failures() {
        println!("init step failed: {:?}", step);
    }

    for _ in 0..10 {
        mag.start_conversion().expect("start conversion");
        while mag.read_magnetic() == DataReady::NotReady {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let field = mag.magnetic();
        println!("Magnetic field (mG): {:?}  (uT): {:?}", field, field.to_microtesla());
    }

    let _ = mag.deinitialize();
}
