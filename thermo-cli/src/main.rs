use clap::Parser;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::{CdevPin, Delay};

/// Read a DS18B20 thermometer on a bit-banged 1-Wire GPIO line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the GPIO character device (e.g., /dev/gpiochip0)
    #[arg(short, long)]
    chip: String,
    /// Line offset of the 1-Wire data pin
    #[arg(short, long)]
    line: u32,
    /// Seconds between measurements
    #[arg(short, long, default_value_t = 2)]
    interval: u64,
    /// Log a warning above this temperature (degrees C)
    #[arg(short, long, default_value_t = 30)]
    warn_above: i16,
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Request the data pin as an open-drain output; the line needs an
    // external pull-up
    let mut chip = Chip::new(&args.chip).expect("Failed to open GPIO chip");
    let handle = chip
        .get_line(args.line)
        .expect("Failed to get GPIO line")
        .request(
            LineRequestFlags::OUTPUT | LineRequestFlags::OPEN_DRAIN,
            1,
            "thermo-cli",
        )
        .expect("Failed to request GPIO line");
    let pin = CdevPin::new(handle).expect("Failed to wrap GPIO line");
    // Create a bit-banged 1-Wire master on the pin
    let mut bus =
        onewire_bus::SoftOneWire::new(pin, Delay).expect("Failed to initialize the 1-Wire line");

    let sensor = ds18b20::Ds18b20::new().with_resolution(ds18b20::Resolution::Bits12);
    // Identify the sensor; also proves the wiring before the loop starts
    let rom = sensor.read_rom(&mut bus).expect("Failed to read ROM code");
    log::info!("ROM: {:02x?}", rom);

    let threshold = fixed::types::I12F4::from_num(args.warn_above);
    let mut delay = Delay;
    loop {
        // Trigger a conversion and wait for the result
        let temperature = sensor
            .read_temperature(&mut bus, &mut delay)
            .expect("Failed to read temperature");
        if temperature > threshold {
            log::warn!("Temperature: {} C", temperature);
        } else {
            log::info!("Temperature: {} C", temperature);
        }
        std::thread::sleep(std::time::Duration::from_secs(args.interval));
    }
}
