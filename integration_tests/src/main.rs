//! Integration tests for the CSI send firmware.
//!
//! Run after flashing the firmware. Watches the device's log output over the
//! USB serial console and checks the broadcast cadence.

mod device;
mod log_lines;

use clap::Parser;
use colored::Colorize;

use device::{resolve_port, DeviceClient};
use tests::{print_results, run_all_tests, Expected};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for CSI send firmware")]
struct Args {
    /// Serial port for the device (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Channel the firmware was built for
    #[arg(long, default_value = "11")]
    channel: u8,

    /// Send frequency the firmware was built for
    #[arg(long, default_value = "100")]
    frequency: u32,

    /// Fixed sender MAC the firmware was built for
    #[arg(long, default_value = "1a:00:00:00:00:00")]
    mac: String,

    /// Skip the reset + banner check
    #[arg(long)]
    no_reset: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Resolve port (auto-detect if "auto")
    let port = resolve_port(&args.port)?;

    println!("{}", "CSI Send Integration Tests".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!();

    println!("Connecting to device...");
    let mut device = DeviceClient::new(&port, args.baud)?;
    device.clear_buffer()?;
    println!("{}", "Connected!".green());

    let expected = Expected {
        channel: args.channel,
        frequency_hz: args.frequency,
        mac: args.mac,
    };

    println!("\nRunning tests...\n");

    let results = run_all_tests(&mut device, &expected, !args.no_reset);
    print_results(&results);

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
