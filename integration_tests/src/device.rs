//! Device log reader.

use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::SerialPort;

use crate::log_lines::{parse_line, Event, LogLine};

/// Find the first USB serial/JTAG console (ttyACM).
pub fn find_console_port() -> Result<String> {
    let ports = serialport::available_ports()?;
    for port_info in ports {
        if port_info.port_name.contains("ttyACM") || port_info.port_name.contains("usbmodem") {
            return Ok(port_info.port_name);
        }
    }
    anyhow::bail!("No console port found - ensure device is connected")
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_console_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// A log line with the time it arrived on the host.
#[derive(Debug, Clone)]
pub struct Timestamped {
    pub at: Instant,
    pub line: LogLine,
}

/// Client reading the transmitter's log stream.
pub struct DeviceClient {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl DeviceClient {
    /// Open the console port.
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }

    /// Clear any pending data in the serial buffer.
    pub fn clear_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;
        self.pending.clear();
        Ok(())
    }

    /// Hard-reset the chip through the USB-JTAG RTS line.
    pub fn reset(&mut self) -> Result<()> {
        self.port.write_data_terminal_ready(false)?;
        self.port.write_request_to_send(true)?;
        std::thread::sleep(Duration::from_millis(100));
        self.port.write_request_to_send(false)?;
        self.pending.clear();
        Ok(())
    }

    /// Read the next complete line, or None if nothing arrives before the timeout.
    pub fn read_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        let start = Instant::now();
        let mut buf = [0u8; 256];

        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            if start.elapsed() >= timeout {
                return Ok(None);
            }

            match self.port.read(&mut buf) {
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Collect every parsed log line for the given duration.
    pub fn collect(&mut self, duration: Duration) -> Result<Vec<Timestamped>> {
        let end = Instant::now() + duration;
        let mut lines = Vec::new();

        while let Some(remaining) = end.checked_duration_since(Instant::now()) {
            if let Some(raw) = self.read_line(remaining)? {
                if let Some(line) = parse_line(&raw) {
                    lines.push(Timestamped {
                        at: Instant::now(),
                        line,
                    });
                }
            }
        }

        Ok(lines)
    }

    /// Wait for the first line whose event matches the predicate.
    pub fn wait_for<F>(&mut self, timeout: Duration, mut predicate: F) -> Result<Option<Timestamped>>
    where
        F: FnMut(&Event) -> bool,
    {
        let end = Instant::now() + timeout;

        while let Some(remaining) = end.checked_duration_since(Instant::now()) {
            if let Some(raw) = self.read_line(remaining)? {
                if let Some(line) = parse_line(&raw) {
                    if predicate(&line.event) {
                        return Ok(Some(Timestamped {
                            at: Instant::now(),
                            line,
                        }));
                    }
                }
            }
        }

        Ok(None)
    }
}
