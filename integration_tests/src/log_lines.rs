//! Parser for the firmware's log lines.
//!
//! esp-println's logger writes `LEVEL - message`, optionally wrapped in ANSI
//! colour codes.

/// Log level as printed by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ERROR" => Some(Self::Error),
            "WARN" => Some(Self::Warn),
            "INFO" => Some(Self::Info),
            "DEBUG" => Some(Self::Debug),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }
}

/// Recognised firmware events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `================ CSI SEND ================`
    Banner,
    /// `WiFi Channel: 11, Send Frequency: 100 Hz`
    Settings { channel: u8, frequency_hz: u32 },
    /// `Sender MAC: 1a:00:00:00:00:00`
    SenderMac(String),
    /// `Sent 1000 packets, free heap: 12345`
    Summary { sent: u32, free_heap: u64 },
    /// `ESP-NOW send error: ESP_ERR_ESPNOW_NO_MEM, free heap: 12345`
    SendError { reason: String, free_heap: u64 },
    /// Any other line
    Other(String),
}

/// A parsed log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: Level,
    pub event: Event,
}

/// Remove ANSI escape sequences (`ESC [ ... letter`).
fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Parse one line of firmware output. Returns None for non-log output
/// (bootloader chatter, partial lines).
pub fn parse_line(raw: &str) -> Option<LogLine> {
    let line = strip_ansi(raw);
    let (level, message) = line.trim().split_once(" - ")?;
    let level = Level::parse(level.trim())?;
    let message = message.trim();

    Some(LogLine {
        level,
        event: parse_event(message),
    })
}

fn parse_event(message: &str) -> Event {
    if message.starts_with("=====") && message.contains("CSI SEND") {
        return Event::Banner;
    }

    if let Some(rest) = message.strip_prefix("WiFi Channel: ") {
        if let Some((channel, freq)) = rest.split_once(", Send Frequency: ") {
            let freq = freq.trim_end_matches(" Hz");
            if let (Ok(channel), Ok(frequency_hz)) = (channel.parse(), freq.parse()) {
                return Event::Settings {
                    channel,
                    frequency_hz,
                };
            }
        }
    }

    if let Some(mac) = message.strip_prefix("Sender MAC: ") {
        return Event::SenderMac(mac.to_lowercase());
    }

    if let Some(rest) = message.strip_prefix("Sent ") {
        if let Some((sent, heap)) = rest.split_once(" packets, free heap: ") {
            if let (Ok(sent), Ok(free_heap)) = (sent.parse(), heap.parse()) {
                return Event::Summary { sent, free_heap };
            }
        }
    }

    if let Some(rest) = message.strip_prefix("ESP-NOW send error: ") {
        if let Some((reason, heap)) = rest.rsplit_once(", free heap: ") {
            if let Ok(free_heap) = heap.parse() {
                return Event::SendError {
                    reason: reason.to_string(),
                    free_heap,
                };
            }
        }
    }

    Event::Other(message.to_string())
}
