use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::{path::PathBuf, time::Duration};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Send a read request to the BMS and decode its reply
    Query {
        /// Register to read, decimal or hex (e.g. 5 or 0x05 for hardware info)
        #[arg(short, long, value_parser = maybe_hex::<u8>, default_value = "0x05")]
        register: u8,
    },
    /// Decode a frame given as hex bytes without opening a device (e.g. "DD A5 05 00 FF FB 77")
    Decode {
        /// Frame bytes in hex; separators ' ', ',' and ':' and a "0x" prefix are accepted
        #[arg(required = true, num_args = 1..)]
        hex: Vec<String>,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

const fn about_text() -> &'static str {
    "ANT BMS command line tool"
}

#[derive(Parser, Debug)]
#[command(version, about=about_text(), long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Serial port device path (e.g., /dev/ttyUSB0 on Linux, COM3 on Windows)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Baud rate of the serial link [default: 9600]
    #[arg(short, long)]
    pub baud_rate: Option<u32>,

    /// Timeout for serial reads (e.g., "500ms", "1s") [default: 1s]
    #[arg(value_parser = humantime::parse_duration, long)]
    pub timeout: Option<Duration>,

    /// Pause after opening the port so the BMS can wake up (e.g., "2s") [default: 2s]
    #[arg(value_parser = humantime::parse_duration, long)]
    pub wake_up: Option<Duration>,

    /// Pause between sending the request and reading the reply [default: 500ms]
    #[arg(value_parser = humantime::parse_duration, long)]
    pub response_delay: Option<Duration>,

    /// YAML file with serial settings; flags given on the command line take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: CliCommands,
}

/// Turns hex text such as `DD A5 05`, `dd:a5:05`, `0xDD,0xA5` or `DDA505` into bytes.
pub fn parse_hex_frame(parts: &[String]) -> Result<Vec<u8>> {
    let mut frame = Vec::new();
    for token in parts
        .iter()
        .flat_map(|part| part.split(|c: char| c.is_whitespace() || c == ',' || c == ':'))
        .filter(|token| !token.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.is_empty()
            || digits.len() % 2 != 0
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            bail!("Invalid hex token '{}'", token);
        }
        for pair in digits.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(pair)
                .with_context(|| format!("Invalid hex token '{token}'"))?;
            let byte = u8::from_str_radix(pair, 16)
                .with_context(|| format!("Invalid hex token '{token}'"))?;
            frame.push(byte);
        }
    }
    if frame.is_empty() {
        bail!("No frame bytes given");
    }
    Ok(frame)
}
