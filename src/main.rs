use anyhow::{Context, Result};
use antbms_lib::{
    display::hex_string,
    protocol::{self, Register, Reply},
    serialport::AntBms,
};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use serde_json::json;
use std::{ops::Deref, panic};

mod commandline;
mod config;

use commandline::{CliArgs, CliCommands, OutputFormat};
use config::{FileConfig, Settings};

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown>", 0, 0));
        let cause = panic_info
            .payload()
            .downcast_ref::<String>()
            .map(String::deref);
        let cause = cause.unwrap_or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("<cause unknown>")
        });

        error!(
            "Thread '{}' panicked at {}:{}:{}: {}",
            std::thread::current().name().unwrap_or("<unknown>"),
            filename,
            line,
            column,
            cause
        );
    }));
    log_handle
}

fn query_device(settings: &Settings, register: Register) -> Result<Reply> {
    let mut bms = AntBms::new(&settings.device, settings.baud_rate)
        .with_context(|| format!("Cannot open serial port '{}'", settings.device))?;
    bms.set_timeout(settings.timeout)
        .with_context(|| "Cannot set serial timeout")?;
    bms.set_response_delay(settings.response_delay);

    info!(
        "Waiting {} for the BMS to wake up",
        humantime::format_duration(settings.wake_up)
    );
    std::thread::sleep(settings.wake_up);

    let request = protocol::read_request(register);
    info!(
        "Requesting register {:#04X}: {}",
        u8::from(register),
        hex_string(&request)
    );
    bms.query(&request).with_context(|| "Cannot query BMS")
}

fn report(reply: &Reply, format: OutputFormat) -> Result<()> {
    let raw = &reply.raw;
    let checksum_valid = reply.checksum_valid();
    if !checksum_valid {
        warn!("Checksum mismatch in {}", hex_string(raw));
    }
    let packet = reply.packet();
    if let Ok(packet) = &packet {
        if !packet.is_ok() {
            warn!("BMS reported status 0x{:02X}", packet.status);
        }
    }

    match format {
        OutputFormat::Text => {
            println!("Raw response (hex): {}", hex_string(raw));
            if checksum_valid {
                println!("Checksum verification passed.");
            } else {
                println!("Checksum verification FAILED!");
            }
            if let Ok(packet) = &packet {
                println!("{packet}");
            }
        }
        OutputFormat::Json => {
            let (packet_value, error_value) = match &packet {
                Ok(packet) => {
                    let mut value = serde_json::to_value(packet)?;
                    value["status_ok"] = json!(packet.is_ok());
                    value["data_ascii"] = json!(packet.data_ascii());
                    value["data_hex"] = json!(packet.data_hex());
                    (value, serde_json::Value::Null)
                }
                Err(err) => (serde_json::Value::Null, json!(err.to_string())),
            };
            let output = json!({
                "raw": hex_string(raw),
                "checksum_valid": checksum_valid,
                "packet": packet_value,
                "error": error_value,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    packet.with_context(|| "Cannot parse packet")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter());

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&args, file_config);
    debug!("Settings: {:?}", settings);

    let reply = match &args.command {
        CliCommands::Query { register } => query_device(&settings, Register::from(*register))?,
        CliCommands::Decode { hex } => Reply::new(
            commandline::parse_hex_frame(hex).with_context(|| "Cannot decode hex frame")?,
        ),
    };

    report(&reply, args.format)
}
