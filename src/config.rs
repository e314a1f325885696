use crate::commandline::CliArgs;
use anyhow::{Context, Result};
use antbms_lib::protocol::DEFAULT_BAUD_RATE;
use serde::{Deserialize, Deserializer};
use std::{path::Path, time::Duration};

fn default_device_name() -> String {
    if cfg!(target_os = "windows") {
        String::from("COM3")
    } else {
        String::from("/dev/ttyUSB0")
    }
}

fn optional_duration<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
        .transpose()
}

/// Serial settings read from a YAML file. Every key is optional.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    device: Option<String>,
    baud_rate: Option<u32>,
    #[serde(deserialize_with = "optional_duration")]
    timeout: Option<Duration>,
    #[serde(deserialize_with = "optional_duration")]
    wake_up: Option<Duration>,
    #[serde(deserialize_with = "optional_duration")]
    response_delay: Option<Duration>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Cannot parse config file '{}'", path.display()))
    }
}

/// Effective serial settings after merging command line, config file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub device: String,
    pub baud_rate: u32,
    pub timeout: Duration,
    pub wake_up: Duration,
    pub response_delay: Duration,
}

impl Settings {
    fn default_timeout() -> Duration {
        Duration::from_secs(1)
    }

    fn default_wake_up() -> Duration {
        Duration::from_secs(2)
    }

    fn default_response_delay() -> Duration {
        Duration::from_millis(500)
    }

    pub fn resolve(args: &CliArgs, file: FileConfig) -> Self {
        Self {
            device: args
                .device
                .clone()
                .or(file.device)
                .unwrap_or_else(default_device_name),
            baud_rate: args
                .baud_rate
                .or(file.baud_rate)
                .unwrap_or(DEFAULT_BAUD_RATE),
            timeout: args
                .timeout
                .or(file.timeout)
                .unwrap_or_else(Self::default_timeout),
            wake_up: args
                .wake_up
                .or(file.wake_up)
                .unwrap_or_else(Self::default_wake_up),
            response_delay: args
                .response_delay
                .or(file.response_delay)
                .unwrap_or_else(Self::default_response_delay),
        }
    }
}
