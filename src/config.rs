//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below, which describe a node with two identity buttons, a
//! contact sensor and a battery divider on sysfs, pushing over the radio
//! link every 500 ms.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use crate::error::{Result, TelemetryError};
use crate::frame::protocol::{PeerAddress, MAX_RADIO_CHANNEL};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub hal: HalConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub receiver: ReceiverConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Node identity configuration
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    #[serde(default = "default_state_file")]
    pub state_file: String,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_button_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_active_high")]
    pub active_high: bool,
}

/// Sysfs paths of the node's inputs
#[derive(Debug, Deserialize, Clone)]
pub struct HalConfig {
    #[serde(default = "default_contact_path")]
    pub contact_path: String,

    #[serde(default = "default_battery_adc_path")]
    pub battery_adc_path: String,

    #[serde(default = "default_increment_button_path")]
    pub increment_button_path: String,

    #[serde(default = "default_decrement_button_path")]
    pub decrement_button_path: String,
}

/// Battery sampling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SamplerConfig {
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    #[serde(default = "default_reference_voltage")]
    pub reference_voltage: f32,

    #[serde(default = "default_adc_resolution")]
    pub adc_resolution: u32,

    #[serde(default = "default_divider_r1")]
    pub divider_r1: f32,

    #[serde(default = "default_divider_r2")]
    pub divider_r2: f32,

    #[serde(default = "default_calibration_factor")]
    pub calibration_factor: f32,

    #[serde(default = "default_empty_voltage")]
    pub empty_voltage: f32,

    #[serde(default = "default_full_voltage")]
    pub full_voltage: f32,
}

/// Delivery strategy
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Binary frame over the point-to-point radio link
    Radio,
    /// Form-encoded HTTP POST
    Http,
}

/// Outbound transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default = "default_transport_enabled")]
    pub enabled: bool,

    #[serde(default = "default_transport_kind")]
    pub kind: TransportKind,

    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,

    #[serde(default)]
    pub radio: RadioConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Radio link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_peer_mac")]
    pub peer_mac: String,

    #[serde(default)]
    pub channel: u8,

    /// Datagram address the link delivers frames to
    #[serde(default = "default_link_address")]
    pub link_address: String,

    #[serde(default = "default_radio_bind_address")]
    pub bind_address: String,
}

/// HTTP push configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_http_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

/// Inbound radio frame receiver
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_receiver_bind_address")]
    pub bind_address: String,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,

    #[serde(default = "default_server_bind_address")]
    pub bind_address: String,

    /// Address reported as `ip` in the local reading
    #[serde(default)]
    pub advertise_ip: Option<String>,

    /// Remote address used to find the outbound interface when
    /// `advertise_ip` is unset and the server binds a wildcard address.
    /// Nothing is sent to it.
    #[serde(default = "default_route_address")]
    pub route_address: String,

    #[serde(default = "default_min_slots")]
    pub min_slots: usize,
}

/// Status display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_display_enabled")]
    pub enabled: bool,

    #[serde(default = "default_display_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; stdout only when unset
    #[serde(default)]
    pub directory: Option<String>,
}

/// Dispatch loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

// Default value functions
fn default_state_file() -> String { "./state/identity.json".to_string() }
fn default_debounce_ms() -> u64 { 50 }
fn default_button_poll_interval_ms() -> u64 { 200 }
fn default_active_high() -> bool { true }

fn default_contact_path() -> String { "/sys/class/gpio/gpio13/value".to_string() }
fn default_battery_adc_path() -> String {
    "/sys/bus/iio/devices/iio:device0/in_voltage6_raw".to_string()
}
fn default_increment_button_path() -> String { "/sys/class/gpio/gpio4/value".to_string() }
fn default_decrement_button_path() -> String { "/sys/class/gpio/gpio15/value".to_string() }

fn default_sample_count() -> usize { 100 }
fn default_reference_voltage() -> f32 { 3.3 }
fn default_adc_resolution() -> u32 { 4096 }
fn default_divider_r1() -> f32 { 100_000.0 }
fn default_divider_r2() -> f32 { 10_000.0 }
fn default_calibration_factor() -> f32 { 1.0 }
fn default_empty_voltage() -> f32 { 3.2 }
fn default_full_voltage() -> f32 { 4.2 }

fn default_transport_enabled() -> bool { true }
fn default_transport_kind() -> TransportKind { TransportKind::Radio }
fn default_send_interval_ms() -> u64 { 500 }
fn default_peer_mac() -> String { "24:6F:28:12:34:56".to_string() }
fn default_link_address() -> String { "127.0.0.1:4210".to_string() }
fn default_radio_bind_address() -> String { "0.0.0.0:0".to_string() }
fn default_http_endpoint() -> String { "http://192.168.4.1/sensor".to_string() }
fn default_http_timeout_ms() -> u64 { 5000 }

fn default_receiver_bind_address() -> String { "0.0.0.0:4210".to_string() }

fn default_server_enabled() -> bool { true }
fn default_server_bind_address() -> String { "0.0.0.0:8080".to_string() }
fn default_route_address() -> String { "8.8.8.8:80".to_string() }
fn default_min_slots() -> usize { 3 }

fn default_display_enabled() -> bool { true }
fn default_display_refresh_interval_ms() -> u64 { 500 }

fn default_log_level() -> String { "info".to_string() }

fn default_tick_ms() -> u64 { 10 }

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_button_poll_interval_ms(),
            active_high: default_active_high(),
        }
    }
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            contact_path: default_contact_path(),
            battery_adc_path: default_battery_adc_path(),
            increment_button_path: default_increment_button_path(),
            decrement_button_path: default_decrement_button_path(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            reference_voltage: default_reference_voltage(),
            adc_resolution: default_adc_resolution(),
            divider_r1: default_divider_r1(),
            divider_r2: default_divider_r2(),
            calibration_factor: default_calibration_factor(),
            empty_voltage: default_empty_voltage(),
            full_voltage: default_full_voltage(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            enabled: default_transport_enabled(),
            kind: default_transport_kind(),
            send_interval_ms: default_send_interval_ms(),
            radio: RadioConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            peer_mac: default_peer_mac(),
            channel: 0,
            link_address: default_link_address(),
            bind_address: default_radio_bind_address(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: default_http_endpoint(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: default_receiver_bind_address(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            bind_address: default_server_bind_address(),
            advertise_ip: None,
            route_address: default_route_address(),
            min_slots: default_min_slots(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: default_display_enabled(),
            refresh_interval_ms: default_display_refresh_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl RadioConfig {
    /// Parsed peer hardware address
    pub fn peer(&self) -> Result<PeerAddress> {
        self.peer_mac.parse()
    }
}

fn invalid(msg: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Config(toml::de::Error::custom(msg))
}

fn check_interval(name: &str, value: u64, max: u64) -> Result<()> {
    if value == 0 || value > max {
        return Err(invalid(format!("{} must be between 1 and {}", name, max)));
    }
    Ok(())
}

fn check_socket_addr(name: &str, value: &str) -> Result<()> {
    value
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| {
            invalid(format!("{} must be a socket address (host:port), got {:?}", name, value))
        })
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use touch_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Identity
        if self.identity.state_file.is_empty() {
            return Err(invalid("identity state_file cannot be empty"));
        }
        check_interval("debounce_ms", self.identity.debounce_ms, 10_000)?;
        check_interval("poll_interval_ms", self.identity.poll_interval_ms, 10_000)?;

        // Hardware paths
        for (name, path) in [
            ("contact_path", &self.hal.contact_path),
            ("battery_adc_path", &self.hal.battery_adc_path),
            ("increment_button_path", &self.hal.increment_button_path),
            ("decrement_button_path", &self.hal.decrement_button_path),
        ] {
            if path.is_empty() {
                return Err(invalid(format!("{} cannot be empty", name)));
            }
        }

        // Sampler
        if self.sampler.sample_count == 0 || self.sampler.sample_count > 10_000 {
            return Err(invalid("sample_count must be between 1 and 10000"));
        }
        if self.sampler.adc_resolution == 0 {
            return Err(invalid("adc_resolution must be greater than 0"));
        }
        for (name, value) in [
            ("reference_voltage", self.sampler.reference_voltage),
            ("divider_r1", self.sampler.divider_r1),
            ("divider_r2", self.sampler.divider_r2),
            ("calibration_factor", self.sampler.calibration_factor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{} must be greater than 0", name)));
            }
        }
        if !(self.sampler.empty_voltage.is_finite() && self.sampler.full_voltage.is_finite())
            || self.sampler.empty_voltage >= self.sampler.full_voltage
        {
            return Err(invalid("empty_voltage must be less than full_voltage"));
        }

        // Transport
        check_interval("send_interval_ms", self.transport.send_interval_ms, 60_000)?;
        let radio = &self.transport.radio;
        radio.peer().map_err(|_| {
            invalid(format!("peer_mac {:?} is not a hardware address", radio.peer_mac))
        })?;
        if radio.channel > MAX_RADIO_CHANNEL {
            return Err(invalid(format!(
                "radio channel must be between 0 and {}",
                MAX_RADIO_CHANNEL
            )));
        }
        check_socket_addr("radio link_address", &self.transport.radio.link_address)?;
        check_socket_addr("radio bind_address", &self.transport.radio.bind_address)?;
        if !self.transport.http.endpoint.starts_with("http://") {
            return Err(invalid("http endpoint must be a plain http:// URL"));
        }
        check_interval("http timeout_ms", self.transport.http.timeout_ms, 60_000)?;

        // Receiver
        check_socket_addr("receiver bind_address", &self.receiver.bind_address)?;

        // Server
        check_socket_addr("server bind_address", &self.server.bind_address)?;
        if let Some(ip) = &self.server.advertise_ip {
            ip.parse::<IpAddr>()
                .map_err(|_| invalid(format!("advertise_ip {:?} is not an IP address", ip)))?;
        }
        check_socket_addr("server route_address", &self.server.route_address)?;
        if self.server.min_slots > 64 {
            return Err(invalid("min_slots must be between 0 and 64"));
        }

        // Display
        check_interval("refresh_interval_ms", self.display.refresh_interval_ms, 60_000)?;

        // Logging
        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }
        if matches!(&self.logging.directory, Some(dir) if dir.is_empty()) {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        // Runtime
        check_interval("tick_ms", self.runtime.tick_ms, 1_000)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.transport.kind, TransportKind::Radio);
        assert_eq!(config.transport.send_interval_ms, 500);
        assert_eq!(config.identity.poll_interval_ms, 200);
        assert_eq!(config.server.min_slots, 3);
        assert!(!config.receiver.enabled);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[identity]
state_file = "/var/lib/touch/identity.json"
active_high = false

[transport]
kind = "http"
send_interval_ms = 1000

[transport.http]
endpoint = "http://10.0.0.1/sensor"
timeout_ms = 2000

[server]
advertise_ip = "10.0.0.5"
min_slots = 4
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.identity.state_file, "/var/lib/touch/identity.json");
        assert!(!config.identity.active_high);
        assert_eq!(config.identity.debounce_ms, 50);
        assert_eq!(config.transport.kind, TransportKind::Http);
        assert_eq!(config.transport.http.endpoint, "http://10.0.0.1/sensor");
        assert_eq!(config.transport.http.timeout_ms, 2000);
        assert_eq!(config.server.advertise_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.server.min_slots, 4);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Config::load("/nonexistent/touch-telemetry.toml");
        assert!(matches!(result, Err(TelemetryError::Io(_))));
    }

    #[test]
    fn test_unknown_transport_kind() {
        let result = Config::from_toml("[transport]\nkind = \"carrier-pigeon\"\n");
        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn test_empty_state_file() {
        let mut config = create_valid_config();
        config.identity.state_file = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debounce_zero() {
        let mut config = create_valid_config();
        config.identity.debounce_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_button_poll_interval_too_high() {
        let mut config = create_valid_config();
        config.identity.poll_interval_ms = 10_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_hal_path() {
        let mut config = create_valid_config();
        config.hal.battery_adc_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_count_zero() {
        let mut config = create_valid_config();
        config.sampler.sample_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_divider_r2_zero() {
        let mut config = create_valid_config();
        config.sampler.divider_r2 = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_adc_resolution_zero() {
        let mut config = create_valid_config();
        config.sampler.adc_resolution = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_voltage_range() {
        let mut config = create_valid_config();
        config.sampler.empty_voltage = 4.2;
        config.sampler.full_voltage = 3.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_send_interval_zero() {
        let mut config = create_valid_config();
        config.transport.send_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_peer_mac() {
        let mut config = create_valid_config();
        config.transport.radio.peer_mac = "24:6F:28".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_radio_channel_too_high() {
        let mut config = create_valid_config();
        config.transport.radio.channel = 15;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_link_address() {
        let mut config = create_valid_config();
        config.transport.radio.link_address = "gateway".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_endpoint_without_scheme() {
        let mut config = create_valid_config();
        config.transport.http.endpoint = "192.168.4.1/sensor".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_https_endpoint_rejected() {
        let mut config = create_valid_config();
        config.transport.http.endpoint = "https://192.168.4.1/sensor".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_timeout_zero() {
        let mut config = create_valid_config();
        config.transport.http.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_advertise_ip() {
        let mut config = create_valid_config();
        config.server.advertise_ip = Some("node-3.local".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_route_address() {
        let mut config = create_valid_config();
        config.server.route_address = "8.8.8.8".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_slots_too_high() {
        let mut config = create_valid_config();
        config.server.min_slots = 65;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_slots_zero_is_valid() {
        let mut config = create_valid_config();
        config.server.min_slots = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_directory() {
        let mut config = create_valid_config();
        config.logging.directory = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_too_high() {
        let mut config = create_valid_config();
        config.runtime.tick_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_peer_parses() {
        let config = create_valid_config();
        assert_eq!(
            config.transport.radio.peer().unwrap().octets(),
            [0x24, 0x6F, 0x28, 0x12, 0x34, 0x56]
        );
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_state_file(), "./state/identity.json");
        assert_eq!(default_debounce_ms(), 50);
        assert_eq!(default_button_poll_interval_ms(), 200);
        assert!(default_active_high());
        assert_eq!(default_sample_count(), 100);
        assert_eq!(default_reference_voltage(), 3.3);
        assert_eq!(default_adc_resolution(), 4096);
        assert_eq!(default_divider_r1(), 100_000.0);
        assert_eq!(default_divider_r2(), 10_000.0);
        assert_eq!(default_calibration_factor(), 1.0);
        assert_eq!(default_empty_voltage(), 3.2);
        assert_eq!(default_full_voltage(), 4.2);
        assert_eq!(default_transport_kind(), TransportKind::Radio);
        assert_eq!(default_send_interval_ms(), 500);
        assert_eq!(default_peer_mac(), "24:6F:28:12:34:56");
        assert_eq!(default_http_timeout_ms(), 5000);
        assert_eq!(default_receiver_bind_address(), "0.0.0.0:4210");
        assert_eq!(default_min_slots(), 3);
        assert_eq!(default_route_address(), "8.8.8.8:80");
        assert_eq!(default_display_refresh_interval_ms(), 500);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_tick_ms(), 10);
    }
}
