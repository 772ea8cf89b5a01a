use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::intake::IntakeLimits;
use crate::optimizer::PackingConfig;
use crate::types::EPSILON_BOUNDS_MAX;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
            store: StoreConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "TRUCK_PACKER_API_HOST";
    const PORT_VAR: &'static str = "TRUCK_PACKER_API_PORT";

    fn from_env() -> Self {
        Self::from_values(env_string(Self::HOST_VAR), env_string(Self::PORT_VAR))
    }

    fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let host_value = host.unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (Self::DEFAULT_BIND_IP, Self::DEFAULT_HOST.to_string())
            }
        };

        let port = interpret(
            Self::PORT_VAR,
            port,
            Self::DEFAULT_PORT,
            |value| value != 0,
            "must not be 0",
            None,
        );

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the packer and its intake boundary.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
    max_cargo_items: usize,
}

impl OptimizerConfig {
    const BOUNDS_EPSILON_VAR: &'static str = "TRUCK_PACKER_BOUNDS_EPSILON";
    const MAX_CARGO_ITEMS_VAR: &'static str = "TRUCK_PACKER_MAX_CARGO_ITEMS";

    fn from_env() -> Self {
        Self::from_values(
            env_string(Self::BOUNDS_EPSILON_VAR),
            env_string(Self::MAX_CARGO_ITEMS_VAR),
        )
    }

    fn from_values(bounds_epsilon: Option<String>, max_cargo_items: Option<String>) -> Self {
        let bounds_epsilon = interpret(
            Self::BOUNDS_EPSILON_VAR,
            bounds_epsilon,
            PackingConfig::DEFAULT_BOUNDS_EPSILON,
            |value| value > 0.0 && value <= EPSILON_BOUNDS_MAX,
            "must be greater than 0 and at most 0.01",
            Some("Warning: Adjusted containment tolerance may let boxes stick out of the truck"),
        );

        let max_cargo_items = interpret(
            Self::MAX_CARGO_ITEMS_VAR,
            max_cargo_items,
            IntakeLimits::DEFAULT_MAX_CARGO_ITEMS,
            |value| value > 0,
            "must be greater than 0",
            Some("Warning: Large cargo lists increase packing time quadratically"),
        );

        let packing = PackingConfig::builder()
            .bounds_epsilon(bounds_epsilon)
            .build();

        Self {
            packing,
            max_cargo_items,
        }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }

    /// Limits for admitting cargo, sharing the packer's tolerance.
    pub fn intake_limits(&self) -> IntakeLimits {
        IntakeLimits {
            max_cargo_items: self.max_cargo_items,
            epsilon: self.packing.bounds_epsilon,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::from_values(None, None)
    }
}

/// Configuration for saved configurations.
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    path: Option<PathBuf>,
}

impl StoreConfig {
    const PATH_VAR: &'static str = "TRUCK_PACKER_STORE_PATH";

    fn from_env() -> Self {
        Self {
            path: env_string(Self::PATH_VAR).map(PathBuf::from),
        }
    }

    /// JSON file backing the store; `None` keeps configurations in memory only.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

/// Parses and validates a raw setting, falling back to `default` with a warning.
///
/// `changed_notice` is printed when a valid value differs from the default.
fn interpret<T>(
    var_name: &str,
    raw: Option<String>,
    default: T,
    validator: impl Fn(T) -> bool,
    invalid_hint: &str,
    changed_notice: Option<&str>,
) -> T
where
    T: FromStr + Copy + PartialEq + Display,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return default;
    };

    match raw.parse::<T>() {
        Ok(value) if validator(value) => {
            if let Some(notice) = changed_notice {
                if value != default {
                    println!("⚠️ {} ({} = {}).", notice, var_name, value);
                }
            }
            value
        }
        Ok(_) => {
            eprintln!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            eprintln!(
                "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn interpret_uses_default_when_unset() {
        let value = interpret("TEST_VAR", None, 7u16, |v| v > 0, "must be > 0", None);
        assert_eq!(value, 7);
    }

    #[test]
    fn interpret_accepts_valid_values() {
        let value = interpret("TEST_VAR", some("0.005"), 0.001, |v| v > 0.0, "", None);
        assert_eq!(value, 0.005);
    }

    #[test]
    fn interpret_rejects_invalid_and_unparsable_values() {
        assert_eq!(interpret("TEST_VAR", some("-1"), 0.001, |v| v > 0.0, "", None), 0.001);
        assert_eq!(interpret("TEST_VAR", some("abc"), 0.001, |v| v > 0.0, "", None), 0.001);
        assert_eq!(interpret("TEST_VAR", some("70000"), 8080u16, |v| v != 0, "", None), 8080);
    }

    #[test]
    fn api_config_defaults() {
        let config = ApiConfig::from_values(None, None);
        assert_eq!(config.port(), 8080);
        assert!(config.binds_to_all_interfaces());
        assert!(config.uses_default_host());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn api_config_falls_back_on_bad_input() {
        let config = ApiConfig::from_values(some("not-an-ip"), some("0"));
        assert_eq!(config.display_host(), "0.0.0.0");
        assert_eq!(config.port(), 8080);

        let config = ApiConfig::from_values(some("127.0.0.1"), some("9000"));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert!(!config.binds_to_all_interfaces());
    }

    #[test]
    fn optimizer_config_limits_epsilon() {
        let config = OptimizerConfig::from_values(some("0.5"), None);
        assert_eq!(
            config.packing_config().bounds_epsilon,
            PackingConfig::DEFAULT_BOUNDS_EPSILON
        );

        let config = OptimizerConfig::from_values(some("0.002"), some("40"));
        assert_eq!(config.packing_config().bounds_epsilon, 0.002);
        let limits = config.intake_limits();
        assert_eq!(limits.max_cargo_items, 40);
        assert_eq!(limits.epsilon, 0.002);
    }

    #[test]
    fn optimizer_config_rejects_zero_item_limit() {
        let config = OptimizerConfig::from_values(None, some("0"));
        assert_eq!(
            config.intake_limits().max_cargo_items,
            IntakeLimits::DEFAULT_MAX_CARGO_ITEMS
        );
    }
}
