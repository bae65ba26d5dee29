//! Configuration for treesync sessions
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (`.toml`, or `.json`/`.json5`)
//! 3. Environment variables (TREESYNC_* prefix)
//! 4. CLI flags (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::exclusion::NameFilter;
use crate::snapshot::{SnapshotBuilder, DEFAULT_MAX_DEPTH};

/// Port both roles use unless configured otherwise
pub const DEFAULT_PORT: u16 = 3012;

pub const ENV_PORT: &str = "TREESYNC_PORT";
pub const ENV_BIND: &str = "TREESYNC_BIND";
pub const ENV_LOG: &str = "TREESYNC_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// TCP port the Initiator listens on and the Responder connects to
	pub port: u16,

	/// Address the Initiator binds to
	pub bind_address: String,

	/// Glob patterns on entry names to leave out of the snapshot
	/// (`desktop.ini` is always left out)
	pub exclude_patterns: Vec<String>,

	/// Deepest directory nesting accepted while taking a snapshot
	pub max_depth: usize,

	/// Default tracing filter when RUST_LOG is not set
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			port: DEFAULT_PORT,
			bind_address: "0.0.0.0".to_string(),
			exclude_patterns: vec![],
			max_depth: DEFAULT_MAX_DEPTH,
			log_level: "info".to_string(),
		}
	}
}

impl Config {
	/// Load a config file, picking the format from its extension
	pub fn load(path: &Path) -> SyncResult<Self> {
		let text = std::fs::read_to_string(path).map_err(|e| SyncError::InvalidConfig {
			message: format!("cannot read {}: {}", path.display(), e),
		})?;
		match path.extension().and_then(|e| e.to_str()) {
			Some("toml") => Self::from_toml_str(&text),
			Some("json") | Some("json5") => Self::from_json5_str(&text),
			_ => Err(SyncError::InvalidConfig {
				message: format!("unsupported config format: {}", path.display()),
			}),
		}
	}

	pub fn from_toml_str(text: &str) -> SyncResult<Self> {
		toml::from_str(text).map_err(|e| SyncError::InvalidConfig { message: e.to_string() })
	}

	pub fn from_json5_str(text: &str) -> SyncResult<Self> {
		json5::from_str(text).map_err(|e| SyncError::InvalidConfig { message: e.to_string() })
	}

	/// Override fields from TREESYNC_* environment variables
	pub fn apply_env(&mut self) -> SyncResult<()> {
		self.apply_env_from(|key| std::env::var(key).ok())
	}

	fn apply_env_from<F>(&mut self, lookup: F) -> SyncResult<()>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(port) = lookup(ENV_PORT) {
			self.port = port.trim().parse().map_err(|_| SyncError::InvalidConfig {
				message: format!("{} is not a port number: {:?}", ENV_PORT, port),
			})?;
		}
		if let Some(bind) = lookup(ENV_BIND) {
			self.bind_address = bind;
		}
		if let Some(level) = lookup(ENV_LOG) {
			self.log_level = level;
		}
		Ok(())
	}

	pub fn snapshot_builder(&self) -> SyncResult<SnapshotBuilder> {
		let filter = NameFilter::new(&self.exclude_patterns)?;
		Ok(SnapshotBuilder::new().filter(filter).max_depth(self.max_depth))
	}

	/// `bind_address:port` for the Initiator's listener
	pub fn bind_endpoint(&self) -> String {
		endpoint(&self.bind_address, self.port)
	}

	/// Address the Responder connects to; a peer given with its own port keeps it
	pub fn peer_endpoint(&self, peer: &str) -> String {
		endpoint(peer, self.port)
	}
}

fn endpoint(host: &str, port: u16) -> String {
	if host.parse::<SocketAddr>().is_ok() {
		return host.to_string();
	}
	match host.parse::<IpAddr>() {
		Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, port),
		Ok(IpAddr::V4(ip)) => format!("{}:{}", ip, port),
		Err(_) if host.contains(':') => host.to_string(),
		Err(_) => format!("{}:{}", host, port),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn test_defaults() {
		let config = Config::default();
		assert_eq!(config.port, 3012);
		assert_eq!(config.bind_endpoint(), "0.0.0.0:3012");
		assert!(config.exclude_patterns.is_empty());
	}

	#[test]
	fn test_partial_toml() {
		let config = Config::from_toml_str(
			r#"
			port = 4000
			excludePatterns = ["*.tmp"]
			"#,
		)
		.unwrap();
		assert_eq!(config.port, 4000);
		assert_eq!(config.exclude_patterns, vec!["*.tmp".to_string()]);
		assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
		assert_eq!(config.log_level, "info");
	}

	#[test]
	fn test_json5() {
		let config =
			Config::from_json5_str("{ bindAddress: '127.0.0.1', excludePatterns: ['*.bak'], }")
				.unwrap();
		assert_eq!(config.bind_endpoint(), "127.0.0.1:3012");
		assert_eq!(config.exclude_patterns, vec!["*.bak".to_string()]);
	}

	#[test]
	fn test_bad_toml() {
		assert!(matches!(
			Config::from_toml_str("port = \"many\""),
			Err(SyncError::InvalidConfig { .. })
		));
	}

	#[test]
	fn test_env_overrides() {
		let vars: HashMap<&str, &str> = [(ENV_PORT, "5000"), (ENV_LOG, "debug")].into_iter().collect();
		let mut config = Config::default();
		config.apply_env_from(|k| vars.get(k).map(|v| v.to_string())).unwrap();
		assert_eq!(config.port, 5000);
		assert_eq!(config.log_level, "debug");
		assert_eq!(config.bind_address, "0.0.0.0");

		let mut config = Config::default();
		let result = config.apply_env_from(|k| (k == ENV_PORT).then(|| "lots".to_string()));
		assert!(result.is_err());
	}

	#[test]
	fn test_peer_endpoint() {
		let config = Config::default();
		assert_eq!(config.peer_endpoint("10.0.0.2"), "10.0.0.2:3012");
		assert_eq!(config.peer_endpoint("10.0.0.2:4000"), "10.0.0.2:4000");
		assert_eq!(config.peer_endpoint("::1"), "[::1]:3012");
		assert_eq!(config.peer_endpoint("backup.lan"), "backup.lan:3012");
		assert_eq!(config.peer_endpoint("backup.lan:4000"), "backup.lan:4000");
	}

	#[test]
	fn test_load_by_extension() {
		let dir = tempfile::TempDir::new().unwrap();
		let toml_path = dir.path().join("treesync.toml");
		std::fs::write(&toml_path, "port = 3100\n").unwrap();
		assert_eq!(Config::load(&toml_path).unwrap().port, 3100);

		let yaml_path = dir.path().join("treesync.yaml");
		std::fs::write(&yaml_path, "port: 3100\n").unwrap();
		assert!(Config::load(&yaml_path).is_err());
	}
}

// vim: ts=4
