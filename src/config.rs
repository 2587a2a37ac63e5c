//! Configuration Management
//!
//! Handles persistent configuration storage for ec2inv.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Regions to inventory, or a single "all" entry
    pub regions: Vec<String>,
    /// Regions skipped when expanding "all"
    pub regions_exclude: Vec<String>,
    /// Address attribute used for instances outside a VPC
    pub destination_variable: String,
    /// Address attribute used for instances with a subnet
    pub vpc_destination_variable: String,
    /// Group hosts by the Route 53 domain names pointing at them
    pub route53: bool,
    /// Zones ignored by the Route 53 lookup
    pub route53_excluded_zones: Vec<String>,
    /// Cache directory override
    pub cache_path: Option<PathBuf>,
    /// Cache lifetime in seconds
    pub cache_max_age: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            regions: vec!["all".to_string()],
            regions_exclude: vec!["us-gov-west-1".to_string(), "cn-north-1".to_string()],
            destination_variable: "public_dns_name".to_string(),
            vpc_destination_variable: "ip_address".to_string(),
            route53: false,
            route53_excluded_zones: Vec::new(),
            cache_path: None,
            cache_max_age: 300,
        }
    }
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ec2inv").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Cache directory, resolved CLI > environment > config > platform default
    pub fn cache_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_override {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var("EC2INV_CACHE_PATH") {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.cache_path {
            return path.clone();
        }
        dirs::cache_dir()
            .map(|p| p.join("ec2inv"))
            .unwrap_or_else(|| PathBuf::from(".ec2inv-cache"))
    }
}

/// Cache files are namespaced by AWS profile so switching profiles never
/// serves another account's inventory.
pub fn profile_prefix() -> String {
    match std::env::var("AWS_PROFILE") {
        Ok(profile) if !profile.is_empty() => format!("{profile}-"),
        _ => String::new(),
    }
}
