//! Masternode configuration file (masternode.conf) support
//!
//! Format: alias IP:port operator_secret collateral_txid collateral_output_index
//!
//! Example:
//! mn1 203.0.113.44:10100 f0b24b5371f4e12da8eb38d510706fb59a19456ab65ed117fbe12fd40f7e9e70 2bcd3c84c84f87eaa86e4e56834c92927a07f9e18718810b92e0d0324456a67c 0

use meridian_core::{Hash256, Outpoint};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MasternodeConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Duplicate alias: {0}")]
    DuplicateAlias(String),

    #[error("Masternode not found: {0}")]
    MasternodeNotFound(String),
}

/// Single masternode configuration entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasternodeConfigEntry {
    /// Alias/name for this masternode
    pub alias: String,

    /// Service address, `ip[:port]`
    pub service: String,

    /// Operator signing key, hex
    pub operator_secret: String,

    /// Collateral transaction hash
    pub collateral_txid: String,

    /// Collateral output index
    pub collateral_output_index: u32,
}

impl MasternodeConfigEntry {
    /// Parse a single line from masternode.conf
    pub fn parse_line(line: &str, line_num: usize) -> Result<Self, MasternodeConfigError> {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            return Err(MasternodeConfigError::ParseError {
                line: line_num,
                message: "Empty or comment line".to_string(),
            });
        }

        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() != 5 {
            return Err(MasternodeConfigError::ParseError {
                line: line_num,
                message: format!(
                    "Expected 5 fields, got {}. Format: alias IP:port operator_secret txid index",
                    parts.len()
                ),
            });
        }

        let entry = Self {
            alias: parts[0].to_string(),
            service: parts[1].to_string(),
            operator_secret: parts[2].to_string(),
            collateral_txid: parts[3].to_string(),
            collateral_output_index: parts[4].parse::<u32>().map_err(|_| {
                MasternodeConfigError::ParseError {
                    line: line_num,
                    message: format!("Invalid output index: {}", parts[4]),
                }
            })?,
        };

        entry
            .validate()
            .map_err(|e| MasternodeConfigError::ParseError {
                line: line_num,
                message: e.to_string(),
            })?;

        Ok(entry)
    }

    /// Format as a line for masternode.conf
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.alias,
            self.service,
            self.operator_secret,
            self.collateral_txid,
            self.collateral_output_index
        )
    }

    /// Validate the configuration entry
    pub fn validate(&self) -> Result<(), MasternodeConfigError> {
        if self.alias.is_empty() || self.alias.contains(char::is_whitespace) {
            return Err(MasternodeConfigError::InvalidFormat(
                "Invalid alias".to_string(),
            ));
        }

        if self.service.is_empty() {
            return Err(MasternodeConfigError::InvalidFormat(
                "Empty service address".to_string(),
            ));
        }

        if self.operator_secret.is_empty()
            || !self.operator_secret.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(MasternodeConfigError::InvalidFormat(
                "Operator secret must be a hex string".to_string(),
            ));
        }

        if self.collateral_txid.len() != 64
            || !self.collateral_txid.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(MasternodeConfigError::InvalidFormat(
                "Invalid transaction ID".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured collateral outpoint.
    pub fn outpoint(&self) -> Option<Outpoint> {
        Hash256::from_hex(&self.collateral_txid)
            .map(|txid| Outpoint::new(txid, self.collateral_output_index))
    }
}

/// Masternode configuration file (masternode.conf)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasternodeConfig {
    entries: Vec<MasternodeConfigEntry>,
}

impl MasternodeConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, MasternodeConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(content: &str) -> Result<Self, MasternodeConfigError> {
        let mut entries = Vec::new();
        let mut aliases = std::collections::HashSet::new();

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let entry = MasternodeConfigEntry::parse_line(line, line_num + 1)?;
            if !aliases.insert(entry.alias.clone()) {
                return Err(MasternodeConfigError::DuplicateAlias(entry.alias.clone()));
            }
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MasternodeConfigError> {
        let mut content = String::new();
        content.push_str("# Meridian Masternode Configuration\n");
        content.push_str(
            "# Format: alias IP:port operator_secret collateral_txid collateral_output_index\n",
        );
        content.push_str("#\n\n");

        for entry in &self.entries {
            content.push_str(&entry.to_line());
            content.push('\n');
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Add a masternode configuration entry
    pub fn add_entry(&mut self, entry: MasternodeConfigEntry) -> Result<(), MasternodeConfigError> {
        entry.validate()?;

        if self.get_entry(&entry.alias).is_some() {
            return Err(MasternodeConfigError::DuplicateAlias(entry.alias.clone()));
        }

        self.entries.push(entry);
        Ok(())
    }

    /// Remove a masternode configuration entry by alias
    pub fn remove_entry(&mut self, alias: &str) -> Result<(), MasternodeConfigError> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.alias == alias)
            .ok_or_else(|| MasternodeConfigError::MasternodeNotFound(alias.to_string()))?;

        self.entries.remove(pos);
        Ok(())
    }

    /// Get a masternode configuration entry by alias
    pub fn get_entry(&self, alias: &str) -> Option<&MasternodeConfigEntry> {
        self.entries.iter().find(|e| e.alias == alias)
    }

    /// Get all configuration entries
    pub fn entries(&self) -> &[MasternodeConfigEntry] {
        &self.entries
    }

    /// Get the number of configured masternodes
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Check if a masternode with the given alias exists
    pub fn has_alias(&self, alias: &str) -> bool {
        self.entries.iter().any(|e| e.alias == alias)
    }
}
