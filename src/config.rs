use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::ExtractArgs;

/// Which corrected boxes may start a downward link to the next box in their column.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainPolicy {
    /// Only boxes that kept their measured geometry.
    #[default]
    UnsnappedOnly,
    /// Every box that received a column assignment.
    AllAssigned,
}

impl ChainPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsnappedOnly => "unsnapped-only",
            Self::AllAssigned => "all-assigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub expected_column_count: usize,
    pub in_column_fraction: f64,
    pub min_line_length: usize,
    pub require_leading_uppercase: bool,
    pub chain_policy: ChainPolicy,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            expected_column_count: 2,
            in_column_fraction: 0.55,
            min_line_length: 20,
            require_leading_uppercase: true,
            chain_policy: ChainPolicy::UnsnappedOnly,
        }
    }
}

impl ColumnConfig {
    pub fn validate(&self) -> Result<()> {
        if self.expected_column_count < 1 {
            bail!(
                "expected_column_count must be at least 1, got {}",
                self.expected_column_count
            );
        }

        if !(self.in_column_fraction > 0.0 && self.in_column_fraction <= 1.0) {
            bail!(
                "in_column_fraction must be in (0, 1], got {}",
                self.in_column_fraction
            );
        }

        Ok(())
    }

    /// Minimum population a histogram bin needs before it counts as a column.
    pub fn column_threshold(&self, bbox_count: usize) -> f64 {
        bbox_count as f64 * (self.in_column_fraction / self.expected_column_count as f64)
    }
}

pub fn load_config_file(path: &Path) -> Result<ColumnConfig> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let config: ColumnConfig = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}

/// Defaults, then the optional config file, then individual flags.
pub fn resolve_config(args: &ExtractArgs) -> Result<ColumnConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => ColumnConfig::default(),
    };

    if let Some(count) = args.expected_column_count {
        config.expected_column_count = count;
    }
    if let Some(fraction) = args.in_column_fraction {
        config.in_column_fraction = fraction;
    }
    if let Some(length) = args.min_line_length {
        config.min_line_length = length;
    }
    if args.allow_lowercase_start {
        config.require_leading_uppercase = false;
    }
    if let Some(policy) = args.chain_policy {
        config.chain_policy = policy.into();
    }

    config.validate()?;
    Ok(config)
}
