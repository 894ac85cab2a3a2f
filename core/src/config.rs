use crate::types::STORE_TIMESTAMP_FORMAT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkSizes {
    pub customer_updates: usize,
    pub transactions: usize,
    pub apply_transactions: usize,
    /// One customer per commit by default. The account fold runs per
    /// customer, so any size is correct; it only changes restart granularity.
    pub statements: usize,
}

impl Default for ChunkSizes {
    fn default() -> Self {
        Self {
            customer_updates: 100,
            transactions: 100,
            apply_transactions: 100,
            statements: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StatementConfig {
    pub output_dir: String,
    pub header_width: usize,
    pub header_lines: Vec<String>,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            output_dir: "target/statement".into(),
            header_width: 120,
            header_lines: vec![
                "Statement Batch Services".into(),
                "Customer Service: 1-800-555-0199".into(),
                "Available 24/7".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BatchConfig {
    pub chunk_sizes: ChunkSizes,
    pub statement: StatementConfig,
    /// chrono format for `timestamp` in the transaction feed.
    pub transaction_timestamp_format: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_sizes: ChunkSizes::default(),
            statement: StatementConfig::default(),
            transaction_timestamp_format: STORE_TIMESTAMP_FORMAT.into(),
        }
    }
}

impl BatchConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: BatchConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let sizes = [
            ("customer_updates", self.chunk_sizes.customer_updates),
            ("transactions", self.chunk_sizes.transactions),
            ("apply_transactions", self.chunk_sizes.apply_transactions),
            ("statements", self.chunk_sizes.statements),
        ];
        for (name, size) in sizes {
            if size == 0 {
                anyhow::bail!("chunk_sizes.{name} must be at least 1");
            }
        }
        if self.transaction_timestamp_format.trim().is_empty() {
            anyhow::bail!("transaction_timestamp_format must not be empty");
        }
        Ok(())
    }
}
