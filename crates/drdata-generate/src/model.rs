use serde::{Deserialize, Serialize};

/// Options for the row generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Seed for reproducible runs; a random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Chance that a nullable column (or nullable foreign key) is NULL.
    pub null_probability: f64,
    /// Row re-draws allowed per row before a unique constraint gives up.
    pub max_unique_attempts: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: None,
            null_probability: 0.1,
            max_unique_attempts: 100,
        }
    }
}

impl GenerateOptions {
    /// `null_probability` clamped to `[0, 1]`; NaN counts as zero.
    pub fn effective_null_probability(&self) -> f64 {
        if self.null_probability.is_nan() {
            0.0
        } else {
            self.null_probability.clamp(0.0, 1.0)
        }
    }
}

/// Summary of a generated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows_requested: u64,
    pub rows_written: u64,
    pub retries: u64,
    pub duration_ms: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub tables: Vec<TableReport>,
    pub retries_total: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64) -> Self {
        Self {
            run_id,
            seed,
            tables: Vec::new(),
            retries_total: 0,
            duration_ms: 0,
        }
    }

    pub fn record_table(&mut self, table: TableReport) {
        self.retries_total += table.retries;
        self.tables.push(table);
    }

    pub fn rows_written(&self) -> u64 {
        self.tables.iter().map(|table| table.rows_written).sum()
    }
}
