use serde::{Deserialize, Serialize};

/// Foreign key definition preserving column ordering.
///
/// `columns[i]` references `referenced_columns[i]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    /// True when every source column accepts NULL, so the key can be left
    /// unset instead of forcing an ordering dependency.
    pub is_nullable: bool,
}

impl ForeignKey {
    pub fn is_self_reference(&self, table: &str) -> bool {
        self.referenced_table == table
    }

    /// `table(col, ..) -> referenced(col, ..)`, used in messages.
    pub fn describe(&self, table: &str) -> String {
        format!(
            "{}({}) -> {}({})",
            table,
            self.columns.join(", "),
            self.referenced_table,
            self.referenced_columns.join(", ")
        )
    }
}

/// Unique constraint definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub name: Option<String>,
    pub columns: Vec<String>,
}
