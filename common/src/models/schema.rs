//! Database schema description returned by a successful connect.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Column descriptor within a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Column data type as reported by the database.
    #[serde(rename = "type", default)]
    pub column_type: String,
    /// Whether the column is nullable.
    #[serde(default)]
    pub is_nullable: bool,
    /// Whether the column is part of the primary key.
    #[serde(default)]
    pub is_primary: bool,
}

/// Table name → ordered column descriptors.
pub type DatabaseSchema = BTreeMap<String, Vec<ColumnDescriptor>>;

/// Formats a schema as compact `table(column type, ...)` lines.
pub fn describe_schema(schema: &DatabaseSchema) -> String {
    schema
        .iter()
        .map(|(table, columns)| {
            let cols = columns
                .iter()
                .map(|c| {
                    let mut col = format!("{} {}", c.name, c.column_type);
                    if c.is_primary {
                        col.push_str(" PK");
                    }
                    if !c.is_nullable {
                        col.push_str(" NOT NULL");
                    }
                    col
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({})", table, cols)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
