//! DuckDB connection wrapper used as the tabular engine.
//!
//! Snapshot records are staged as newline-delimited JSON and loaded with
//! `read_json_auto`; cache files are written with `COPY ... TO` and read back
//! with `read_csv_auto`. Reads and exports go through the same schema-driven
//! projection, so every column lands in a [`Table`] (or a cache file) as a
//! plain scalar and a saved snapshot reads back unchanged.

use crate::error::{ExtractorError, Result};
use crate::table::Table;
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Column types passed through untouched. Anything else (DECIMAL, temporal
/// types, STRUCT, LIST, MAP, JSON, ...) is converted by `scalar_projection`.
fn passthrough_types() -> HashSet<&'static str> {
    HashSet::from([
        "BOOLEAN",
        "TINYINT",
        "SMALLINT",
        "INTEGER",
        "BIGINT",
        "HUGEINT",
        "UTINYINT",
        "USMALLINT",
        "UINTEGER",
        "UBIGINT",
        "FLOAT",
        "DOUBLE",
        "VARCHAR",
    ])
}

/// Wraps an in-memory DuckDB database.
pub struct Connection {
    conn: DuckDbConnection,
}

impl Connection {
    /// Open an in-memory DuckDB database.
    pub fn new() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create a table from a slice of JSON objects, preserving key order.
    ///
    /// Records are staged in a temporary NDJSON file that DuckDB streams from.
    pub fn register_table_from_records(&self, table_name: &str, records: &[Value]) -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        for (i, record) in records.iter().enumerate() {
            if !record.is_object() {
                return Err(ExtractorError::Provider(format!(
                    "record {} is not a JSON object",
                    i
                )));
            }
            serde_json::to_writer(&mut tmp, record)?;
            tmp.write_all(b"\n")?;
        }
        tmp.flush()?;
        self.register_table_from_ndjson(table_name, tmp.path())
    }

    /// Create a DuckDB table from a newline-delimited JSON file.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &Path) -> Result<()> {
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {name}; \
             CREATE TABLE {name} AS SELECT * FROM read_json_auto('{path}', format='newline_delimited')",
            name = quote_ident(table_name),
            path = sql_path(ndjson_path)
        ))?;
        Ok(())
    }

    /// Create a DuckDB table from a CSV file with a header row.
    ///
    /// Type sniffing is limited to booleans, integers and doubles; anything
    /// else (dates, timestamps, JSON text) stays VARCHAR exactly as written.
    pub fn register_table_from_csv(&self, table_name: &str, csv_path: &Path) -> Result<()> {
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {name}; \
             CREATE TABLE {name} AS SELECT * FROM read_csv_auto('{path}', header=true, \
             auto_type_candidates=['BOOLEAN', 'BIGINT', 'DOUBLE', 'VARCHAR'])",
            name = quote_ident(table_name),
            path = sql_path(csv_path)
        ))?;
        Ok(())
    }

    /// Write a table as CSV with a header row and no index column.
    ///
    /// Cells are written as [`Connection::read_table`] would return them.
    pub fn export_csv(&self, table_name: &str, dest: &Path) -> Result<()> {
        let (_, select_list) = self.scalar_projection(table_name)?;
        if select_list.is_empty() {
            return Err(ExtractorError::InvalidArgument(format!(
                "table {} has no columns",
                table_name
            )));
        }
        self.conn.execute_batch(&format!(
            "COPY (SELECT {} FROM {}) TO '{}' (FORMAT CSV, HEADER)",
            select_list.join(", "),
            quote_ident(table_name),
            sql_path(dest)
        ))?;
        Ok(())
    }

    /// Return the `(column_name, column_type)` pairs of a table, in order.
    pub fn describe(&self, table_name: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT column_name, column_type FROM (DESCRIBE SELECT * FROM {})",
            quote_ident(table_name)
        ))?;

        let mut rows = stmt.query([])?;
        let mut schema = Vec::new();
        while let Some(row) = rows.next()? {
            let col_name: String = row.get(0)?;
            let col_type: String = row.get(1)?;
            schema.push((col_name, col_type));
        }
        Ok(schema)
    }

    /// Column names and a select list that turns every column into a scalar.
    ///
    /// DECIMAL becomes DOUBLE, nested values (STRUCT, LIST, MAP) become JSON
    /// text, and everything else non-scalar becomes its VARCHAR rendering.
    fn scalar_projection(&self, table_name: &str) -> Result<(Vec<String>, Vec<String>)> {
        let schema = self.describe(table_name)?;
        let passthrough = passthrough_types();

        let select_list: Vec<String> = schema
            .iter()
            .map(|(col, dtype)| {
                let ident = quote_ident(col);
                if passthrough.contains(dtype.as_str()) {
                    ident
                } else if dtype.starts_with("DECIMAL") {
                    format!("CAST({} AS DOUBLE) AS {}", ident, ident)
                } else if is_nested_type(dtype) {
                    format!("CAST(to_json({}) AS VARCHAR) AS {}", ident, ident)
                } else {
                    format!("CAST({} AS VARCHAR) AS {}", ident, ident)
                }
            })
            .collect();
        let columns: Vec<String> = schema.into_iter().map(|(col, _)| col).collect();
        Ok((columns, select_list))
    }

    /// Read a whole table into memory, converted by `scalar_projection`.
    pub fn read_table(&self, table_name: &str) -> Result<Table> {
        let (columns, select_list) = self.scalar_projection(table_name)?;

        if columns.is_empty() {
            return Ok(Table::default());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {}",
            select_list.join(", "),
            quote_ident(table_name)
        ))?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                cells.push(convert_value_ref(row.get_ref(i)?));
            }
            out.push(cells);
        }

        Ok(Table::new(columns, out))
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(&self, sql: &str) -> Result<Option<Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table_name: &str) -> Result<usize> {
        let count = self
            .execute_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table_name)))?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        Ok(count as usize)
    }
}

/// Render a path as a single-quoted SQL string body (forward slashes,
/// quotes doubled).
fn sql_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace('\'', "''")
}

fn is_nested_type(dtype: &str) -> bool {
    dtype.starts_with("STRUCT")
        || dtype.starts_with("MAP")
        || dtype.starts_with("UNION")
        || dtype.ends_with(']')
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> Value {
    match val {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Number(n.into()),
        ValueRef::SmallInt(n) => Value::Number(n.into()),
        ValueRef::Int(n) => Value::Number(n.into()),
        ValueRef::BigInt(n) => Value::Number(n.into()),
        ValueRef::UTinyInt(n) => Value::Number(n.into()),
        ValueRef::USmallInt(n) => Value::Number(n.into()),
        ValueRef::UInt(n) => Value::Number(n.into()),
        ValueRef::UBigInt(n) => Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; fall back to its decimal text
            if let Ok(i) = i64::try_from(n) {
                Value::Number(i.into())
            } else {
                Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => Value::Null,
    }
}
