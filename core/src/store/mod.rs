//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Steps call store methods; they never execute SQL directly.

mod account;
mod customer;
mod job;
mod transaction;

pub use job::{JobStatus, StepExecution, StepStatus};

use crate::error::BatchResult;
use rusqlite::{
    params_from_iter,
    types::{Type, Value, ValueRef},
    Connection, Params, Row,
};
use rust_decimal::Decimal;
use std::str::FromStr;

pub struct BatchStore {
    conn: Connection,
}

impl BatchStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &str) -> BatchResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> BatchResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> BatchResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_batch_schema.sql"))?;
        Ok(())
    }

    // ── Generic contracts ──────────────────────────────────────

    /// Run `f` inside one store transaction. `Ok` commits, `Err` rolls back.
    pub fn with_transaction<T, F>(&self, f: F) -> BatchResult<T>
    where
        F: FnOnce(&BatchStore) -> BatchResult<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    /// Parametrized row-returning query.
    pub fn query_rows<T, P, F>(&self, sql: &str, params: P, map: F) -> BatchResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, map)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Execute one statement once per parameter set. Returns affected row
    /// counts in input order.
    pub fn execute_many(&self, sql: &str, param_sets: &[Vec<Value>]) -> BatchResult<Vec<usize>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut counts = Vec::with_capacity(param_sets.len());
        for set in param_sets {
            counts.push(stmt.execute(params_from_iter(set.iter()))?);
        }
        Ok(counts)
    }
}

// ── Column helpers ─────────────────────────────────────────────

/// Reads an exact decimal stored as TEXT. Numeric storage classes are
/// tolerated for rows written by other tools.
pub(crate) fn opt_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let conversion = |e: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e)
    };
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(Decimal::from(i))),
        ValueRef::Real(f) => Decimal::try_from(f)
            .map(Some)
            .map_err(|e| conversion(Box::new(e))),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| conversion(Box::new(e)))?;
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            Decimal::from_str(text)
                .map(Some)
                .map_err(|e| conversion(Box::new(e)))
        }
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".into(),
            Type::Blob,
        )),
    }
}

pub(crate) fn decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    opt_decimal(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "decimal".into(),
        Type::Null,
    ))
}

pub(crate) fn decimal_value(amount: Option<Decimal>) -> Value {
    match amount {
        Some(d) => Value::Text(d.to_string()),
        None => Value::Null,
    }
}
