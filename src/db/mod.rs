// Database module - SQLite connection and models

pub mod models;

use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::Result;
use crate::utils::canonical_amount;
pub use models::{
    Direction, ImportBatch, Transaction, TransactionDetail, TransactionDetailType,
};

/// Get the default database path (~/.bankfeed/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let bankfeed_dir = PathBuf::from(home).join(".bankfeed");

    std::fs::create_dir_all(&bankfeed_dir).context("Failed to create .bankfeed directory")?;

    Ok(bankfeed_dir.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    Ok(conn)
}

/// In-memory database with the schema applied (dry runs without a database file)
pub fn open_memory_db() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Initialize the database with schema
///
/// Creates the database file if needed and runs the schema SQL. Safe to call
/// on an existing database.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;
    init_schema(&conn)?;

    info!("Database initialized successfully");
    Ok(())
}

/// Run the schema SQL on an already open connection
pub fn init_schema(conn: &Connection) -> Result<()> {
    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;
    Ok(())
}

// ============ Detail types ============

/// Look up a detail type id by its (unique) label
pub fn find_detail_type_id(conn: &Connection, label: &str) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM transaction_detail_types WHERE label = ?1")?;
    let id = stmt.query_row([label], |row| row.get(0)).optional()?;
    Ok(id)
}

/// Label of a detail type id
pub fn find_detail_type_label(conn: &Connection, id: i64) -> Result<Option<String>> {
    let label = conn
        .query_row(
            "SELECT label FROM transaction_detail_types WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(label)
}

/// Insert a new detail type, returns its id
pub fn insert_detail_type(conn: &Connection, label: &str, description: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO transaction_detail_types (label, description) VALUES (?1, ?2)",
        params![label, description],
    )
    .context(format!("Failed to insert detail type '{}'", label))?;

    Ok(conn.last_insert_rowid())
}

/// Insert or get detail type, returns its id. New types use the label as description.
pub fn upsert_detail_type(conn: &Connection, label: &str) -> Result<i64> {
    if let Some(id) = find_detail_type_id(conn, label)? {
        return Ok(id);
    }

    let id = insert_detail_type(conn, label, label)?;
    debug!("Registered detail type '{}' with id {}", label, id);
    Ok(id)
}

/// All registered detail types, ordered by label
pub fn list_detail_types(conn: &Connection) -> Result<Vec<TransactionDetailType>> {
    let mut stmt = conn.prepare(
        "SELECT id, label, description FROM transaction_detail_types ORDER BY label",
    )?;

    let types = stmt
        .query_map([], |row| {
            Ok(TransactionDetailType {
                id: Some(row.get(0)?),
                label: row.get(1)?,
                description: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(types)
}

// ============ Transactions ============

/// Insert transaction, returns the new id
pub fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (booking_date, value_date, amount, direction, import_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tx.booking_date,
            tx.value_date,
            amount_to_sql(tx.amount),
            tx.direction.as_str(),
            tx.import_id,
            tx.created_at,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Insert one detail value for a transaction, returns the new id
pub fn insert_transaction_detail(
    conn: &Connection,
    transaction_id: i64,
    transaction_detail_type_id: i64,
    description: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO transaction_details (transaction_id, transaction_detail_type_id, description)
         VALUES (?1, ?2, ?3)",
        params![transaction_id, transaction_detail_type_id, description],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Ids of transactions whose amount, dates and direction all equal the given values
pub fn find_matching_transactions(
    conn: &Connection,
    amount: Decimal,
    booking_date: NaiveDate,
    value_date: NaiveDate,
    direction: Direction,
) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM transactions
         WHERE amount = ?1 AND booking_date = ?2 AND value_date = ?3 AND direction = ?4
         ORDER BY id",
    )?;

    let ids = stmt
        .query_map(
            params![
                amount_to_sql(amount),
                booking_date,
                value_date,
                direction.as_str()
            ],
            |row| row.get(0),
        )?
        .collect::<Result<Vec<i64>, _>>()?;

    Ok(ids)
}

/// All detail rows stored for a transaction
pub fn get_transaction_details(
    conn: &Connection,
    transaction_id: i64,
) -> Result<Vec<TransactionDetail>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, transaction_id, transaction_detail_type_id, description
         FROM transaction_details
         WHERE transaction_id = ?1
         ORDER BY id",
    )?;

    let details = stmt
        .query_map([transaction_id], |row| {
            Ok(TransactionDetail {
                id: Some(row.get(0)?),
                transaction_id: row.get(1)?,
                transaction_detail_type_id: row.get(2)?,
                description: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(details)
}

/// Get a single transaction by id
pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_date, value_date, amount, direction, import_id, created_at
         FROM transactions WHERE id = ?1",
    )?;

    let tx = stmt
        .query_row([id], |row| {
            let direction: String = row.get(4)?;
            Ok(Transaction {
                id: Some(row.get(0)?),
                booking_date: row.get(1)?,
                value_date: row.get(2)?,
                amount: get_decimal_value(row, 3)?,
                direction: direction.parse::<Direction>().map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        4,
                        "direction".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?,
                import_id: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(tx)
}

/// Number of stored transactions
pub fn count_transactions(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    Ok(count)
}

/// Number of transactions created by one import batch
pub fn count_transactions_for_import(conn: &Connection, import_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE import_id = ?1",
        [import_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============ Import batches ============

/// Open an import batch record, returns its id. Counts are filled in by
/// [`finish_import_batch`].
pub fn insert_import_batch(conn: &Connection, filename: &str, checksum: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO imports (filename, checksum, rows_read, rows_inserted, duplicates)
         VALUES (?1, ?2, 0, 0, 0)",
        params![filename, checksum],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Store the final counts of an import batch
pub fn finish_import_batch(
    conn: &Connection,
    id: i64,
    rows_read: usize,
    rows_inserted: usize,
    duplicates: usize,
) -> Result<()> {
    conn.execute(
        "UPDATE imports SET rows_read = ?1, rows_inserted = ?2, duplicates = ?3 WHERE id = ?4",
        params![rows_read as i64, rows_inserted as i64, duplicates as i64, id],
    )?;
    Ok(())
}

/// Get an import batch by id
pub fn get_import_batch(conn: &Connection, id: i64) -> Result<Option<ImportBatch>> {
    let batch = conn
        .query_row(
            "SELECT id, filename, checksum, rows_read, rows_inserted, duplicates, imported_at
             FROM imports WHERE id = ?1",
            [id],
            |row| {
                Ok(ImportBatch {
                    id: Some(row.get(0)?),
                    filename: row.get(1)?,
                    checksum: row.get(2)?,
                    rows_read: row.get(3)?,
                    rows_inserted: row.get(4)?,
                    duplicates: row.get(5)?,
                    imported_at: row.get(6)?,
                })
            },
        )
        .optional()?;

    Ok(batch)
}

// ============ Value helpers ============

/// Amounts are stored as canonical decimal text so equality in SQL is exact
fn amount_to_sql(amount: Decimal) -> String {
    canonical_amount(amount).to_string()
}

/// Helper to read Decimal from SQLite (handles both INTEGER, REAL and TEXT)
pub fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))?;
            Decimal::from_str(s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
            })
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => Decimal::try_from(f).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Real, Box::new(e))
        }),
        _ => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            rusqlite::types::Type::Null,
        )),
    }
}
