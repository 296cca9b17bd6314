//! Detail-type registry
//!
//! Every non-schema statement column is stored as a `TransactionDetailType`
//! row keyed by its cleaned label. The registry caches label <-> id in both
//! directions so the inserter and the duplicate matcher never look the same
//! label up twice.

use rusqlite::Connection;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::db;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct DetailTypeRegistry {
    by_label: HashMap<String, i64>,
    by_id: HashMap<i64, String>,
}

impl DetailTypeRegistry {
    /// Resolve ids for all given columns, creating missing detail types
    pub fn sync<S: AsRef<str>>(conn: &Connection, columns: &[S]) -> Result<Self> {
        let mut registry = Self::default();
        let mut created = 0;

        for column in columns {
            let label = column.as_ref();
            if registry.by_label.contains_key(label) {
                continue;
            }
            let id = match db::find_detail_type_id(conn, label)? {
                Some(id) => id,
                None => {
                    created += 1;
                    db::insert_detail_type(conn, label, label)?
                }
            };
            registry.remember(label, id);
        }

        info!(
            "Detail types synced: {} known, {} newly created",
            registry.len() - created,
            created
        );
        Ok(registry)
    }

    /// Resolve ids for the columns that already exist, without writing.
    /// Columns never seen before are left out.
    pub fn lookup<S: AsRef<str>>(conn: &Connection, columns: &[S]) -> Result<Self> {
        let mut registry = Self::default();
        for column in columns {
            let label = column.as_ref();
            if let Some(id) = db::find_detail_type_id(conn, label)? {
                registry.remember(label, id);
            }
        }
        Ok(registry)
    }

    /// Id for a label, creating the detail type on first use
    pub fn get_or_create(&mut self, conn: &Connection, label: &str) -> Result<i64> {
        if let Some(id) = self.id_for(label) {
            return Ok(id);
        }
        let id = db::upsert_detail_type(conn, label)?;
        debug!("Detail type '{}' resolved lazily to id {}", label, id);
        self.remember(label, id);
        Ok(id)
    }

    pub fn id_for(&self, label: &str) -> Option<i64> {
        self.by_label.get(label).copied()
    }

    pub fn label_for(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    fn remember(&mut self, label: &str, id: i64) {
        self.by_label.insert(label.to_string(), id);
        self.by_id.insert(id, label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_sync_creates_and_reuses_types() {
        let conn = memory_db();
        let first = DetailTypeRegistry::sync(&conn, &["buchungstext", "verwendungszweck"]).unwrap();
        assert_eq!(first.len(), 2);

        let second =
            DetailTypeRegistry::sync(&conn, &["verwendungszweck", "buchungstext", "glaeubiger_id"])
                .unwrap();
        assert_eq!(second.id_for("buchungstext"), first.id_for("buchungstext"));
        assert_eq!(second.id_for("verwendungszweck"), first.id_for("verwendungszweck"));
        assert_eq!(db::list_detail_types(&conn).unwrap().len(), 3);
    }

    #[test]
    fn test_sync_ignores_repeated_columns() {
        let conn = memory_db();
        let registry = DetailTypeRegistry::sync(&conn, &["payee", "payee"]).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reverse_lookup() {
        let conn = memory_db();
        let registry = DetailTypeRegistry::sync(&conn, &["payee"]).unwrap();
        let id = registry.id_for("payee").unwrap();
        assert_eq!(registry.label_for(id), Some("payee"));
        assert_eq!(registry.label_for(id + 100), None);
    }

    #[test]
    fn test_get_or_create_is_lazy() {
        let conn = memory_db();
        let mut registry = DetailTypeRegistry::default();
        assert!(registry.is_empty());

        let id = registry.get_or_create(&conn, "mandatsreferenz").unwrap();
        assert_eq!(registry.get_or_create(&conn, "mandatsreferenz").unwrap(), id);
        assert_eq!(db::find_detail_type_id(&conn, "mandatsreferenz").unwrap(), Some(id));
    }

    #[test]
    fn test_lookup_does_not_write() {
        let conn = memory_db();
        db::upsert_detail_type(&conn, "payee").unwrap();

        let registry = DetailTypeRegistry::lookup(&conn, &["payee", "unknown"]).unwrap();
        assert!(registry.id_for("payee").is_some());
        assert!(registry.id_for("unknown").is_none());
        assert_eq!(db::list_detail_types(&conn).unwrap().len(), 1);
    }
}
