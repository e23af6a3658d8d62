use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::core::ident::UserId;
use crate::persistence::{CareerStore, StoreError, UserCareerRecord};

const CAREER_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS career_records (
  user_id INTEGER PRIMARY KEY,
  career_id TEXT NOT NULL,
  items_granted INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS career_applied_attributes (
  user_id INTEGER NOT NULL,
  attribute_id TEXT NOT NULL,
  PRIMARY KEY (user_id, attribute_id)
);
"#;

/// SQLite-backed career records, for hosts that keep user data in a database.
pub struct SqliteCareerStore {
    conn: Mutex<Connection>,
}

impl SqliteCareerStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CAREER_DB_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::InvalidData("career store lock poisoned".to_string()))
    }

    fn load_record(conn: &Connection, user: UserId) -> Result<Option<UserCareerRecord>, StoreError> {
        let row = conn
            .query_row(
                "SELECT career_id, items_granted FROM career_records WHERE user_id = ?1",
                params![user.0 as i64],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let Some((career_id, items_granted)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT attribute_id FROM career_applied_attributes WHERE user_id = ?1",
        )?;
        let applied = stmt
            .query_map(params![user.0 as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        let mut record = UserCareerRecord::default();
        record.assign(&career_id);
        if items_granted != 0 {
            record.mark_items_granted();
        }
        record.set_applied_attributes(applied);
        Ok(Some(record))
    }

    fn write_record(
        conn: &mut Connection,
        user: UserId,
        record: &UserCareerRecord,
    ) -> Result<(), StoreError> {
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO career_records (user_id, career_id, items_granted) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET career_id = excluded.career_id, items_granted = excluded.items_granted",
            params![
                user.0 as i64,
                record.assigned().unwrap_or(""),
                if record.items_granted() { 1 } else { 0 }
            ],
        )?;
        tx.execute(
            "DELETE FROM career_applied_attributes WHERE user_id = ?1",
            params![user.0 as i64],
        )?;
        for attribute_id in record.applied_attributes() {
            tx.execute(
                "INSERT INTO career_applied_attributes (user_id, attribute_id) VALUES (?1, ?2)",
                params![user.0 as i64, attribute_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl CareerStore for SqliteCareerStore {
    fn record(&self, user: UserId) -> Result<UserCareerRecord, StoreError> {
        let conn = self.conn()?;
        Ok(Self::load_record(&conn, user)?.unwrap_or_default())
    }

    fn save(&mut self, user: UserId, record: &UserCareerRecord) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        Self::write_record(&mut conn, user, record)
    }

    fn copy_record(&mut self, from: UserId, to: UserId) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let Some(record) = Self::load_record(&conn, from)? else {
            return Ok(());
        };
        Self::write_record(&mut conn, to, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> UserCareerRecord {
        let mut record = UserCareerRecord::default();
        record.assign("warrior");
        record.mark_items_granted();
        record.set_applied_attributes(
            ["minecraft:generic.armor", "minecraft:generic.attack_damage"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        record
    }

    #[test]
    fn saves_and_reloads_record() {
        let mut store = SqliteCareerStore::open_in_memory().unwrap();
        let record = sample_record();
        store.save(UserId(11), &record).unwrap();
        assert_eq!(store.record(UserId(11)).unwrap(), record);
        assert_eq!(store.record(UserId(12)).unwrap(), UserCareerRecord::default());
    }

    #[test]
    fn overwrite_replaces_applied_set() {
        let mut store = SqliteCareerStore::open_in_memory().unwrap();
        store.save(UserId(1), &sample_record()).unwrap();

        let mut next = sample_record();
        next.assign("mage");
        next.set_applied_attributes(["minecraft:generic.luck".to_string()].into_iter().collect());
        store.save(UserId(1), &next).unwrap();

        let loaded = store.record(UserId(1)).unwrap();
        assert_eq!(loaded.assigned(), Some("mage"));
        assert_eq!(loaded.applied_attributes().len(), 1);
        assert!(loaded.items_granted());
    }

    #[test]
    fn copies_record_between_users() {
        let mut store = SqliteCareerStore::open_in_memory().unwrap();
        store.save(UserId(1), &sample_record()).unwrap();
        store.copy_record(UserId(1), UserId(2)).unwrap();
        assert_eq!(store.record(UserId(2)).unwrap(), sample_record());

        store.copy_record(UserId(40), UserId(41)).unwrap();
        assert!(store.record(UserId(41)).unwrap().assigned().is_none());
    }
}
