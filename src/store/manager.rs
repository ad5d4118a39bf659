use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::models::wire::{format_timestamp, parse_timestamp};
use crate::models::Timestamp;

use super::entity::{Entity, Filters};
use super::{schema, DeleteOutcome, StoreError, UpsertOutcome};

/// Owns the SQLite connection behind every entity table.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct DbManager {
    conn: Arc<Mutex<Connection>>,
}

impl DbManager {
    /// Open (or create) the database file at `path`, creating parent
    /// directories as needed. Tables are not created until
    /// [`create_db_and_tables`](Self::create_db_and_tables) runs.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        info!(db = %path.display(), "opened entity store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create all tables. Safe to call on an existing database.
    pub fn create_db_and_tables(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        schema::run_migrations(&conn)
    }

    /// Insert `entity`, or overwrite the row with the same id.
    ///
    /// Returns the stored record (with its id and timestamps filled in) and
    /// whether it was added or updated. An update keeps the original
    /// `created_at` and stamps `updated_at` with the current time.
    pub fn upsert<E: Entity>(&self, entity: &E) -> Result<(E, UpsertOutcome), StoreError> {
        let conn = self.conn.lock();
        let now = Utc::now();
        let mut record = entity.clone();

        let existing: Option<String> = match record.id() {
            Some(id) => conn
                .query_row(
                    &format!("SELECT created_at FROM {} WHERE id = ?1", E::TABLE),
                    [id],
                    |row| row.get(0),
                )
                .optional()?,
            None => None,
        };

        match (record.id(), existing) {
            (Some(id), Some(created_raw)) => {
                let created_at = parse_stored::<E>(&created_raw)?;
                record.set_timestamps(created_at, now);
                let data = serde_json::to_string(&record)?;
                conn.execute(
                    &format!(
                        "UPDATE {} SET user_id = ?1, session_id = ?2, workflow_id = ?3,
                         updated_at = ?4, data = ?5 WHERE id = ?6",
                        E::TABLE
                    ),
                    params![
                        record.user_id(),
                        record.session_id(),
                        record.workflow_id(),
                        format_timestamp(&now),
                        data,
                        id
                    ],
                )?;
                debug!(table = E::TABLE, id, "updated row");
                Ok((record, UpsertOutcome::Updated))
            }
            (requested_id, _) => {
                let created_at = record.created_at().unwrap_or(now);
                record.set_timestamps(created_at, now);
                let data = serde_json::to_string(&record)?;
                conn.execute(
                    &format!(
                        "INSERT INTO {} (id, user_id, session_id, workflow_id, created_at, updated_at, data)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        E::TABLE
                    ),
                    params![
                        requested_id,
                        record.user_id(),
                        record.session_id(),
                        record.workflow_id(),
                        format_timestamp(&created_at),
                        format_timestamp(&now),
                        data
                    ],
                )?;
                let id = conn.last_insert_rowid();
                record.set_id(id);
                debug!(table = E::TABLE, id, "inserted row");
                Ok((record, UpsertOutcome::Added))
            }
        }
    }

    /// All rows of `E` matching `filters`, ordered by id.
    pub fn get<E: Entity>(&self, filters: &Filters) -> Result<Vec<E>, StoreError> {
        let (clause, values) = filters.where_clause();
        let sql = format!(
            "SELECT id, created_at, updated_at, data FROM {} {} ORDER BY id",
            E::TABLE,
            clause
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, created_raw, updated_raw, data) = row?;
            let mut record: E = serde_json::from_str(&data)?;
            record.set_id(id);
            record.set_timestamps(
                parse_stored::<E>(&created_raw)?,
                parse_stored::<E>(&updated_raw)?,
            );
            records.push(record);
        }
        Ok(records)
    }

    /// Fetch a single row by id.
    pub fn get_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, StoreError> {
        Ok(self
            .get::<E>(&Filters::default().with_id(id))?
            .into_iter()
            .next())
    }

    /// Delete every row of `E` matching `filters`. Empty filters are
    /// rejected rather than clearing the table.
    pub fn delete<E: Entity>(&self, filters: &Filters) -> Result<DeleteOutcome, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::UnfilteredDelete { table: E::TABLE });
        }
        let (clause, values) = filters.where_clause();
        let sql = format!("DELETE FROM {} {}", E::TABLE, clause);

        let conn = self.conn.lock();
        let removed = conn.execute(&sql, params_from_iter(values.iter()))?;

        if removed == 0 {
            info!(table = E::TABLE, "Row with filters {} not found", filters);
            Ok(DeleteOutcome::NotFound)
        } else {
            debug!(table = E::TABLE, removed, "deleted rows");
            Ok(DeleteOutcome::Deleted(removed))
        }
    }
}

fn parse_stored<E: Entity>(raw: &str) -> Result<Timestamp, StoreError> {
    parse_timestamp(raw).ok_or_else(|| StoreError::Timestamp {
        table: E::TABLE,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatSession, Message, Skill};
    use chrono::Duration;

    fn store() -> DbManager {
        let db = DbManager::open_in_memory().unwrap();
        db.create_db_and_tables().unwrap();
        db
    }

    fn skill(user: &str, name: &str) -> Skill {
        let mut skill = Skill::new(name, format!("def {name}(): pass"));
        skill.user_id = Some(user.to_string());
        skill
    }

    #[test]
    fn insert_assigns_id_and_timestamps() {
        let db = store();
        let (saved, outcome) = db.upsert(&skill("alice", "fetch")).unwrap();

        assert_eq!(outcome, UpsertOutcome::Added);
        assert_eq!(saved.id, Some(1));
        assert!(saved.created_at.is_some());
        assert_eq!(saved.created_at, saved.updated_at);
    }

    #[test]
    fn update_keeps_created_at() {
        let db = store();
        let mut original = skill("alice", "fetch");
        original.created_at = Some(Utc::now() - Duration::days(3));
        let (saved, _) = db.upsert(&original).unwrap();

        let mut edited = saved.clone();
        edited.content = "def fetch(): return 1".into();
        let (updated, outcome) = db.upsert(&edited).unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(updated.id, saved.id);

        let stored: Skill = db.get_by_id(saved.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.content, "def fetch(): return 1");
        assert_eq!(
            stored.created_at.map(|t| t.timestamp()),
            saved.created_at.map(|t| t.timestamp())
        );
        assert!(stored.updated_at.unwrap() > stored.created_at.unwrap());
    }

    #[test]
    fn unknown_id_is_inserted_with_that_id() {
        let db = store();
        let mut record = skill("alice", "fetch");
        record.id = Some(42);

        let (saved, outcome) = db.upsert(&record).unwrap();

        assert_eq!(outcome, UpsertOutcome::Added);
        assert_eq!(saved.id, Some(42));
        assert!(db.get_by_id::<Skill>(42).unwrap().is_some());
    }

    #[test]
    fn get_filters_by_user() {
        let db = store();
        db.upsert(&skill("alice", "a")).unwrap();
        db.upsert(&skill("bob", "b")).unwrap();
        db.upsert(&skill("alice", "c")).unwrap();

        let names: Vec<String> = db
            .get::<Skill>(&Filters::user("alice"))
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(db.get::<Skill>(&Filters::default()).unwrap().len(), 3);
    }

    #[test]
    fn messages_filter_by_session() {
        let db = store();
        let (session, _) = db
            .upsert(&ChatSession {
                user_id: "alice".into(),
                name: "demo".into(),
                ..ChatSession::default()
            })
            .unwrap();

        let mut first = Message::new("alice", "user", "hello");
        first.session_id = session.id;
        db.upsert(&first).unwrap();
        db.upsert(&Message::new("alice", "user", "elsewhere")).unwrap();

        let in_session = db
            .get::<Message>(&Filters::user("alice").with_session(session.id.unwrap()))
            .unwrap();
        assert_eq!(in_session.len(), 1);
        assert_eq!(in_session[0].content, "hello");
    }

    #[test]
    fn delete_reports_missing_rows() {
        let db = store();
        let (saved, _) = db.upsert(&skill("alice", "a")).unwrap();

        let wrong_owner = Filters::user("bob").with_id(saved.id.unwrap());
        assert_eq!(db.delete::<Skill>(&wrong_owner).unwrap(), DeleteOutcome::NotFound);

        let owner = Filters::user("alice").with_id(saved.id.unwrap());
        assert_eq!(db.delete::<Skill>(&owner).unwrap(), DeleteOutcome::Deleted(1));
        assert!(db.get::<Skill>(&Filters::user("alice")).unwrap().is_empty());
    }

    #[test]
    fn delete_requires_a_filter() {
        let db = store();
        db.upsert(&skill("alice", "a")).unwrap();

        let err = db.delete::<Skill>(&Filters::default()).unwrap_err();
        assert!(matches!(err, StoreError::UnfilteredDelete { table: "skills" }));
        assert_eq!(db.get::<Skill>(&Filters::default()).unwrap().len(), 1);
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("database.sqlite");

        {
            let db = DbManager::open(&path).unwrap();
            db.create_db_and_tables().unwrap();
            db.upsert(&skill("alice", "persisted")).unwrap();
        }

        let db = DbManager::open(&path).unwrap();
        db.create_db_and_tables().unwrap();
        let skills = db.get::<Skill>(&Filters::user("alice")).unwrap();
        assert_eq!(skills[0].name, "persisted");
    }
}
