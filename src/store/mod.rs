//! # Workout Store
//!
//! SQLite-backed storage for exercises, trackers, workouts and workout values.
//! Every query runs on tokio's blocking pool so callers on the async side never
//! stall while SQLite works.

mod schema;

use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::spawn_blocking;

use crate::error::{StoreError, StoreResult};
use crate::types::{Workout, WorkoutRow, WorkoutValue};

pub use schema::DDL;

/// Handle to the workout database. Cloning shares the same connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!("Opened workout store at {}", path.display());
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests and throwaway sessions.
    pub fn memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(DDL)?;
        debug!("Workout schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            op(&conn)
        })
        .await?
    }

    /// Insert an exercise. A duplicate name fails with [`StoreError::Constraint`].
    pub async fn insert_exercise(&self, name: &str) -> StoreResult<i64> {
        let name = name.to_string();
        self.run(move |conn| {
            conn.execute("INSERT INTO exercises (name) VALUES (?1)", params![name])?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn insert_tracker(&self, exercise_id: i64, name: &str) -> StoreResult<i64> {
        let name = name.to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO trackers (exercise_id, name) VALUES (?1, ?2)",
                params![exercise_id, name],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn insert_workout(&self, exercise_id: i64, date: NaiveDate) -> StoreResult<i64> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO workouts (exercise_id, date) VALUES (?1, ?2)",
                params![exercise_id, date],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn insert_workout_value(
        &self,
        workout_id: i64,
        name: &str,
        value: i64,
        group: i64,
    ) -> StoreResult<i64> {
        let name = name.to_string();
        self.run(move |conn| {
            conn.execute(
                r#"INSERT INTO workout_values (workout_id, name, value, "group")
                   VALUES (?1, ?2, ?3, ?4)"#,
                params![workout_id, name, value, group],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Workout/value rows of one exercise with `start <= date < end`.
    ///
    /// Rows come back ordered by date ascending, then workout id descending,
    /// then value id ascending. Series point order depends on this.
    pub async fn get_workouts_in_range(
        &self,
        exercise_name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<WorkoutRow>> {
        let exercise_name = exercise_name.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                r#"SELECT w.id, w.exercise_id, w.date,
                          wv.id, wv.name, wv.value, wv."group"
                   FROM workouts AS w
                   JOIN workout_values AS wv ON wv.workout_id = w.id
                   WHERE w.exercise_id = (SELECT id FROM exercises WHERE name = ?1 LIMIT 1)
                     AND w.date >= ?2 AND w.date < ?3
                   ORDER BY w.date ASC, w.id DESC, wv.id ASC"#,
            )?;
            let rows = stmt.query_map(params![exercise_name, start, end], |row| {
                let workout_id: i64 = row.get(0)?;
                Ok(WorkoutRow {
                    workout: Workout {
                        id: workout_id,
                        exercise_id: row.get(1)?,
                        date: row.get(2)?,
                    },
                    value: WorkoutValue {
                        id: row.get(3)?,
                        workout_id,
                        name: row.get(4)?,
                        value: row.get(5)?,
                        group: row.get(6)?,
                    },
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// Tracker names of an exercise, in creation order.
    pub async fn get_trackers_for_exercise(&self, exercise_id: i64) -> StoreResult<Vec<String>> {
        self.run(move |conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM trackers WHERE exercise_id = ?1 ORDER BY id")?;
            let names = stmt.query_map(params![exercise_id], |row| row.get(0))?;
            Ok(names.collect::<Result<Vec<String>, _>>()?)
        })
        .await
    }

    pub async fn get_all_exercise_names(&self) -> StoreResult<Vec<String>> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM exercises GROUP BY name ORDER BY MIN(id)")?;
            let names = stmt.query_map([], |row| row.get(0))?;
            Ok(names.collect::<Result<Vec<String>, _>>()?)
        })
        .await
    }

    /// `None` when no exercise has this name.
    pub async fn get_exercise_id_by_name(&self, name: &str) -> StoreResult<Option<i64>> {
        let name = name.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id FROM exercises WHERE name = ?1 LIMIT 1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?)
        })
        .await
    }

    /// `max(group) + 1`, or 1 for an empty table.
    pub async fn get_next_group_id(&self) -> StoreResult<i64> {
        self.run(|conn| {
            Ok(conn.query_row(
                r#"SELECT IFNULL(MAX("group"), 0) + 1 FROM workout_values"#,
                [],
                |row| row.get(0),
            )?)
        })
        .await
    }

    pub async fn get_workout_value_by_id(&self, id: i64) -> StoreResult<Option<WorkoutValue>> {
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    r#"SELECT id, workout_id, name, value, "group"
                       FROM workout_values WHERE id = ?1"#,
                    params![id],
                    |row| {
                        Ok(WorkoutValue {
                            id: row.get(0)?,
                            workout_id: row.get(1)?,
                            name: row.get(2)?,
                            value: row.get(3)?,
                            group: row.get(4)?,
                        })
                    },
                )
                .optional()?)
        })
        .await
    }

    /// Returns the number of rows changed (0 for an unknown id).
    pub async fn update_workout_value(&self, id: i64, new_value: i64) -> StoreResult<usize> {
        self.run(move |conn| {
            Ok(conn.execute(
                "UPDATE workout_values SET value = ?1 WHERE id = ?2",
                params![new_value, id],
            )?)
        })
        .await
    }

    /// Delete a workout and, through the cascade, its values.
    pub async fn delete_workout(&self, id: i64) -> StoreResult<usize> {
        self.run(move |conn| Ok(conn.execute("DELETE FROM workouts WHERE id = ?1", params![id])?))
            .await
    }

    /// Delete an exercise together with its trackers, workouts and values.
    pub async fn delete_exercise(&self, name: &str) -> StoreResult<usize> {
        let name = name.to_string();
        self.run(move |conn| {
            Ok(conn.execute("DELETE FROM exercises WHERE name = ?1", params![name])?)
        })
        .await
    }

    pub async fn clear_all_data(&self) -> StoreResult<()> {
        self.run(|conn| {
            conn.execute_batch(
                "BEGIN;
                 DELETE FROM workout_values;
                 DELETE FROM workouts;
                 DELETE FROM trackers;
                 DELETE FROM exercises;
                 COMMIT;",
            )?;
            Ok(())
        })
        .await
    }
}
