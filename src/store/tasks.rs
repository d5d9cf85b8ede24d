use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, TaskError};
use crate::model::{Cost, DUE_DATE_FORMAT, Task, TaskInput, TaskListing};

/// Order value a task is parked at while it trades places with a neighbor.
/// Creation hands out orders starting at 1, so no live task ever holds it.
pub const SENTINEL_ORDER: i64 = 0;

const TASK_COLUMNS: &str = "id, name, cost_cents, due_date, display_order";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Result of a move-up/move-down request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The task traded orders with its neighbor; both records are post-swap.
    Swapped { task: Task, neighbor: Task },
    /// The task was already first (up) or last (down).
    Unchanged { task: Task },
}

impl MoveOutcome {
    pub fn task(&self) -> &Task {
        match self {
            Self::Swapped { task, .. } | Self::Unchanged { task } => task,
        }
    }

    pub fn moved(&self) -> bool {
        matches!(self, Self::Swapped { .. })
    }
}

/// SQLite-backed task table that keeps `display_order` unique and total.
pub struct TaskStore {
    conn: Connection,
}

impl TaskStore {
    /// Open (or create) the task database at the given file path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA busy_timeout=5000;",
        )?;
        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                cost_cents INTEGER NOT NULL CHECK (cost_cents >= 0),
                due_date TEXT NOT NULL,
                display_order INTEGER NOT NULL UNIQUE
            );",
        )?;
        Ok(())
    }

    /// Expose the raw connection (for tests or advanced usage).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn get(&self, id: i64) -> Result<Task> {
        fetch_task(&self.conn, id)
    }

    /// All tasks, top to bottom, plus their total cost.
    pub fn list(&self) -> Result<TaskListing> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY display_order"
        ))?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(TaskListing::new(tasks))
    }

    /// Append a new task at the bottom of the list.
    pub fn create(&self, input: &TaskInput) -> Result<Task> {
        let tx = self.conn.unchecked_transaction()?;

        if name_taken(&tx, &input.name, None)? {
            return Err(TaskError::DuplicateName(input.name.clone()));
        }

        // Max + 1 even when deletions left gaps; only uniqueness matters.
        let next_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(display_order), 0) + 1 FROM tasks",
            [],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO tasks (name, cost_cents, due_date, display_order)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                input.name,
                input.cost.cents()?,
                input.due_date.format(DUE_DATE_FORMAT).to_string(),
                next_order,
            ],
        )
        .map_err(|e| name_conflict(e, &input.name))?;
        let task = fetch_task(&tx, tx.last_insert_rowid())?;

        tx.commit()?;
        debug!(id = task.id, order = task.display_order, "created task");
        Ok(task)
    }

    /// Overwrite name, cost and due date. The display order is left alone.
    pub fn update(&self, id: i64, input: &TaskInput) -> Result<Task> {
        let tx = self.conn.unchecked_transaction()?;

        fetch_task(&tx, id)?;
        if name_taken(&tx, &input.name, Some(id))? {
            return Err(TaskError::DuplicateName(input.name.clone()));
        }

        tx.execute(
            "UPDATE tasks SET name = ?2, cost_cents = ?3, due_date = ?4 WHERE id = ?1",
            params![
                id,
                input.name,
                input.cost.cents()?,
                input.due_date.format(DUE_DATE_FORMAT).to_string(),
            ],
        )
        .map_err(|e| name_conflict(e, &input.name))?;
        let task = fetch_task(&tx, id)?;

        tx.commit()?;
        debug!(id, "updated task");
        Ok(task)
    }

    /// Remove a task and return it. Survivors keep their orders.
    ///
    /// Runs in a transaction: a storage failure rolls back and surfaces as
    /// `TaskError::Db` with the table untouched.
    pub fn delete(&self, id: i64) -> Result<Task> {
        let tx = self.conn.unchecked_transaction()?;
        let task = fetch_task(&tx, id)?;

        let deleted = tx
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .and_then(|_| tx.commit());
        if let Err(e) = deleted {
            warn!(id, error = %e, "delete failed, rolled back");
            return Err(e.into());
        }

        debug!(id, "deleted task");
        Ok(task)
    }

    pub fn move_up(&self, id: i64) -> Result<MoveOutcome> {
        self.move_task(id, Direction::Up)
    }

    pub fn move_down(&self, id: i64) -> Result<MoveOutcome> {
        self.move_task(id, Direction::Down)
    }

    /// Swap a task's order with its neighbor in `direction`.
    ///
    /// Both orders are unique, so the exchange goes through the sentinel:
    /// park the task at `SENTINEL_ORDER`, give the neighbor the task's old
    /// order, then give the task the neighbor's old order. The three writes
    /// share one transaction, so readers never see the parked state and a
    /// failure part way leaves both orders as they were.
    pub fn move_task(&self, id: i64, direction: Direction) -> Result<MoveOutcome> {
        let tx = self.conn.unchecked_transaction()?;
        let task = fetch_task(&tx, id)?;

        let neighbor_sql = match direction {
            Direction::Up => format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE display_order < ?1
                 ORDER BY display_order DESC LIMIT 1"
            ),
            Direction::Down => format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE display_order > ?1
                 ORDER BY display_order ASC LIMIT 1"
            ),
        };
        let neighbor = tx
            .query_row(&neighbor_sql, params![task.display_order], task_from_row)
            .optional()?;

        let Some(neighbor) = neighbor else {
            debug!(id, %direction, "task already at boundary");
            return Ok(MoveOutcome::Unchanged { task });
        };

        let (order_task, order_neighbor) = (task.display_order, neighbor.display_order);
        set_order(&tx, task.id, SENTINEL_ORDER)?;
        set_order(&tx, neighbor.id, order_task)?;
        set_order(&tx, task.id, order_neighbor)?;
        tx.commit()?;

        debug!(
            id,
            neighbor = neighbor.id,
            %direction,
            from = order_task,
            to = order_neighbor,
            "swapped display order"
        );
        Ok(MoveOutcome::Swapped {
            task: Task {
                display_order: order_neighbor,
                ..task
            },
            neighbor: Task {
                display_order: order_task,
                ..neighbor
            },
        })
    }
}

fn fetch_task(conn: &Connection, id: i64) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        task_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TaskError::TaskNotFound(id),
        other => TaskError::Db(other),
    })
}

fn name_taken(conn: &Connection, name: &str, excluding: Option<i64>) -> Result<bool> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE name = ?1 AND (?2 IS NULL OR id != ?2))",
        params![name, excluding],
        |row| row.get(0),
    )?;
    Ok(taken)
}

fn set_order(conn: &Connection, id: i64, order: i64) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET display_order = ?2 WHERE id = ?1",
        params![id, order],
    )?;
    Ok(())
}

/// Report a UNIQUE hit on `tasks.name` as a duplicate rather than a storage failure.
fn name_conflict(err: rusqlite::Error, name: &str) -> TaskError {
    match &err {
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == ErrorCode::ConstraintViolation && msg.contains("tasks.name") =>
        {
            TaskError::DuplicateName(name.to_string())
        }
        _ => TaskError::Db(err),
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let cents: i64 = row.get(2)?;
    let cost = Cost::from_cents(cents).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(2, cents))?;
    let raw_date: String = row.get(3)?;
    let due_date = NaiveDate::parse_from_str(&raw_date, DUE_DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        cost,
        due_date,
        display_order: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(name: &str, cost: &str) -> TaskInput {
        TaskInput::new(name, cost.parse().unwrap(), date(2024, 1, 1)).unwrap()
    }

    fn seeded(names: &[&str]) -> (TaskStore, Vec<Task>) {
        let store = TaskStore::open_memory().unwrap();
        let tasks = names
            .iter()
            .map(|n| store.create(&input(n, "1.00")).unwrap())
            .collect();
        (store, tasks)
    }

    fn names(store: &TaskStore) -> Vec<String> {
        store
            .list()
            .unwrap()
            .tasks
            .into_iter()
            .map(|t| t.name)
            .collect()
    }

    fn orders(store: &TaskStore) -> Vec<(String, i64)> {
        store
            .list()
            .unwrap()
            .tasks
            .into_iter()
            .map(|t| (t.name, t.display_order))
            .collect()
    }

    fn assert_unique(store: &TaskStore) {
        let tasks = store.list().unwrap().tasks;
        let names: HashSet<_> = tasks.iter().map(|t| t.name.clone()).collect();
        let orders: HashSet<_> = tasks.iter().map(|t| t.display_order).collect();
        assert_eq!(names.len(), tasks.len(), "duplicate name in {tasks:?}");
        assert_eq!(orders.len(), tasks.len(), "duplicate order in {tasks:?}");
        assert!(
            tasks.iter().all(|t| t.display_order != SENTINEL_ORDER),
            "task left at sentinel: {tasks:?}"
        );
    }

    #[test]
    fn create_and_list_totals_costs() {
        let store = TaskStore::open_memory().unwrap();
        store
            .create(&TaskInput::parse("Task1", "10.00", "2024-01-01").unwrap())
            .unwrap();
        store
            .create(&TaskInput::parse("Task2", "20.00", "2024-01-02").unwrap())
            .unwrap();

        let listing = store.list().unwrap();
        assert_eq!(names(&store), vec!["Task1", "Task2"]);
        assert_eq!(listing.total.to_string(), "30.00");
        assert_eq!(listing.tasks[1].due_date, date(2024, 1, 2));
    }

    #[test]
    fn create_appends_with_increasing_orders() {
        let (store, tasks) = seeded(&["a", "b", "c", "d"]);
        let created: Vec<i64> = tasks.iter().map(|t| t.display_order).collect();
        assert_eq!(created, vec![1, 2, 3, 4]);
        assert_eq!(names(&store), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let store = TaskStore::open_memory().unwrap();
        store.create(&input("X", "5.00")).unwrap();

        let err = store.create(&input("X", "5.00")).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateName(ref n) if n == "X"));
        assert_eq!(names(&store), vec!["X"]);
    }

    #[test]
    fn names_compare_case_sensitively() {
        let store = TaskStore::open_memory().unwrap();
        store.create(&input("Task", "1.00")).unwrap();
        store.create(&input("task", "1.00")).unwrap();
        assert_eq!(store.list().unwrap().tasks.len(), 2);
    }

    #[test]
    fn unique_constraint_hit_maps_to_duplicate_name() {
        let store = TaskStore::open_memory().unwrap();
        store.create(&input("X", "1.00")).unwrap();
        let err = store
            .conn()
            .execute(
                "INSERT INTO tasks (name, cost_cents, due_date, display_order)
                 VALUES ('X', 0, '2024-01-01', 99)",
                [],
            )
            .unwrap_err();
        assert!(matches!(name_conflict(err, "X"), TaskError::DuplicateName(_)));
    }

    #[test]
    fn next_order_follows_max_after_gaps() {
        let (store, tasks) = seeded(&["a", "b", "c"]);
        store.delete(tasks[1].id).unwrap();
        let d = store.create(&input("d", "1.00")).unwrap();
        assert_eq!(d.display_order, 4);

        store.delete(d.id).unwrap();
        store.delete(tasks[2].id).unwrap();
        let e = store.create(&input("e", "1.00")).unwrap();
        assert_eq!(e.display_order, 2);
    }

    #[test]
    fn ids_are_never_reused() {
        let (store, tasks) = seeded(&["a", "b"]);
        store.delete(tasks[1].id).unwrap();
        let c = store.create(&input("c", "1.00")).unwrap();
        assert!(c.id > tasks[1].id);
    }

    #[test]
    fn update_overwrites_fields_but_not_order() {
        let (store, tasks) = seeded(&["a", "b"]);
        let edited = store
            .update(
                tasks[0].id,
                &TaskInput::parse("renamed", "42.10", "2025-12-31").unwrap(),
            )
            .unwrap();
        assert_eq!(edited.name, "renamed");
        assert_eq!(edited.cost.to_string(), "42.10");
        assert_eq!(edited.due_date, date(2025, 12, 31));
        assert_eq!(edited.display_order, tasks[0].display_order);
        assert_eq!(store.get(tasks[0].id).unwrap(), edited);
    }

    #[test]
    fn update_may_keep_its_own_name() {
        let (store, tasks) = seeded(&["a"]);
        let edited = store.update(tasks[0].id, &input("a", "9.99")).unwrap();
        assert_eq!(edited.cost.to_string(), "9.99");
    }

    #[test]
    fn update_rejects_name_of_another_task() {
        let (store, tasks) = seeded(&["a", "b"]);
        let err = store.update(tasks[1].id, &input("a", "1.00")).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateName(_)));
        assert_eq!(store.get(tasks[1].id).unwrap().name, "b");
    }

    #[test]
    fn update_missing_task_is_not_found() {
        let store = TaskStore::open_memory().unwrap();
        let err = store.update(9, &input("a", "1.00")).unwrap_err();
        assert!(matches!(err, TaskError::TaskNotFound(9)));
    }

    #[test]
    fn delete_keeps_survivor_orders() {
        let (store, tasks) = seeded(&["a", "b", "c", "d"]);
        let removed = store.delete(tasks[1].id).unwrap();
        assert_eq!(removed.name, "b");
        assert_eq!(
            orders(&store),
            vec![("a".into(), 1), ("c".into(), 3), ("d".into(), 4)]
        );
    }

    #[test]
    fn delete_missing_task_is_not_found() {
        let (store, _) = seeded(&["a"]);
        let err = store.delete(77).unwrap_err();
        assert!(matches!(err, TaskError::TaskNotFound(77)));
        assert_eq!(names(&store), vec!["a"]);
    }

    #[test]
    fn failed_delete_rolls_back() {
        let (store, tasks) = seeded(&["a", "b"]);
        store
            .conn()
            .execute_batch(
                "CREATE TRIGGER refuse_delete BEFORE DELETE ON tasks
                 BEGIN SELECT RAISE(ABORT, 'disk on fire'); END;",
            )
            .unwrap();

        let err = store.delete(tasks[0].id).unwrap_err();
        assert!(matches!(err, TaskError::Db(_)));
        assert_eq!(err.code(), "storage_failure");
        assert_eq!(names(&store), vec!["a", "b"]);
    }

    #[test]
    fn move_up_swaps_with_upward_neighbor() {
        let (store, tasks) = seeded(&["A", "B", "C"]);
        let outcome = store.move_up(tasks[1].id).unwrap();

        assert!(outcome.moved());
        assert_eq!(
            orders(&store),
            vec![("B".into(), 1), ("A".into(), 2), ("C".into(), 3)]
        );
        match outcome {
            MoveOutcome::Swapped { task, neighbor } => {
                assert_eq!((task.name.as_str(), task.display_order), ("B", 1));
                assert_eq!((neighbor.name.as_str(), neighbor.display_order), ("A", 2));
            }
            other => panic!("expected swap, got {other:?}"),
        }
    }

    #[test]
    fn move_down_swaps_with_downward_neighbor() {
        let (store, tasks) = seeded(&["A", "B", "C"]);
        store.move_down(tasks[0].id).unwrap();
        assert_eq!(names(&store), vec!["B", "A", "C"]);
    }

    #[test]
    fn moves_skip_over_gaps() {
        let (store, tasks) = seeded(&["A", "B", "C", "D"]);
        store.delete(tasks[1].id).unwrap();
        store.delete(tasks[2].id).unwrap();

        store.move_up(tasks[3].id).unwrap();
        assert_eq!(orders(&store), vec![("D".into(), 1), ("A".into(), 4)]);
    }

    #[test]
    fn moves_at_boundaries_are_noops() {
        let (store, tasks) = seeded(&["A", "B", "C"]);
        let before = orders(&store);

        let up = store.move_up(tasks[0].id).unwrap();
        let down = store.move_down(tasks[2].id).unwrap();

        assert!(!up.moved());
        assert!(!down.moved());
        assert_eq!(up.task().name, "A");
        assert_eq!(orders(&store), before);
    }

    #[test]
    fn single_task_cannot_move() {
        let (store, tasks) = seeded(&["only"]);
        assert!(!store.move_up(tasks[0].id).unwrap().moved());
        assert!(!store.move_down(tasks[0].id).unwrap().moved());
        assert_eq!(orders(&store), vec![("only".into(), 1)]);
    }

    #[test]
    fn move_round_trip_restores_order() {
        let (store, tasks) = seeded(&["A", "B", "C", "D"]);
        let before = orders(&store);

        store.move_up(tasks[2].id).unwrap();
        store.move_down(tasks[2].id).unwrap();
        assert_eq!(orders(&store), before);

        store.move_down(tasks[1].id).unwrap();
        store.move_up(tasks[1].id).unwrap();
        assert_eq!(orders(&store), before);
    }

    #[test]
    fn move_missing_task_is_not_found() {
        let store = TaskStore::open_memory().unwrap();
        assert!(matches!(
            store.move_up(3).unwrap_err(),
            TaskError::TaskNotFound(3)
        ));
        assert!(matches!(
            store.move_down(3).unwrap_err(),
            TaskError::TaskNotFound(3)
        ));
    }

    #[test]
    fn failed_swap_leaves_orders_untouched() {
        let (store, tasks) = seeded(&["A", "B", "C"]);
        // Let the task reach the sentinel, then fail the final write.
        store
            .conn()
            .execute_batch(
                "CREATE TRIGGER refuse_unpark BEFORE UPDATE OF display_order ON tasks
                 WHEN OLD.display_order = 0
                 BEGIN SELECT RAISE(ABORT, 'refusing to unpark'); END;",
            )
            .unwrap();

        let before = orders(&store);
        let err = store.move_up(tasks[2].id).unwrap_err();
        assert!(matches!(err, TaskError::Db(_)));
        assert_eq!(orders(&store), before);
        assert_unique(&store);
    }

    #[test]
    fn uniqueness_holds_across_mixed_operations() {
        let store = TaskStore::open_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(0x2545_f491_4f6c_dd1d);

        for step in 0..300 {
            let ids: Vec<i64> = store.list().unwrap().tasks.iter().map(|t| t.id).collect();
            let op = rng.gen_range(0..6);
            let name = format!("t{}", rng.gen_range(0..40));
            let result = match op {
                0 | 1 => store.create(&input(&name, "1.25")).map(|_| ()),
                _ if ids.is_empty() => Ok(()),
                _ => {
                    let id = ids[rng.gen_range(0..ids.len())];
                    match op {
                        2 => store.move_up(id).map(|_| ()),
                        3 => store.move_down(id).map(|_| ()),
                        4 => store.update(id, &input(&name, "2.50")).map(|_| ()),
                        _ => store.delete(id).map(|_| ()),
                    }
                }
            };
            if let Err(e) = result {
                assert!(
                    matches!(e, TaskError::DuplicateName(_)),
                    "step {step}: unexpected error {e:?}"
                );
            }
            assert_unique(&store);
        }
    }

    #[test]
    fn on_disk_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");
        {
            let store = TaskStore::open(&path).unwrap();
            store.create(&input("persisted", "3.50")).unwrap();
        }
        let store = TaskStore::open(&path).unwrap();
        let listing = store.list().unwrap();
        assert_eq!(listing.tasks[0].name, "persisted");
        assert_eq!(listing.total.to_string(), "3.50");
    }
}
