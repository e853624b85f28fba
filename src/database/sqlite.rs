use chrono::{Local, NaiveTime};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Row;
use tracing::{debug, info};

use crate::{
    error::Result,
    legacy::text::parse_legacy_text,
    timing::{schedule::BusinessHoursData, weekday::Weekday},
    ISO_FORMAT,
};

use super::store::Store;

pub struct SqliteDatabase {}

const STORE_COLUMNS: &str = "id, name, business_hours, legacy_hours, created_at, updated_at";

impl SqliteDatabase {
    /**
    Create the stores table if it does not exist yet.

    `business_hours` holds the structured JSON, `legacy_hours` the old free text. Either can
    be NULL on records created under an older schema.
    */
    pub fn create_tables(connection: &PooledConnection<SqliteConnectionManager>) -> Result<()> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS stores (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                business_hours TEXT,
                legacy_hours TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            (),
        )?;
        Ok(())
    }

    fn now() -> String {
        Local::now().naive_local().format(ISO_FORMAT).to_string()
    }

    /**
    Map one row to a `Store`.

    The stored hours always pass through `sanitize`; NULL gives the default schedule.
    */
    fn store_from_row(row: &Row) -> rusqlite::Result<Store> {
        let business_hours: Option<String> = row.get(2)?;
        let business_hours = match business_hours {
            Some(text) => BusinessHoursData::from_json_str(&text),
            None => BusinessHoursData::default(),
        };
        Ok(Store {
            id: row.get(0)?,
            name: row.get(1)?,
            business_hours,
            legacy_hours: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    /**
    Insert one store and return its id.

    Pass `None` for `business_hours` to store a legacy-only record.
    */
    pub fn insert_store(
        connection: &PooledConnection<SqliteConnectionManager>,
        name: &str,
        business_hours: Option<&BusinessHoursData>,
        legacy_hours: Option<&str>,
    ) -> Result<i64> {
        let business_hours = match business_hours {
            Some(data) => Some(serde_json::to_string(data)?),
            None => None,
        };
        let now = Self::now();
        connection.execute(
            "INSERT INTO stores (name, business_hours, legacy_hours, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![name, business_hours, legacy_hours, now],
        )?;
        let id = connection.last_insert_rowid();
        debug!("inserted store {} '{}'", id, name);
        Ok(id)
    }

    /**
    Get a single store.

    Returns an `Ok(None)` if there is no store with that id.
    */
    pub fn query_store(
        connection: &PooledConnection<SqliteConnectionManager>,
        id: i64,
    ) -> Result<Option<Store>> {
        let mut statement = connection.prepare(&format!(
            "SELECT {} FROM stores WHERE id = ?1",
            STORE_COLUMNS
        ))?;
        let mut rows = statement.query(rusqlite::params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::store_from_row(row)?)),
            None => Ok(None),
        }
    }

    /**
    Get every store, newest first.
    */
    pub fn query_all_stores(
        connection: &PooledConnection<SqliteConnectionManager>,
    ) -> Result<Vec<Store>> {
        let mut statement = connection.prepare(&format!(
            "SELECT {} FROM stores ORDER BY created_at DESC, id DESC",
            STORE_COLUMNS
        ))?;
        let rows = statement.query_map((), Self::store_from_row)?;

        let mut stores: Vec<Store> = Vec::new();
        for row in rows {
            stores.push(row?);
        }
        Ok(stores)
    }

    /**
    Replace a store's business hours.

    Returns `Ok(false)` if the store does not exist.
    */
    pub fn update_business_hours(
        connection: &PooledConnection<SqliteConnectionManager>,
        id: i64,
        business_hours: &BusinessHoursData,
    ) -> Result<bool> {
        let changed = connection.execute(
            "UPDATE stores SET business_hours = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![serde_json::to_string(business_hours)?, Self::now(), id],
        )?;
        Ok(changed > 0)
    }

    /**
    Search stores by opening day and/or time.

    - day and time: open on that day at that time
    - day only: not closed on that day
    - time only: open at that time on at least one day
    - neither: every store

    A store is open at a time when a slot's opening is at or before it and its last order
    (or closing, when there is no last order) is at or after it.
    */
    pub fn query_open_stores(
        connection: &PooledConnection<SqliteConnectionManager>,
        day: Option<Weekday>,
        time: Option<NaiveTime>,
    ) -> Result<Vec<Store>> {
        let stores = Self::query_all_stores(connection)?;
        let matches = |hours: &BusinessHoursData| match (day, time) {
            (Some(day), Some(time)) => hours.is_open_at(day, time),
            (Some(day), None) => !hours.day(day).is_closed,
            (None, Some(time)) => hours.is_open_any_day_at(time),
            (None, None) => true,
        };
        Ok(stores
            .into_iter()
            .filter(|store| matches(&store.business_hours))
            .collect())
    }

    /**
    Fill in structured hours for records that only have legacy text.

    This is the one place the legacy parser feeds storage. Returns how many rows changed.
    */
    pub fn migrate_legacy_hours(
        connection: &PooledConnection<SqliteConnectionManager>,
    ) -> Result<usize> {
        let mut statement = connection.prepare(
            "SELECT id, legacy_hours FROM stores
             WHERE business_hours IS NULL AND legacy_hours IS NOT NULL",
        )?;
        let rows = statement.query_map((), |row| {
            let id: i64 = row.get(0)?;
            let text: String = row.get(1)?;
            Ok((id, text))
        })?;

        let mut pending: Vec<(i64, String)> = Vec::new();
        for row in rows {
            pending.push(row?);
        }

        for (id, text) in &pending {
            Self::update_business_hours(connection, *id, &parse_legacy_text(text))?;
        }
        if !pending.is_empty() {
            info!("migrated legacy business hours for {} store(s)", pending.len());
        }
        Ok(pending.len())
    }
}
