#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` persistence for listing records.
//!
//! Records live in a single `listings` table keyed by listing id. A batch is
//! written in one transaction with `INSERT OR REPLACE`, so a batch either
//! lands completely or not at all, and the last record for an id wins.

pub mod paths;

use std::path::Path;

use chrono::{DateTime, Utc};
use rental_crawl_listing_models::{Coordinates, ListingId, ListingRecord, UnitInfo};
use rusqlite::{Connection, OptionalExtension as _, Row, params};

/// Errors that can occur while reading or writing the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored row: the record plus the time its batch was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredListing {
    pub record: ListingRecord,
    pub written_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, owner, price, location, place, phone, \
                       squaremeter, floor, type, latitude, longitude, timestamp";

/// Listing table backed by an `SQLite` connection.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Opens (or creates) the database at `path` and ensures the schema
    /// exists. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory, connection, or schema
    /// cannot be created.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        log::debug!("Opening listings database at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the connection or schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Wraps an existing connection, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the schema cannot be created.
    pub fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates the `listings` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the statement fails.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS listings (
                id TEXT PRIMARY KEY,
                owner TEXT,
                price TEXT,
                location TEXT,
                place TEXT,
                phone TEXT,
                squaremeter TEXT,
                floor TEXT,
                type TEXT,
                latitude TEXT,
                longitude TEXT,
                timestamp TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Writes every record in one transaction, stamped with the current
    /// time. See [`Self::upsert_all_at`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any write fails. Nothing is committed then.
    pub fn upsert_all(&mut self, records: &[ListingRecord]) -> Result<usize, StoreError> {
        self.upsert_all_at(records, Utc::now())
    }

    /// Writes every record in one transaction with `written_at` as the
    /// timestamp. Creates the table first if it was dropped.
    ///
    /// An existing row with the same id is replaced, and within the batch
    /// the later record wins. Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any write fails. The transaction is rolled
    /// back and no record of the batch is stored.
    pub fn upsert_all_at(
        &mut self,
        records: &[ListingRecord],
        written_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.ensure_schema()?;

        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO listings ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ))?;

            for record in records {
                stmt.execute(params![
                    record.id.as_str(),
                    record.owner,
                    record.price,
                    record.location,
                    record.place,
                    record.phone,
                    record.squaremeter(),
                    record.floor(),
                    record.kind(),
                    record.latitude(),
                    record.longitude(),
                    written_at,
                ])?;
            }
        }
        tx.commit()?;

        log::info!("Stored {} listings", records.len());
        Ok(records.len())
    }

    /// Looks up a single listing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub fn get(&self, id: &ListingId) -> Result<Option<StoredListing>, StoreError> {
        let stored = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM listings WHERE id = ?1"),
                [id.as_str()],
                stored_from_row,
            )
            .optional()?;
        Ok(stored)
    }

    /// Returns every stored listing ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub fn all(&self) -> Result<Vec<StoredListing>, StoreError> {
        self.list(None)
    }

    /// Returns up to `limit` stored listings ordered by id (all when
    /// `None`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<StoredListing>, StoreError> {
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM listings ORDER BY id LIMIT ?1"
        ))?;
        let rows = stmt.query_map([limit], stored_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Number of stored listings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredListing> {
    let squaremeter: Option<String> = row.get("squaremeter")?;
    let floor: Option<String> = row.get("floor")?;
    let kind: Option<String> = row.get("type")?;
    let latitude: Option<String> = row.get("latitude")?;
    let longitude: Option<String> = row.get("longitude")?;

    let info = match (squaremeter, floor, kind) {
        (Some(squaremeter), Some(floor), Some(kind)) => Some(UnitInfo {
            squaremeter,
            floor,
            kind,
        }),
        _ => None,
    };
    let coordinates = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };

    Ok(StoredListing {
        record: ListingRecord {
            id: ListingId::new(row.get::<_, String>("id")?),
            owner: row.get("owner")?,
            price: row.get("price")?,
            location: row.get("location")?,
            place: row.get("place")?,
            phone: row.get("phone")?,
            info,
            coordinates,
        },
        written_at: row.get("timestamp")?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn full(id: &str, price: &str) -> ListingRecord {
        ListingRecord {
            id: ListingId::new(id),
            owner: Some("屋主: 王先生".to_string()),
            price: Some(price.to_string()),
            location: Some("台北市信義區松仁路100號".to_string()),
            place: Some("信義區".to_string()),
            phone: Some("02-12345678".to_string()),
            info: Some(UnitInfo {
                squaremeter: "30坪".to_string(),
                floor: "5F/12F".to_string(),
                kind: "辦公".to_string(),
            }),
            coordinates: Some(Coordinates {
                latitude: "25.03".to_string(),
                longitude: "121.56".to_string(),
            }),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn stores_and_reads_back_full_record() {
        let mut store = RecordStore::open_in_memory().unwrap();
        let record = full("17339861", "35,000元/月");

        assert_eq!(store.upsert_all_at(&[record.clone()], at(1_700_000_000)).unwrap(), 1);

        let stored = store.get(&record.id).unwrap().unwrap();
        assert_eq!(stored.record, record);
        assert_eq!(stored.written_at, at(1_700_000_000));
    }

    #[test]
    fn id_only_record_round_trips_with_nulls() {
        let mut store = RecordStore::open_in_memory().unwrap();
        let record = ListingRecord::id_only(ListingId::new("42"));

        store.upsert_all(&[record.clone()]).unwrap();

        let stored = store.get(&record.id).unwrap().unwrap();
        assert!(stored.record.is_id_only());
    }

    #[test]
    fn last_record_for_an_id_wins() {
        let mut store = RecordStore::open_in_memory().unwrap();

        store
            .upsert_all(&[full("1", "10,000元/月"), full("1", "12,000元/月")])
            .unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let stored = store.get(&ListingId::new("1")).unwrap().unwrap();
        assert_eq!(stored.record.price.as_deref(), Some("12,000元/月"));
    }

    #[test]
    fn later_batch_replaces_row_and_timestamp() {
        let mut store = RecordStore::open_in_memory().unwrap();

        store.upsert_all_at(&[full("1", "10,000元/月")], at(100)).unwrap();
        store
            .upsert_all_at(&[ListingRecord::id_only(ListingId::new("1"))], at(200))
            .unwrap();

        let stored = store.get(&ListingId::new("1")).unwrap().unwrap();
        assert!(stored.record.is_id_only());
        assert_eq!(stored.written_at, at(200));
    }

    #[test]
    fn failed_batch_leaves_no_rows() {
        let mut store = RecordStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON listings
                 WHEN NEW.id = 'bad'
                 BEGIN SELECT RAISE(ABORT, 'simulated fault'); END;",
            )
            .unwrap();

        let batch = [full("1", "1,000元/月"), full("bad", "2,000元/月"), full("3", "3,000元/月")];
        let result = store.upsert_all(&batch);

        assert!(matches!(result, Err(StoreError::Sqlite(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut store = RecordStore::open_in_memory().unwrap();
        assert_eq!(store.upsert_all(&[]).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let mut store = RecordStore::open_in_memory().unwrap();
        store.upsert_all(&[full("1", "1,000元/月")]).unwrap();

        store.ensure_schema().unwrap();

        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn upsert_recreates_missing_table() {
        let mut store = RecordStore::open_in_memory().unwrap();
        store.connection().execute_batch("DROP TABLE listings;").unwrap();

        store.upsert_all(&[full("1", "1,000元/月")]).unwrap();

        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn list_is_ordered_and_limited() {
        let mut store = RecordStore::open_in_memory().unwrap();
        store
            .upsert_all(&[full("c", "1元/月"), full("a", "1元/月"), full("b", "1元/月")])
            .unwrap();

        let ids: Vec<String> = store
            .list(Some(2))
            .unwrap()
            .into_iter()
            .map(|s| s.record.id.to_string())
            .collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(store.all().unwrap().len(), 3);
    }

    #[test]
    fn file_backed_store_persists_across_opens() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("listings.sqlite3");

        {
            let mut store = RecordStore::open(&path).unwrap();
            store.upsert_all(&[full("1", "1,000元/月")]).unwrap();
        }

        let store = RecordStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn table_has_expected_columns() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut stmt = store
            .connection()
            .prepare("SELECT name FROM pragma_table_info('listings')")
            .unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            columns,
            [
                "id",
                "owner",
                "price",
                "location",
                "place",
                "phone",
                "squaremeter",
                "floor",
                "type",
                "latitude",
                "longitude",
                "timestamp"
            ]
        );
    }
}
