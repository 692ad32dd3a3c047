//! Row-level bindings for the archive SQLite schema.

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use core_types::MediaRef;
use rusqlite::{Connection, Row, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod db;
pub mod event;
pub mod family;
pub mod media;
pub mod person;
pub mod place;
pub mod source;
pub mod tag;
pub mod undo;

pub use db::ArchiveDb;
pub use event::Event;
pub use family::Family;
pub use media::MediaObject;
pub use person::Person;
pub use place::Place;
pub use source::Source;
pub use tag::Tag;
pub use undo::UndoEntry;

pub type DbResult<T> = anyhow::Result<T>;

/// Common trait allowing modules to operate over either a `Connection` or
/// `Transaction`.
pub trait DbHandle {
    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<usize>;
    fn prepare<'a>(&'a self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'a>>;
    fn last_insert_rowid(&self) -> i64;
}

impl DbHandle for Connection {
    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<usize> {
        Connection::execute(self, sql, params)
    }

    fn prepare<'a>(&'a self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'a>> {
        Connection::prepare(self, sql)
    }

    fn last_insert_rowid(&self) -> i64 {
        Connection::last_insert_rowid(self)
    }
}

impl<'tx> DbHandle for Transaction<'tx> {
    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<usize> {
        (**self).execute(sql, params)
    }

    fn prepare<'stmt>(&'stmt self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'stmt>> {
        (**self).prepare(sql)
    }

    fn last_insert_rowid(&self) -> i64 {
        (**self).last_insert_rowid()
    }
}

/// Map a single row result to a typed value, failing when no rows match.
pub fn query_one<T, H, P, F>(db: &H, sql: &str, params: P, map: F) -> DbResult<T>
where
    H: DbHandle + ?Sized,
    P: rusqlite::Params,
    F: FnOnce(&Row) -> DbResult<T>,
{
    let mut stmt = db.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let row = rows.next()?.context("query returned no rows")?;
    map(row)
}

/// Map at most one row result to a typed value.
pub fn query_optional<T, H, P, F>(db: &H, sql: &str, params: P, mut map: F) -> DbResult<Option<T>>
where
    H: DbHandle + ?Sized,
    P: rusqlite::Params,
    F: FnMut(&Row) -> DbResult<T>,
{
    let mut stmt = db.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(map(row)?)),
        None => Ok(None),
    }
}

/// Collect all rows from a query into a vector.
pub fn query_all<T, H, P, F>(db: &H, sql: &str, params: P, mut map: F) -> DbResult<Vec<T>>
where
    H: DbHandle + ?Sized,
    P: rusqlite::Params,
    F: FnMut(&Row) -> DbResult<T>,
{
    let mut stmt = db.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(map(row)?);
    }
    Ok(out)
}

pub fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_datetime(raw: String, field: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field} timestamp: {raw}"))
}

pub fn to_json<T: Serialize>(value: &T) -> DbResult<String> {
    serde_json::to_string(value).context("failed to serialize JSON column")
}

pub fn from_json<T: DeserializeOwned>(s: &str) -> DbResult<T> {
    serde_json::from_str(s).context("failed to deserialize JSON column")
}

/// Record class that can own media references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Person,
    Family,
    Source,
    Place,
}

impl HostKind {
    pub fn label(&self) -> &'static str {
        match self {
            HostKind::Person => "Person",
            HostKind::Family => "Family",
            HostKind::Source => "Source",
            HostKind::Place => "Place",
        }
    }
}

/// Shared surface of the four record classes that carry an ordered media
/// reference list. Lets gallery-style editors host any of them; bulk
/// operations such as the deletion sweep still address each class on its
/// own.
pub trait MediaHost {
    fn kind(&self) -> HostKind;
    fn handle(&self) -> &str;
    fn public_id(&self) -> &str;
    fn media_refs(&self) -> &[MediaRef];
    fn media_refs_mut(&mut self) -> &mut Vec<MediaRef>;
    fn set_media_refs(&mut self, refs: Vec<MediaRef>);
    fn set_change_time(&mut self, epoch: i64);
    fn save<H: DbHandle>(&self, db: &H) -> DbResult<()>;
}
