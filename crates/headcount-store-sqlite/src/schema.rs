//! SQL schema for the Headcount SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Scan events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS scan_events (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
    event_id     TEXT NOT NULL UNIQUE,
    subject_id   TEXT NOT NULL CHECK (length(trim(subject_id)) > 0),
    action       TEXT NOT NULL CHECK (action IN ('IN', 'OUT')),
    recorded_at  TEXT NOT NULL                       -- fixed-width RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS scan_events_recorded_idx ON scan_events(recorded_at, seq);
CREATE INDEX IF NOT EXISTS scan_events_subject_idx  ON scan_events(subject_id);

PRAGMA user_version = 1;
";
