//! SQL schema for the fieldtrace SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    role          TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS farms (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL,
    name        TEXT NOT NULL,
    location    TEXT NOT NULL,       -- JSON {\"lat\":..,\"lng\":..}
    size        REAL NOT NULL,       -- hectares
    type        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS crops (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    farm_id               INTEGER NOT NULL REFERENCES farms(id),
    name                  TEXT NOT NULL,
    variety               TEXT,
    planting_date         TEXT,
    expected_harvest_date TEXT,
    status                TEXT NOT NULL DEFAULT 'growing'
);

-- Activities and advisories are append-only.
CREATE TABLE IF NOT EXISTS activities (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    farm_id    INTEGER NOT NULL REFERENCES farms(id),
    type       TEXT NOT NULL,
    date       TEXT NOT NULL,
    details    TEXT,
    logged_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS advisories (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    farm_id    INTEGER NOT NULL REFERENCES farms(id),
    type       TEXT NOT NULL,
    message    TEXT NOT NULL,
    data       TEXT,                 -- JSON or NULL
    created_at TEXT NOT NULL,
    is_read    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS batches (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    farm_id          INTEGER NOT NULL REFERENCES farms(id),
    crop_id          INTEGER NOT NULL REFERENCES crops(id),
    batch_identifier TEXT NOT NULL UNIQUE,
    quantity         REAL NOT NULL,
    harvest_date     TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'harvested'
);

CREATE TABLE IF NOT EXISTS traceability_events (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id           INTEGER NOT NULL REFERENCES batches(id),
    stage              TEXT NOT NULL,
    location           TEXT NOT NULL,
    handler            TEXT NOT NULL,
    timestamp          TEXT NOT NULL,  -- fixed-width RFC 3339 UTC; sorts lexically
    document_hash      TEXT,
    blockchain_tx_hash TEXT
);

CREATE TABLE IF NOT EXISTS carbon_records (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id         INTEGER NOT NULL UNIQUE REFERENCES batches(id),
    emissions        REAL NOT NULL,
    certificate_hash TEXT NOT NULL,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS farms_user_idx       ON farms(user_id);
CREATE INDEX IF NOT EXISTS crops_farm_idx       ON crops(farm_id);
CREATE INDEX IF NOT EXISTS activities_farm_idx  ON activities(farm_id);
CREATE INDEX IF NOT EXISTS advisories_farm_idx  ON advisories(farm_id);
CREATE INDEX IF NOT EXISTS events_batch_idx     ON traceability_events(batch_id, timestamp);

PRAGMA user_version = 1;
";
