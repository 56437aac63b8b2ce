//! SQL schema for the stockledger SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS products (
    product_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

-- The ledger. Strictly append-only; the triggers below reject UPDATE and
-- DELETE so not even an ad-hoc query can rewrite history.
CREATE TABLE IF NOT EXISTS inventory_events (
    sequence     INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id     TEXT NOT NULL UNIQUE,
    product_id   TEXT NOT NULL REFERENCES products(product_id),
    delta        INTEGER NOT NULL,
    reason       TEXT NOT NULL,
    actor        TEXT,
    recorded_at  TEXT NOT NULL    -- RFC 3339 UTC, fixed width; server-assigned
);

CREATE TRIGGER IF NOT EXISTS inventory_events_no_update
BEFORE UPDATE ON inventory_events
BEGIN
    SELECT RAISE(ABORT, 'inventory events are append-only');
END;

CREATE TRIGGER IF NOT EXISTS inventory_events_no_delete
BEFORE DELETE ON inventory_events
BEGIN
    SELECT RAISE(ABORT, 'inventory events are append-only');
END;

-- One row per product per reconciliation run. Write-once.
CREATE TABLE IF NOT EXISTS reconciliations (
    record_id         TEXT PRIMARY KEY,
    run_id            TEXT NOT NULL,
    product_id        TEXT NOT NULL REFERENCES products(product_id),
    calculated_stock  INTEGER NOT NULL,
    event_count       INTEGER NOT NULL,
    low_stock         INTEGER NOT NULL,   -- 0 | 1
    description       TEXT NOT NULL,
    recorded_at       TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS reconciliations_no_update
BEFORE UPDATE ON reconciliations
BEGIN
    SELECT RAISE(ABORT, 'reconciliation records are write-once');
END;

CREATE TRIGGER IF NOT EXISTS reconciliations_no_delete
BEFORE DELETE ON reconciliations
BEGIN
    SELECT RAISE(ABORT, 'reconciliation records are write-once');
END;

-- Delivery attempts. `status` leaves 'PENDING' at most once.
CREATE TABLE IF NOT EXISTS notification_attempts (
    attempt_id  TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,
    recipient   TEXT NOT NULL,
    subject     TEXT NOT NULL,
    status      TEXT NOT NULL,    -- 'PENDING' | 'SENT' | 'FAILED'
    provider    TEXT,
    message_id  TEXT,
    error       TEXT,
    created_at  TEXT NOT NULL,
    sent_at     TEXT
);

CREATE INDEX IF NOT EXISTS events_product_idx    ON inventory_events(product_id, sequence);
CREATE INDEX IF NOT EXISTS reconciliations_product_idx ON reconciliations(product_id);
CREATE INDEX IF NOT EXISTS notifications_status_idx    ON notification_attempts(status);

PRAGMA user_version = 1;
";
