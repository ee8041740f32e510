//! Database schema definitions for recordings and curve points.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Recordings table
CREATE TABLE IF NOT EXISTS recordings (
    id TEXT PRIMARY KEY,
    label TEXT,
    activity_date TEXT,
    processing_status TEXT NOT NULL DEFAULT 'pending',
    curve_generation INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recordings_activity_date ON recordings(activity_date);

-- Curve points table (one row per recording and duration)
CREATE TABLE IF NOT EXISTS curve_points (
    recording_id TEXT NOT NULL REFERENCES recordings(id) ON DELETE CASCADE,
    duration_secs INTEGER NOT NULL,
    power_watts REAL NOT NULL,
    generation INTEGER NOT NULL,
    PRIMARY KEY (recording_id, duration_secs)
);
"#;

/// Schema version tracking table
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
