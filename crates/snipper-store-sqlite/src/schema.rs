//! SQL schema for the Snipper SQLite store.
//!
//! Executed once at connection startup. The version is recorded in
//! `PRAGMA user_version` so later migrations can be gated on it.

use rusqlite::functions::FunctionFlags;

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Users are deactivated, never deleted.
CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT    NOT NULL UNIQUE,
    email         TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,   -- argon2 PHC string
    full_name     TEXT,
    bio           TEXT,
    active        INTEGER NOT NULL DEFAULT 1 CHECK (active IN (0, 1)),
    created_at    TEXT    NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS snippets (
    snippet_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id   INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title       TEXT    NOT NULL,
    description TEXT,
    content     TEXT    NOT NULL,
    language    TEXT    NOT NULL,
    tags        TEXT    NOT NULL DEFAULT '',   -- comma-delimited, sorted
    visibility  TEXT    NOT NULL DEFAULT 'PUBLIC'
                CHECK (visibility IN ('PUBLIC', 'PRIVATE', 'UNLISTED')),
    view_count  INTEGER NOT NULL DEFAULT 0 CHECK (view_count >= 0),
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS snippets_author_idx     ON snippets(author_id);
CREATE INDEX IF NOT EXISTS snippets_visibility_idx ON snippets(visibility, created_at);
CREATE INDEX IF NOT EXISTS snippets_language_idx   ON snippets(language);
CREATE INDEX IF NOT EXISTS snippets_views_idx      ON snippets(view_count);

PRAGMA user_version = 1;
";

/// Unicode-aware lowercase. SQLite's built-in `lower()` and `LIKE` only fold
/// ASCII, so text search compares `fold_case(column)` against a needle that
/// was lowercased in Rust.
pub const FOLD_CASE: &str = "fold_case";

/// Register the scalar functions the queries rely on. Must run on every
/// connection before any query that uses them.
pub fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    FOLD_CASE,
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
  )
}
