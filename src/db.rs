//! SQLite 연결 초기화. 모든 연결은 여기서 열어 PRAGMA와 스키마를 통일한다.

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// 기본 busy_timeout (밀리초)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 이력 테이블 스키마
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS history_log (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    mode            TEXT NOT NULL,
    fluid           TEXT NOT NULL,
    inputs_json     TEXT NOT NULL,
    result_json     TEXT NOT NULL,
    primary_value   REAL NOT NULL,
    secondary_value REAL NOT NULL,
    created_at      TEXT NOT NULL
);
"#;

/// 연결별 공통 설정
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 이력 테이블이 없으면 만든다.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// 파일 DB를 열고 설정과 스키마를 적용한다.
pub fn open_sqlite_connection(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    configure_sqlite_connection(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// 메모리 DB (테스트, 이력 비활성 실행용)
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}
