//! 계산 이력 저장소.
//!
//! 레코드는 추가만 가능하고 일괄 삭제로만 지운다. 식별자는 삽입 순서(rowid)뿐이다.
//! 쓰기는 단일 연결 + 뮤텍스로 직렬화하고, 삽입마다 트랜잭션 하나를 쓴다.

use chrono::{Local, NaiveDateTime, SubsecRound};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::db;

/// 저장 시각 문자열 형식 (ISO, 'T' 구분)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// 이력 저장/조회 오류
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("데이터베이스 오류: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("직렬화 오류: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("데이터베이스 잠금 실패: {0}")]
    Lock(String),

    #[error("손상된 이력 레코드 (id={id}): {message}")]
    CorruptRecord { id: i64, message: String },
}

/// 계산 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessMode {
    Rankine,
    Unsteady,
}

impl ProcessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessMode::Rankine => "Rankine",
            ProcessMode::Unsteady => "Unsteady",
        }
    }
}

impl fmt::Display for ProcessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Rankine" => Ok(ProcessMode::Rankine),
            "Unsteady" => Ok(ProcessMode::Unsteady),
            other => Err(format!("알 수 없는 계산 종류: {other}")),
        }
    }
}

/// 저장 전 레코드
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryRecord {
    pub mode: ProcessMode,
    pub fluid: String,
    pub inputs: serde_json::Value,
    pub result: serde_json::Value,
    /// Rankine: 열효율(0~1), Unsteady: 최대 일 [J]
    pub primary_value: f64,
    /// Rankine: 순 비일 [J/kg], Unsteady: 방출 질량 [kg]
    pub secondary_value: f64,
    pub timestamp: NaiveDateTime,
}

impl NewHistoryRecord {
    /// 현재 시각으로 레코드를 만든다.
    pub fn now(
        mode: ProcessMode,
        fluid: impl Into<String>,
        inputs: serde_json::Value,
        result: serde_json::Value,
        primary_value: f64,
        secondary_value: f64,
    ) -> Self {
        Self {
            mode,
            fluid: fluid.into(),
            inputs,
            result,
            primary_value,
            secondary_value,
            // 저장 형식이 마이크로초까지라 미리 자른다
            timestamp: Local::now().naive_local().trunc_subsecs(6),
        }
    }
}

/// 저장된 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub mode: ProcessMode,
    pub fluid: String,
    pub inputs: serde_json::Value,
    pub result: serde_json::Value,
    pub primary_value: f64,
    pub secondary_value: f64,
    pub timestamp: NaiveDateTime,
}

/// 이력 저장소 핸들. 복제해도 같은 연결을 공유한다.
#[derive(Clone)]
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore").finish_non_exhaustive()
    }
}

struct RawRow {
    id: i64,
    mode: String,
    fluid: String,
    inputs_json: String,
    result_json: String,
    primary_value: f64,
    secondary_value: f64,
    created_at: String,
}

impl RawRow {
    fn into_record(self) -> Result<HistoryRecord, PersistenceError> {
        let id = self.id;
        let corrupt = |message: String| PersistenceError::CorruptRecord { id, message };
        let mode = self.mode.parse::<ProcessMode>().map_err(corrupt)?;
        let timestamp = NaiveDateTime::parse_from_str(&self.created_at, TIMESTAMP_FORMAT)
            .map_err(|e| corrupt(format!("시각 파싱 실패: {e}")))?;
        Ok(HistoryRecord {
            id,
            mode,
            fluid: self.fluid,
            inputs: serde_json::from_str(&self.inputs_json)?,
            result: serde_json::from_str(&self.result_json)?,
            primary_value: self.primary_value,
            secondary_value: self.secondary_value,
            timestamp,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, mode, fluid, inputs_json, result_json, \
     primary_value, secondary_value, created_at FROM history_log";

impl HistoryStore {
    /// 파일 DB를 연다. 없으면 만든다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = db::open_sqlite_connection(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "이력 DB 연결");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn get_conn(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|e| PersistenceError::Lock(e.to_string()))
    }

    /// 레코드를 추가하고 삽입 id를 돌려준다.
    pub fn append(&self, record: &NewHistoryRecord) -> Result<i64, PersistenceError> {
        let inputs_json = serde_json::to_string(&record.inputs)?;
        let result_json = serde_json::to_string(&record.result)?;
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO history_log (
                mode, fluid, inputs_json, result_json,
                primary_value, secondary_value, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.mode.as_str(),
                record.fluid,
                inputs_json,
                result_json,
                record.primary_value,
                record.secondary_value,
                record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::debug!(id, mode = %record.mode, "이력 추가");
        Ok(id)
    }

    fn query(&self, sql: &str, limit: Option<i64>) -> Result<Vec<HistoryRecord>, PersistenceError> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RawRow> {
            Ok(RawRow {
                id: row.get(0)?,
                mode: row.get(1)?,
                fluid: row.get(2)?,
                inputs_json: row.get(3)?,
                result_json: row.get(4)?,
                primary_value: row.get(5)?,
                secondary_value: row.get(6)?,
                created_at: row.get(7)?,
            })
        };
        let rows = match limit {
            Some(n) => stmt
                .query_map(params![n], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        rows.into_iter().map(RawRow::into_record).collect()
    }

    /// 전체 이력을 삽입 순서로 돌려준다.
    pub fn list(&self) -> Result<Vec<HistoryRecord>, PersistenceError> {
        self.query(&format!("{SELECT_COLUMNS} ORDER BY id ASC"), None)
    }

    /// 최근 `limit`개를 삽입 순서로 돌려준다.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, PersistenceError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut records =
            self.query(&format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?1"), Some(limit))?;
        records.reverse();
        Ok(records)
    }

    pub fn count(&self) -> Result<usize, PersistenceError> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM history_log", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// 모든 이력을 지운다. 이미 비어 있어도 성공한다.
    pub fn clear(&self) -> Result<usize, PersistenceError> {
        let conn = self.get_conn()?;
        let removed = conn.execute("DELETE FROM history_log", [])?;
        tracing::info!(removed, "이력 삭제");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(primary: f64) -> NewHistoryRecord {
        NewHistoryRecord::now(
            ProcessMode::Unsteady,
            "Air",
            json!({ "volume_m3": 0.3 }),
            json!({ "max_work_j": primary }),
            primary,
            1.0,
        )
    }

    #[test]
    fn recent_keeps_insertion_order() {
        let store = HistoryStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.append(&record(i as f64)).unwrap();
        }
        let recent = store.recent(2).unwrap();
        let values: Vec<f64> = recent.iter().map(|r| r.primary_value).collect();
        assert_eq!(values, vec![3.0, 4.0]);
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn corrupt_mode_is_reported() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.append(&record(1.0)).unwrap();
        {
            let conn = store.get_conn().unwrap();
            conn.execute("UPDATE history_log SET mode = 'Brayton'", [])
                .unwrap();
        }
        let err = store.list().unwrap_err();
        assert!(matches!(err, PersistenceError::CorruptRecord { id: 1, .. }));
    }

    #[test]
    fn timestamp_survives_roundtrip() {
        let store = HistoryStore::open_in_memory().unwrap();
        let rec = record(2.0);
        store.append(&rec).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed[0].timestamp, rec.timestamp);
    }
}
