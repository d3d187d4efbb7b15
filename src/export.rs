//! 계산 결과와 이력을 CSV 텍스트로 내보낸다.
//!
//! 헤더는 고정이며 수치는 SI 단위 그대로 쓴다. 부동소수는 왕복 가능한
//! 최단 표현으로 기록되므로 다시 읽어도 값이 보존된다.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::{HistoryRecord, TIMESTAMP_FORMAT};
use crate::process::{RankineResult, TankDischargeResult};
use crate::properties::StatePoint;

/// 상태점 CSV 헤더. 사이클 합계는 모든 행에 같은 값으로 반복된다.
pub const STATE_POINT_HEADER: [&str; 14] = [
    "state",
    "label",
    "pressure_pa",
    "temperature_k",
    "enthalpy_j_per_kg",
    "entropy_j_per_kg_k",
    "specific_volume_m3_per_kg",
    "internal_energy_j_per_kg",
    "quality",
    "thermal_efficiency",
    "net_work_j_per_kg",
    "turbine_work_j_per_kg",
    "pump_work_j_per_kg",
    "heat_added_j_per_kg",
];

/// 탱크 방출 CSV 헤더
pub const DISCHARGE_HEADER: [&str; 10] = [
    "fluid",
    "volume_m3",
    "initial_pressure_pa",
    "final_pressure_pa",
    "initial_temperature_k",
    "final_temperature_k",
    "initial_mass_kg",
    "final_mass_kg",
    "discharged_mass_kg",
    "max_work_j",
];

/// 이력 CSV 헤더
pub const HISTORY_HEADER: [&str; 6] = [
    "id",
    "timestamp",
    "mode",
    "fluid",
    "primary_value",
    "secondary_value",
];

/// CSV 변환 오류
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV 오류: {0}")]
    Csv(#[from] csv::Error),

    #[error("버퍼 기록 실패: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 변환 실패: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("헤더 불일치: {found}")]
    Header { found: String },
}

/// 상태점 한 행
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePointRow {
    pub state: usize,
    pub label: String,
    pub pressure_pa: f64,
    pub temperature_k: f64,
    pub enthalpy_j_per_kg: f64,
    pub entropy_j_per_kg_k: f64,
    pub specific_volume_m3_per_kg: f64,
    pub internal_energy_j_per_kg: f64,
    pub quality: Option<f64>,
    pub thermal_efficiency: f64,
    pub net_work_j_per_kg: f64,
    pub turbine_work_j_per_kg: f64,
    pub pump_work_j_per_kg: f64,
    pub heat_added_j_per_kg: f64,
}

impl StatePointRow {
    fn new(state: usize, label: &str, point: &StatePoint, cycle: &RankineResult) -> Self {
        Self {
            state,
            label: label.to_string(),
            pressure_pa: point.pressure_pa,
            temperature_k: point.temperature_k,
            enthalpy_j_per_kg: point.enthalpy_j_per_kg,
            entropy_j_per_kg_k: point.entropy_j_per_kg_k,
            specific_volume_m3_per_kg: point.specific_volume_m3_per_kg,
            internal_energy_j_per_kg: point.internal_energy_j_per_kg,
            quality: point.quality,
            thermal_efficiency: cycle.thermal_efficiency,
            net_work_j_per_kg: cycle.net_work_j_per_kg,
            turbine_work_j_per_kg: cycle.turbine_work_j_per_kg,
            pump_work_j_per_kg: cycle.pump_work_j_per_kg,
            heat_added_j_per_kg: cycle.heat_added_j_per_kg,
        }
    }

    /// 행을 상태점으로 되돌린다.
    pub fn to_state_point(&self) -> StatePoint {
        StatePoint {
            pressure_pa: self.pressure_pa,
            temperature_k: self.temperature_k,
            enthalpy_j_per_kg: self.enthalpy_j_per_kg,
            entropy_j_per_kg_k: self.entropy_j_per_kg_k,
            specific_volume_m3_per_kg: self.specific_volume_m3_per_kg,
            internal_energy_j_per_kg: self.internal_energy_j_per_kg,
            quality: self.quality,
        }
    }
}

/// 탱크 방출 한 행
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DischargeRow {
    pub fluid: String,
    pub volume_m3: f64,
    pub initial_pressure_pa: f64,
    pub final_pressure_pa: f64,
    pub initial_temperature_k: f64,
    pub final_temperature_k: f64,
    pub initial_mass_kg: f64,
    pub final_mass_kg: f64,
    pub discharged_mass_kg: f64,
    pub max_work_j: f64,
}

impl From<&TankDischargeResult> for DischargeRow {
    fn from(r: &TankDischargeResult) -> Self {
        Self {
            fluid: r.fluid.to_string(),
            volume_m3: r.volume_m3,
            initial_pressure_pa: r.initial_state.pressure_pa,
            final_pressure_pa: r.final_state.pressure_pa,
            initial_temperature_k: r.initial_state.temperature_k,
            final_temperature_k: r.final_temperature_k,
            initial_mass_kg: r.initial_mass_kg,
            final_mass_kg: r.final_mass_kg,
            discharged_mass_kg: r.discharged_mass_kg,
            max_work_j: r.max_work_j,
        }
    }
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    id: i64,
    timestamp: String,
    mode: &'a str,
    fluid: &'a str,
    primary_value: f64,
    secondary_value: f64,
}

/// 고정 헤더를 먼저 쓰고 행을 직렬화한다.
fn write_rows<T: Serialize>(header: &[&str], rows: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// 고정 헤더를 확인하고 행을 읽는다.
fn read_rows<T: for<'de> Deserialize<'de>>(
    header: &[&str],
    text: &str,
) -> Result<Vec<T>, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let found = rdr.headers()?.clone();
    if found.iter().ne(header.iter().copied()) {
        return Err(ExportError::Header {
            found: found.iter().collect::<Vec<_>>().join(","),
        });
    }
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// 랭킨 사이클 상태점 4개와 사이클 합계를 CSV로 만든다.
pub fn rankine_to_csv(result: &RankineResult) -> Result<String, ExportError> {
    let rows: Vec<StatePointRow> = result
        .states
        .iter()
        .map(|s| StatePointRow::new(s.point.number(), s.point.label(), &s.state, result))
        .collect();
    write_rows(&STATE_POINT_HEADER, &rows)
}

/// 탱크 방출 결과들을 한 행씩 CSV로 만든다.
pub fn discharge_to_csv(results: &[TankDischargeResult]) -> Result<String, ExportError> {
    let rows: Vec<DischargeRow> = results.iter().map(DischargeRow::from).collect();
    write_rows(&DISCHARGE_HEADER, &rows)
}

/// 이력 요약을 CSV로 만든다.
pub fn history_to_csv(records: &[HistoryRecord]) -> Result<String, ExportError> {
    let rows: Vec<HistoryRow<'_>> = records
        .iter()
        .map(|r| HistoryRow {
            id: r.id,
            timestamp: r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            mode: r.mode.as_str(),
            fluid: &r.fluid,
            primary_value: r.primary_value,
            secondary_value: r.secondary_value,
        })
        .collect();
    write_rows(&HISTORY_HEADER, &rows)
}

/// 상태점 CSV를 다시 읽는다.
pub fn parse_state_points_csv(text: &str) -> Result<Vec<StatePointRow>, ExportError> {
    read_rows(&STATE_POINT_HEADER, text)
}

/// 탱크 방출 CSV를 다시 읽는다.
pub fn parse_discharge_csv(text: &str) -> Result<Vec<DischargeRow>, ExportError> {
    read_rows(&DISCHARGE_HEADER, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_header_is_rejected() {
        let err = parse_state_points_csv("a,b,c\n1,2,3\n").unwrap_err();
        assert!(matches!(err, ExportError::Header { .. }));
    }

    #[test]
    fn empty_quality_reads_as_none() {
        let text = format!(
            "{}\n1,x,100000,300,1,2,0.001,0.9,,0.3,1000,1010,10,3000\n",
            STATE_POINT_HEADER.join(",")
        );
        let rows = parse_state_points_csv(&text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quality, None);
        assert_eq!(rows[0].to_state_point().pressure_pa, 100_000.0);
        assert_eq!(rows[0].thermal_efficiency, 0.3);
        assert_eq!(rows[0].heat_added_j_per_kg, 3000.0);
    }
}
