//! 요청 처리 계층. 요청 하나를 계산하고 이력에 남긴다.
//!
//! 이력 기록 실패는 계산 결과를 막지 않는다. 응답에 `history_error`로만 알린다.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::export::{self, ExportError};
use crate::history::{HistoryRecord, HistoryStore, NewHistoryRecord, PersistenceError, ProcessMode};
use crate::process::{
    cycle_diagram, solve_rankine, solve_tank_discharge, CalcError, CycleDiagram, RankineInput,
    RankineResult, TankDischargeInput, TankDischargeResult,
};
use crate::properties::{PropertyBackend, StandardBackend};

/// 계산 요청. `process_type`으로 구분한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "process_type")]
pub enum ThermoRequest {
    #[serde(rename = "Rankine Cycle")]
    Rankine(RankineInput),
    #[serde(rename = "Tank Discharge")]
    TankDischarge(TankDischargeInput),
}

impl ThermoRequest {
    pub fn mode(&self) -> ProcessMode {
        match self {
            ThermoRequest::Rankine(_) => ProcessMode::Rankine,
            ThermoRequest::TankDischarge(_) => ProcessMode::Unsteady,
        }
    }
}

/// 계산 결과. `mode`로 구분한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum ThermoOutcome {
    Rankine {
        result: RankineResult,
        diagram: CycleDiagram,
    },
    Unsteady(TankDischargeResult),
}

/// 계산 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermoResponse {
    #[serde(flatten)]
    pub outcome: ThermoOutcome,
    /// 저장된 이력 id (기록하지 않았거나 실패하면 없음)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub history_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub history_error: Option<String>,
}

impl ThermoOutcome {
    /// CSV 본문. 랭킨은 상태점 4행, 탱크는 요약 1행.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        match self {
            ThermoOutcome::Rankine { result, .. } => export::rankine_to_csv(result),
            ThermoOutcome::Unsteady(result) => export::discharge_to_csv(std::slice::from_ref(result)),
        }
    }
}

/// 계산기와 이력 저장소를 묶은 처리기. 여러 요청이 동시에 공유한다.
#[derive(Clone)]
pub struct Solver {
    backend: Arc<dyn PropertyBackend>,
    store: Option<HistoryStore>,
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("backend", &self.backend.name())
            .field("store", &self.store)
            .finish()
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(Arc::new(StandardBackend::new()), None)
    }
}

impl Solver {
    pub fn new(backend: Arc<dyn PropertyBackend>, store: Option<HistoryStore>) -> Self {
        Self { backend, store }
    }

    pub fn backend(&self) -> &dyn PropertyBackend {
        self.backend.as_ref()
    }

    pub fn store(&self) -> Option<&HistoryStore> {
        self.store.as_ref()
    }

    /// 이력에 남기지 않고 계산만 한다.
    pub fn evaluate(&self, request: &ThermoRequest) -> Result<ThermoOutcome, CalcError> {
        let backend = self.backend();
        match request {
            ThermoRequest::Rankine(input) => {
                let result = solve_rankine(backend, input)?;
                let diagram = cycle_diagram(backend, &result);
                Ok(ThermoOutcome::Rankine { result, diagram })
            }
            ThermoRequest::TankDischarge(input) => {
                Ok(ThermoOutcome::Unsteady(solve_tank_discharge(backend, input)?))
            }
        }
    }

    /// 계산하고 성공하면 이력에 추가한다.
    pub fn calculate(&self, request: &ThermoRequest) -> Result<ThermoResponse, CalcError> {
        let outcome = self.evaluate(request).map_err(|err| {
            tracing::info!(mode = %request.mode(), kind = err.kind(), error = %err, "계산 거부");
            err
        })?;

        let (history_id, history_error) = match &self.store {
            Some(store) => match record_for(request, &outcome).and_then(|r| store.append(&r)) {
                Ok(id) => (Some(id), None),
                Err(err) => {
                    tracing::warn!(error = %err, "이력 기록 실패, 결과는 그대로 반환합니다");
                    (None, Some(err.to_string()))
                }
            },
            None => (None, None),
        };

        Ok(ThermoResponse {
            outcome,
            history_id,
            history_error,
        })
    }

    /// 이력 조회. `limit`이 있으면 최근 N개.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryRecord>, PersistenceError> {
        match (&self.store, limit) {
            (None, _) => Ok(Vec::new()),
            (Some(store), Some(n)) => store.recent(n),
            (Some(store), None) => store.list(),
        }
    }

    /// 이력 전체 삭제. 지운 개수를 돌려준다.
    pub fn clear_history(&self) -> Result<usize, PersistenceError> {
        match &self.store {
            Some(store) => store.clear(),
            None => Ok(0),
        }
    }
}

fn record_for(
    request: &ThermoRequest,
    outcome: &ThermoOutcome,
) -> Result<NewHistoryRecord, PersistenceError> {
    let inputs = match request {
        ThermoRequest::Rankine(input) => serde_json::to_value(input)?,
        ThermoRequest::TankDischarge(input) => serde_json::to_value(input)?,
    };
    let record = match outcome {
        ThermoOutcome::Rankine { result, .. } => NewHistoryRecord::now(
            ProcessMode::Rankine,
            result.fluid.name(),
            inputs,
            serde_json::to_value(result)?,
            result.thermal_efficiency,
            result.net_work_j_per_kg,
        ),
        ThermoOutcome::Unsteady(result) => NewHistoryRecord::now(
            ProcessMode::Unsteady,
            result.fluid.name(),
            inputs,
            serde_json::to_value(result)?,
            result.max_work_j,
            result.discharged_mass_kg,
        ),
    };
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Fluid;

    #[test]
    fn request_accepts_legacy_field_names() {
        let req: ThermoRequest = serde_json::from_str(
            r#"{"process_type":"Tank Discharge","fluid":"Nitrogen","volume_m3":0.5,
                "p_init_bar":20,"t_init_c":25,"p_final_bar":2}"#,
        )
        .unwrap();
        match req {
            ThermoRequest::TankDischarge(input) => {
                assert_eq!(input.fluid, Fluid::Nitrogen);
                assert_eq!(input.volume_m3, 0.5);
                assert_eq!(input.initial_pressure_bar, 20.0);
                assert_eq!(input.initial_temp_c, 25.0);
                assert_eq!(input.final_pressure_bar, 2.0);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn missing_fields_take_defaults() {
        let req: ThermoRequest =
            serde_json::from_str(r#"{"process_type":"Rankine Cycle"}"#).unwrap();
        assert_eq!(req, ThermoRequest::Rankine(RankineInput::default()));
    }

    #[test]
    fn unknown_process_type_is_rejected() {
        let res: Result<ThermoRequest, _> =
            serde_json::from_str(r#"{"process_type":"Brayton Cycle"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn calculate_without_store_has_no_history_id() {
        let solver = Solver::default();
        let resp = solver
            .calculate(&ThermoRequest::TankDischarge(TankDischargeInput::default()))
            .unwrap();
        assert!(resp.history_id.is_none());
        assert!(resp.history_error.is_none());
        assert!(solver.history(None).unwrap().is_empty());
    }

    #[test]
    fn failed_calculation_is_not_recorded() {
        let store = HistoryStore::open_in_memory().unwrap();
        let solver = Solver::new(Arc::new(StandardBackend::new()), Some(store));
        let bad = TankDischargeInput {
            volume_m3: -1.0,
            ..TankDischargeInput::default()
        };
        let err = solver
            .calculate(&ThermoRequest::TankDischarge(bad))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(solver.history(None).unwrap().len(), 0);
    }
}
