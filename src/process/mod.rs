//! 사이클/과정 계산기 모음.
//! 계산기는 상태를 갖지 않는 순수 함수이며, 물성은 전달받은 백엔드로만 조회한다.

pub mod diagram;
pub mod rankine;
pub mod tank_discharge;

pub use diagram::{cycle_diagram, saturation_dome, CycleDiagram, SaturationDome};
pub use rankine::{solve_rankine, CyclePoint, CycleState, RankineInput, RankineResult};
pub use tank_discharge::{solve_tank_discharge, TankDischargeInput, TankDischargeResult};

use thiserror::Error;

use crate::properties::{Fluid, PropertyBackend, PropertyError, StateInput, StatePoint};

/// 계산 중 발생 가능한 오류.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// 물성 조회 전에 걸러지는 입력 오류
    #[error("입력값 오류 ({field}): {message}")]
    InvalidInput { field: &'static str, message: String },

    /// 물성 백엔드가 상태를 결정하지 못함
    #[error("물성 조회 실패 ({step}): {source}")]
    PropertyLookup {
        step: &'static str,
        #[source]
        source: PropertyError,
    },
}

impl CalcError {
    /// 응답 본문에 쓰는 오류 종류 문자열
    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "invalid_input",
            CalcError::PropertyLookup { .. } => "property_lookup",
        }
    }

    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

/// 유한한 양수인지 확인한다.
fn require_positive(field: &'static str, value: f64) -> Result<(), CalcError> {
    if !value.is_finite() {
        return Err(CalcError::invalid(field, format!("유한한 값이어야 합니다 ({value})")));
    }
    if value <= 0.0 {
        return Err(CalcError::invalid(field, format!("양수여야 합니다 ({value})")));
    }
    Ok(())
}

/// 섭씨 입력을 절대온도로 바꾸며 0 K 이하를 거른다.
fn require_absolute_temperature(field: &'static str, t_c: f64) -> Result<f64, CalcError> {
    let t_k = crate::units::celsius_to_kelvin(t_c);
    if !t_k.is_finite() || t_k <= 0.0 {
        return Err(CalcError::invalid(
            field,
            format!("절대온도가 양수여야 합니다 ({t_c} °C)"),
        ));
    }
    Ok(t_k)
}

/// 단계 이름을 붙여 물성을 조회한다.
fn lookup(
    backend: &dyn PropertyBackend,
    fluid: Fluid,
    input: StateInput,
    step: &'static str,
) -> Result<StatePoint, CalcError> {
    backend.state(fluid, input).map_err(|source| {
        tracing::debug!(backend = backend.name(), step, %input, error = %source, "물성 조회 실패");
        CalcError::PropertyLookup { step, source }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_check_rejects_nan_and_zero() {
        assert!(require_positive("p", 1.0).is_ok());
        assert!(matches!(
            require_positive("p", 0.0),
            Err(CalcError::InvalidInput { field: "p", .. })
        ));
        assert!(require_positive("p", f64::NAN).is_err());
        assert!(require_positive("p", f64::INFINITY).is_err());
    }

    #[test]
    fn absolute_zero_is_rejected() {
        assert!(require_absolute_temperature("t", -273.15).is_err());
        let t = require_absolute_temperature("t", 40.0).unwrap();
        assert!((t - 313.15).abs() < 1e-12);
    }
}
