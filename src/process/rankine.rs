//! 이상 랭킨 사이클 계산.
//!
//! 상태점 번호
//! 1. 복수기 출구/펌프 입구: 복수기 압력의 포화수
//! 2. 펌프 출구/보일러 입구: h2 = h1 + v1·Δp (비압축성 액체 근사)
//! 3. 보일러 출구/터빈 입구: 보일러 압력의 과열 증기
//! 4. 터빈 출구/복수기 입구: 복수기 압력까지 등엔트로피 팽창
//!
//! 터빈과 펌프 모두 이상(등엔트로피) 과정으로 두며 효율 보정 계수는 없다.

use serde::{Deserialize, Serialize};

use super::{lookup, require_absolute_temperature, require_positive, CalcError};
use crate::properties::{Fluid, PropertyBackend, PropertyError, StateInput, StatePoint};
use crate::units::bar_to_pa;

/// 랭킨 사이클 입력. 요청 JSON의 기존 필드명(p_high_bar 등)도 받는다.
/// 한 필드에 두 이름을 함께 보내면 중복 필드로 역직렬화가 실패한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankineInput {
    /// 보일러 압력 [bar abs]
    #[serde(alias = "p_high_bar")]
    pub boiler_pressure_bar: f64,
    /// 터빈 입구 온도 [°C]
    #[serde(alias = "t_high_c")]
    pub turbine_inlet_temp_c: f64,
    /// 복수기 압력 [bar abs]
    #[serde(alias = "p_low_bar")]
    pub condenser_pressure_bar: f64,
}

impl Default for RankineInput {
    fn default() -> Self {
        Self {
            boiler_pressure_bar: 35.0,
            turbine_inlet_temp_c: 350.0,
            condenser_pressure_bar: 0.1,
        }
    }
}

/// 사이클 상의 위치.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePoint {
    PumpInlet,
    BoilerInlet,
    TurbineInlet,
    TurbineExit,
}

impl CyclePoint {
    /// 사이클 순서
    pub const ORDER: [CyclePoint; 4] = [
        CyclePoint::PumpInlet,
        CyclePoint::BoilerInlet,
        CyclePoint::TurbineInlet,
        CyclePoint::TurbineExit,
    ];

    /// 1부터 시작하는 상태점 번호
    pub fn number(self) -> usize {
        match self {
            CyclePoint::PumpInlet => 1,
            CyclePoint::BoilerInlet => 2,
            CyclePoint::TurbineInlet => 3,
            CyclePoint::TurbineExit => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CyclePoint::PumpInlet => "condenser exit / pump inlet",
            CyclePoint::BoilerInlet => "pump exit / boiler inlet",
            CyclePoint::TurbineInlet => "boiler exit / turbine inlet",
            CyclePoint::TurbineExit => "turbine exit / condenser inlet",
        }
    }
}

/// 위치가 붙은 상태점
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleState {
    pub point: CyclePoint,
    pub state: StatePoint,
}

/// 랭킨 사이클 계산 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankineResult {
    pub fluid: Fluid,
    /// 1→4 순서의 상태점
    pub states: Vec<CycleState>,
    /// 터빈 비일 [J/kg]
    pub turbine_work_j_per_kg: f64,
    /// 펌프 비일 [J/kg]
    pub pump_work_j_per_kg: f64,
    /// 순 비일 [J/kg]
    pub net_work_j_per_kg: f64,
    /// 보일러 가열량 [J/kg]
    pub heat_added_j_per_kg: f64,
    /// 열효율 (0~1)
    pub thermal_efficiency: f64,
}

impl RankineResult {
    /// 위치로 상태점을 찾는다.
    pub fn state(&self, point: CyclePoint) -> Option<&StatePoint> {
        self.states
            .iter()
            .find(|s| s.point == point)
            .map(|s| &s.state)
    }

    pub fn efficiency_percent(&self) -> f64 {
        self.thermal_efficiency * 100.0
    }
}

fn validate(input: &RankineInput) -> Result<(f64, f64, f64), CalcError> {
    require_positive("boiler_pressure_bar", input.boiler_pressure_bar)?;
    require_positive("condenser_pressure_bar", input.condenser_pressure_bar)?;
    let t_in = require_absolute_temperature("turbine_inlet_temp_c", input.turbine_inlet_temp_c)?;
    if input.condenser_pressure_bar >= input.boiler_pressure_bar {
        return Err(CalcError::InvalidInput {
            field: "condenser_pressure_bar",
            message: format!(
                "복수기 압력({} bar)은 보일러 압력({} bar)보다 낮아야 합니다",
                input.condenser_pressure_bar, input.boiler_pressure_bar
            ),
        });
    }
    Ok((
        bar_to_pa(input.boiler_pressure_bar),
        t_in,
        bar_to_pa(input.condenser_pressure_bar),
    ))
}

/// 이상 랭킨 사이클을 푼다. 작동유체는 물이다.
pub fn solve_rankine(
    backend: &dyn PropertyBackend,
    input: &RankineInput,
) -> Result<RankineResult, CalcError> {
    let fluid = Fluid::Water;
    let (p_boiler, t_inlet, p_cond) = validate(input)?;

    // 1: 복수기 출구 포화수
    let s1 = lookup(
        backend,
        fluid,
        StateInput::PQ { p: p_cond, q: 0.0 },
        "condenser exit",
    )?;

    // 2: 펌프 출구
    let w_pump = s1.specific_volume_m3_per_kg * (p_boiler - p_cond);
    let s2 = lookup(
        backend,
        fluid,
        StateInput::PH {
            p: p_boiler,
            h: s1.enthalpy_j_per_kg + w_pump,
        },
        "pump exit",
    )?;

    // 3: 터빈 입구는 과열 영역이어야 한다
    let t_sat = backend
        .saturation_temperature(fluid, p_boiler)
        .map_err(|source| CalcError::PropertyLookup {
            step: "boiler saturation",
            source,
        })?;
    if t_inlet <= t_sat {
        return Err(CalcError::PropertyLookup {
            step: "turbine inlet",
            source: PropertyError::OutOfRange {
                fluid,
                what: format!(
                    "터빈 입구 {:.2} K가 보일러 압력의 포화온도 {:.2} K 이하라 과열 증기가 아닙니다",
                    t_inlet, t_sat
                ),
            },
        });
    }
    let s3 = lookup(
        backend,
        fluid,
        StateInput::PT {
            p: p_boiler,
            t: t_inlet,
        },
        "turbine inlet",
    )?;

    // 4: 등엔트로피 팽창
    let s4 = lookup(
        backend,
        fluid,
        StateInput::PS {
            p: p_cond,
            s: s3.entropy_j_per_kg_k,
        },
        "turbine exit",
    )?;

    let w_turbine = s3.enthalpy_j_per_kg - s4.enthalpy_j_per_kg;
    let w_net = w_turbine - w_pump;
    let q_in = s3.enthalpy_j_per_kg - s2.enthalpy_j_per_kg;
    let efficiency = if q_in > 0.0 { w_net / q_in } else { 0.0 };

    tracing::debug!(
        backend = backend.name(),
        w_turbine,
        w_pump,
        q_in,
        efficiency,
        "랭킨 사이클 계산 완료"
    );

    let states = CyclePoint::ORDER
        .iter()
        .zip([s1, s2, s3, s4])
        .map(|(&point, state)| CycleState { point, state })
        .collect();

    Ok(RankineResult {
        fluid,
        states,
        turbine_work_j_per_kg: w_turbine,
        pump_work_j_per_kg: w_pump,
        net_work_j_per_kg: w_net,
        heat_added_j_per_kg: q_in,
        thermal_efficiency: efficiency,
    })
}
