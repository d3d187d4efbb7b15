//! 강체 탱크 방출(비정상 유동) 계산.
//!
//! 탱크에 남는 내용물은 최종 압력까지 등엔트로피로 팽창한다고 본다.
//! 최대 터빈 일은 탱크 내용물과 방출된 질량(최종 상태로 인도)을 합친 계의
//! 에너지 수지로 구한다. 열전달, 운동/위치 에너지는 무시한다.
//!
//!   W_max = m1·u1 − m2·u2 − m_exit·h2

use serde::{Deserialize, Serialize};

use super::{lookup, require_absolute_temperature, require_positive, CalcError};
use crate::properties::{Fluid, PropertyBackend, StateInput, StatePoint};
use crate::units::bar_to_pa;

/// 탱크 방출 입력. 기존 요청 필드명(p_init_bar 등)도 받는다.
/// 한 필드에 두 이름을 함께 보내면 중복 필드로 역직렬화가 실패한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankDischargeInput {
    pub fluid: Fluid,
    /// 탱크 체적 [m³]
    pub volume_m3: f64,
    /// 초기 압력 [bar abs]
    #[serde(alias = "p_init_bar")]
    pub initial_pressure_bar: f64,
    /// 초기 온도 [°C]
    #[serde(alias = "t_init_c")]
    pub initial_temp_c: f64,
    /// 최종 압력 [bar abs]
    #[serde(alias = "p_final_bar")]
    pub final_pressure_bar: f64,
}

impl Default for TankDischargeInput {
    fn default() -> Self {
        Self {
            fluid: Fluid::Air,
            volume_m3: 0.3,
            initial_pressure_bar: 35.0,
            initial_temp_c: 40.0,
            final_pressure_bar: 1.0,
        }
    }
}

/// 탱크 방출 계산 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankDischargeResult {
    pub fluid: Fluid,
    pub volume_m3: f64,
    pub initial_state: StatePoint,
    pub final_state: StatePoint,
    /// 초기 질량 [kg]
    pub initial_mass_kg: f64,
    /// 최종(잔류) 질량 [kg]
    pub final_mass_kg: f64,
    /// 방출 질량 [kg]
    pub discharged_mass_kg: f64,
    /// 최종 온도 [K]
    pub final_temperature_k: f64,
    /// 최대 터빈 일 [J]
    pub max_work_j: f64,
}

fn validate(input: &TankDischargeInput) -> Result<(f64, f64, f64), CalcError> {
    require_positive("volume_m3", input.volume_m3)?;
    require_positive("initial_pressure_bar", input.initial_pressure_bar)?;
    require_positive("final_pressure_bar", input.final_pressure_bar)?;
    let t1 = require_absolute_temperature("initial_temp_c", input.initial_temp_c)?;
    if input.final_pressure_bar >= input.initial_pressure_bar {
        return Err(CalcError::InvalidInput {
            field: "final_pressure_bar",
            message: format!(
                "방출 후 압력({} bar)은 초기 압력({} bar)보다 낮아야 합니다",
                input.final_pressure_bar, input.initial_pressure_bar
            ),
        });
    }
    Ok((
        bar_to_pa(input.initial_pressure_bar),
        t1,
        bar_to_pa(input.final_pressure_bar),
    ))
}

/// 탱크 방출 질량과 최대 터빈 일을 계산한다.
pub fn solve_tank_discharge(
    backend: &dyn PropertyBackend,
    input: &TankDischargeInput,
) -> Result<TankDischargeResult, CalcError> {
    let fluid = input.fluid;
    let (p1, t1, p2) = validate(input)?;
    let volume = input.volume_m3;

    let initial = lookup(backend, fluid, StateInput::PT { p: p1, t: t1 }, "initial state")?;
    let m1 = volume / initial.specific_volume_m3_per_kg;

    // 잔류 내용물의 등엔트로피 팽창
    let final_state = lookup(
        backend,
        fluid,
        StateInput::PS {
            p: p2,
            s: initial.entropy_j_per_kg_k,
        },
        "isentropic final state",
    )?;
    let m2 = volume / final_state.specific_volume_m3_per_kg;
    let m_exit = (m1 - m2).clamp(0.0, m1);

    let u_initial = m1 * initial.internal_energy_j_per_kg;
    let u_final = m2 * final_state.internal_energy_j_per_kg;
    let h_leaving = m_exit * final_state.enthalpy_j_per_kg;
    let w_max = u_initial - u_final - h_leaving;

    tracing::debug!(
        backend = backend.name(),
        %fluid,
        m1,
        m2,
        m_exit,
        t_final = final_state.temperature_k,
        w_max,
        "탱크 방출 계산 완료"
    );

    Ok(TankDischargeResult {
        fluid,
        volume_m3: volume,
        initial_state: initial,
        final_state,
        initial_mass_kg: m1,
        final_mass_kg: m2,
        discharged_mass_kg: m_exit,
        final_temperature_k: final_state.temperature_k,
        max_work_j: w_max,
    })
}
