//! 유체 물성 조회 계층.
//!
//! 계산기는 `PropertyBackend` 트레이트만 보고 동작한다. 실제 물성은 백엔드가 결정한다.
//! - `Iapws97Backend`: 물/증기 (seuif97, IAPWS-IF97)
//! - `CoolPropBackend`: 공기, 질소, 산소, 메탄, CO2 (rfluids 실기체)
//! - `StandardBackend`: 유체에 따라 위 둘로 분배
//! - `FixtureBackend`: 테스트용 합성 물성표
//!
//! 모든 값은 SI 기준이다. 압력 Pa, 온도 K, 비엔탈피 J/kg, 비엔트로피 J/(kg·K),
//! 비체적 m³/kg.

mod coolprop;
mod fixture;
mod fluid;
mod if97;

pub use coolprop::CoolPropBackend;
pub use fixture::FixtureBackend;
pub use fluid::{Fluid, UnknownFluid};
pub use if97::Iapws97Backend;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 상태를 고정하는 두 독립 물성의 조합.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateInput {
    /// 압력[Pa], 온도[K]
    PT { p: f64, t: f64 },
    /// 압력[Pa], 건도[-]
    PQ { p: f64, q: f64 },
    /// 온도[K], 건도[-]
    TQ { t: f64, q: f64 },
    /// 압력[Pa], 비엔트로피[J/(kg·K)]
    PS { p: f64, s: f64 },
    /// 압력[Pa], 비엔탈피[J/kg]
    PH { p: f64, h: f64 },
}

impl fmt::Display for StateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StateInput::PT { p, t } => write!(f, "P={p:.1} Pa, T={t:.3} K"),
            StateInput::PQ { p, q } => write!(f, "P={p:.1} Pa, x={q:.4}"),
            StateInput::TQ { t, q } => write!(f, "T={t:.3} K, x={q:.4}"),
            StateInput::PS { p, s } => write!(f, "P={p:.1} Pa, s={s:.3} J/kg·K"),
            StateInput::PH { p, h } => write!(f, "P={p:.1} Pa, h={h:.3} J/kg"),
        }
    }
}

/// 물성 조회로 결정된 하나의 열역학 상태점.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatePoint {
    /// 압력 [Pa]
    pub pressure_pa: f64,
    /// 온도 [K]
    pub temperature_k: f64,
    /// 비엔탈피 [J/kg]
    pub enthalpy_j_per_kg: f64,
    /// 비엔트로피 [J/(kg·K)]
    pub entropy_j_per_kg_k: f64,
    /// 비체적 [m³/kg]
    pub specific_volume_m3_per_kg: f64,
    /// 비내부에너지 [J/kg]
    pub internal_energy_j_per_kg: f64,
    /// 2상 영역일 때만 건도(0~1)
    pub quality: Option<f64>,
}

impl StatePoint {
    /// 밀도 [kg/m³]
    pub fn density(&self) -> f64 {
        1.0 / self.specific_volume_m3_per_kg
    }
}

/// 물성 조회 실패.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// 백엔드가 해당 유체나 입력 조합을 지원하지 않음
    #[error("{fluid}: 지원하지 않는 조회입니다 ({what})")]
    NotSupported { fluid: Fluid, what: String },

    /// 물성 모델의 유효 범위를 벗어난 상태
    #[error("{fluid}: 유효 범위를 벗어난 상태입니다 ({what})")]
    OutOfRange { fluid: Fluid, what: String },

    /// 라이브러리 계산 결과가 유한하지 않음
    #[error("{fluid}: 물성 계산 실패 ({what})")]
    Backend { fluid: Fluid, what: String },
}

pub type PropertyResult<T> = Result<T, PropertyError>;

/// 유체·입력 조합으로 상태점을 돌려주는 물성 조회 능력.
///
/// 구현체는 스레드 간에 공유되므로 `Send + Sync`여야 한다.
pub trait PropertyBackend: Send + Sync {
    /// 로그용 백엔드 이름
    fn name(&self) -> &str;

    /// 이 백엔드가 다룰 수 있는 유체인지
    fn supports(&self, fluid: Fluid) -> bool;

    /// 상태점을 계산한다.
    fn state(&self, fluid: Fluid, input: StateInput) -> PropertyResult<StatePoint>;

    /// 주어진 압력의 포화온도 [K]. 기본 구현은 포화증기(x=1) 조회를 쓴다.
    fn saturation_temperature(&self, fluid: Fluid, p: f64) -> PropertyResult<f64> {
        Ok(self.state(fluid, StateInput::PQ { p, q: 1.0 })?.temperature_k)
    }
}

/// 유체별 기본 백엔드 묶음. 물은 IF97, 나머지는 CoolProp.
#[derive(Debug, Clone, Default)]
pub struct StandardBackend {
    water: Iapws97Backend,
    gases: CoolPropBackend,
}

impl StandardBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, fluid: Fluid) -> &dyn PropertyBackend {
        if self.water.supports(fluid) {
            &self.water
        } else {
            &self.gases
        }
    }
}

impl PropertyBackend for StandardBackend {
    fn name(&self) -> &str {
        "standard"
    }

    fn supports(&self, fluid: Fluid) -> bool {
        self.water.supports(fluid) || self.gases.supports(fluid)
    }

    fn state(&self, fluid: Fluid, input: StateInput) -> PropertyResult<StatePoint> {
        let backend = self.select(fluid);
        tracing::trace!(backend = backend.name(), %fluid, %input, "물성 조회");
        backend.state(fluid, input)
    }

    fn saturation_temperature(&self, fluid: Fluid, p: f64) -> PropertyResult<f64> {
        self.select(fluid).saturation_temperature(fluid, p)
    }
}

/// 백엔드 출력의 공통 물리 검증. 비유한 값이나 음의 비체적은 계산 실패로 본다.
pub(crate) fn validate_point(fluid: Fluid, point: StatePoint) -> PropertyResult<StatePoint> {
    let values = [
        point.pressure_pa,
        point.temperature_k,
        point.enthalpy_j_per_kg,
        point.entropy_j_per_kg_k,
        point.specific_volume_m3_per_kg,
        point.internal_energy_j_per_kg,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PropertyError::Backend {
            fluid,
            what: "유한하지 않은 결과".into(),
        });
    }
    if point.specific_volume_m3_per_kg <= 0.0 || point.temperature_k <= 0.0 {
        return Err(PropertyError::Backend {
            fluid,
            what: format!(
                "비물리적 결과 (v={:.6e} m³/kg, T={:.3} K)",
                point.specific_volume_m3_per_kg, point.temperature_k
            ),
        });
    }
    Ok(point)
}

/// 건도 입력 범위 검사
pub(crate) fn check_quality(fluid: Fluid, q: f64) -> PropertyResult<()> {
    if !(0.0..=1.0).contains(&q) {
        return Err(PropertyError::OutOfRange {
            fluid,
            what: format!("건도 {q}는 0~1 사이여야 합니다"),
        });
    }
    Ok(())
}
