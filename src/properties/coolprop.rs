//! 공기·질소·산소·메탄·CO2 실기체 물성 (rfluids, CoolProp HEOS).
//!
//! (P,T), (P,Q), (T,Q)는 CoolProp에 그대로 넘긴다. (P,S), (P,H)는 포화 구간을 먼저
//! 확인하고, 단상이면 온도 구간을 잡아 이분법으로 푼다.

use rfluids::prelude::{Fluid as CoolFluid, FluidInput};
use rfluids::substance::Pure;
use std::fmt::Display;

use super::{
    check_quality, validate_point, Fluid, PropertyBackend, PropertyError, PropertyResult,
    StateInput, StatePoint,
};

const MAX_ITER: usize = 200;
/// 이분법 종료 온도 폭 [K]
const T_TOL_K: f64 = 1.0e-9;
/// 포화온도·하한에서 안쪽으로 떼는 간격 [K]
const SAT_OFFSET_K: f64 = 1.0e-6;

/// 유체별 CoolProp 이름과 적용 범위
#[derive(Debug, Clone, Copy)]
struct Substance {
    pure: Pure,
    /// 하한 [K]. 삼중점(공기는 CoolProp Tmin).
    t_min: f64,
    /// 상한 [K]
    t_max: f64,
    /// 임계압력 [Pa]
    p_crit: f64,
}

fn substance(fluid: Fluid) -> Option<Substance> {
    let sub = match fluid {
        Fluid::Air => Substance {
            pure: Pure::Air,
            t_min: 59.75,
            t_max: 2_000.0,
            p_crit: 3.786e6,
        },
        Fluid::Nitrogen => Substance {
            pure: Pure::Nitrogen,
            t_min: 63.151,
            t_max: 2_000.0,
            p_crit: 3.3958e6,
        },
        Fluid::Oxygen => Substance {
            pure: Pure::Oxygen,
            t_min: 54.361,
            t_max: 2_000.0,
            p_crit: 5.043e6,
        },
        Fluid::Methane => Substance {
            pure: Pure::Methane,
            t_min: 90.6941,
            t_max: 625.0,
            p_crit: 4.5992e6,
        },
        Fluid::CarbonDioxide => Substance {
            pure: Pure::CarbonDioxide,
            t_min: 216.592,
            t_max: 2_000.0,
            p_crit: 7.3773e6,
        },
        Fluid::Water => return None,
    };
    Some(sub)
}

fn library_error(fluid: Fluid, at: &str, e: impl Display) -> PropertyError {
    PropertyError::Backend {
        fluid,
        what: format!("rfluids 오류 ({at}): {e}"),
    }
}

/// 포화선 위 액체·증기 상태
struct Dome {
    liquid: StatePoint,
    vapor: StatePoint,
}

/// CoolProp 실기체 백엔드.
///
/// rfluids `Fluid` 인스턴스는 조회마다 새로 만들어 스레드 간 공유 상태가 없다.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoolPropBackend;

impl CoolPropBackend {
    pub fn new() -> Self {
        Self
    }

    fn check_pressure(fluid: Fluid, p: f64) -> PropertyResult<()> {
        if !(p.is_finite() && p > 0.0) {
            return Err(PropertyError::OutOfRange {
                fluid,
                what: format!("압력 {p} Pa는 양수여야 합니다"),
            });
        }
        Ok(())
    }

    /// 두 입력으로 CoolProp 상태를 만들고 상태점으로 옮긴다.
    fn evaluate(
        fluid: Fluid,
        sub: &Substance,
        first: FluidInput,
        second: FluidInput,
        quality: Option<f64>,
        at: &str,
    ) -> PropertyResult<StatePoint> {
        let mut state = CoolFluid::from(sub.pure)
            .in_state(first, second)
            .map_err(|e| library_error(fluid, at, e))?;
        let p = state.pressure().map_err(|e| library_error(fluid, at, e))?;
        let t = state.temperature().map_err(|e| library_error(fluid, at, e))?;
        let h = state.enthalpy().map_err(|e| library_error(fluid, at, e))?;
        let s = state.entropy().map_err(|e| library_error(fluid, at, e))?;
        let rho = state.density().map_err(|e| library_error(fluid, at, e))?;
        let v = 1.0 / rho;
        validate_point(
            fluid,
            StatePoint {
                pressure_pa: p,
                temperature_k: t,
                enthalpy_j_per_kg: h,
                entropy_j_per_kg_k: s,
                specific_volume_m3_per_kg: v,
                internal_energy_j_per_kg: h - p * v,
                quality,
            },
        )
    }

    fn pt_point(fluid: Fluid, sub: &Substance, p: f64, t: f64) -> PropertyResult<StatePoint> {
        Self::check_pressure(fluid, p)?;
        if !t.is_finite() || t < sub.t_min || t > sub.t_max {
            return Err(PropertyError::OutOfRange {
                fluid,
                what: format!(
                    "온도 {t:.2} K가 적용 범위({:.2}~{:.0} K)를 벗어납니다",
                    sub.t_min, sub.t_max
                ),
            });
        }
        Self::evaluate(
            fluid,
            sub,
            FluidInput::pressure(p),
            FluidInput::temperature(t),
            None,
            &format!("P={p:.1} Pa, T={t:.3} K"),
        )
    }

    fn pq_point(fluid: Fluid, sub: &Substance, p: f64, q: f64) -> PropertyResult<StatePoint> {
        Self::check_pressure(fluid, p)?;
        check_quality(fluid, q)?;
        if p >= sub.p_crit {
            return Err(PropertyError::OutOfRange {
                fluid,
                what: format!("임계압력({:.0} Pa) 이상에서는 포화 상태가 없습니다", sub.p_crit),
            });
        }
        Self::evaluate(
            fluid,
            sub,
            FluidInput::pressure(p),
            FluidInput::quality(q),
            Some(q),
            &format!("P={p:.1} Pa, x={q:.4}"),
        )
    }

    /// 임계압력 미만이고 포화 조회가 되면 포화 액체·증기를 돌려준다.
    /// 삼중점 압력 아래처럼 포화선이 없는 압력이면 `None`.
    fn dome(fluid: Fluid, sub: &Substance, p: f64) -> Option<Dome> {
        if p >= sub.p_crit {
            return None;
        }
        let liquid = Self::pq_point(fluid, sub, p, 0.0).ok()?;
        let vapor = Self::pq_point(fluid, sub, p, 1.0).ok()?;
        (liquid.temperature_k >= sub.t_min).then_some(Dome { liquid, vapor })
    }

    /// 압력 p에서 `key(상태) == target`인 상태를 찾는다.
    ///
    /// 포화 구간 안이면 지렛대 규칙으로 건도를 정하고, 밖이면 단상 구간에서 이분법.
    fn solve_at_pressure(
        fluid: Fluid,
        sub: &Substance,
        p: f64,
        target: f64,
        what: &str,
        key: fn(&StatePoint) -> f64,
    ) -> PropertyResult<StatePoint> {
        Self::check_pressure(fluid, p)?;
        if !target.is_finite() {
            return Err(PropertyError::OutOfRange {
                fluid,
                what: format!("{what} 값이 유한하지 않습니다"),
            });
        }

        let (mut t_low, mut t_high) = match Self::dome(fluid, sub, p) {
            Some(dome) => {
                let (k_l, k_v) = (key(&dome.liquid), key(&dome.vapor));
                if (k_l..=k_v).contains(&target) {
                    let q = ((target - k_l) / (k_v - k_l)).clamp(0.0, 1.0);
                    return Self::pq_point(fluid, sub, p, q);
                }
                let t_sat = dome.vapor.temperature_k;
                if target > k_v {
                    (t_sat + SAT_OFFSET_K, sub.t_max)
                } else {
                    (sub.t_min + SAT_OFFSET_K, dome.liquid.temperature_k - SAT_OFFSET_K)
                }
            }
            None => (sub.t_min + SAT_OFFSET_K, sub.t_max),
        };

        let low = key(&Self::pt_point(fluid, sub, p, t_low)?);
        let high = key(&Self::pt_point(fluid, sub, p, t_high)?);
        if target < low || target > high {
            return Err(PropertyError::OutOfRange {
                fluid,
                what: format!(
                    "{what} {target:.3}이(가) P={p:.1} Pa에서 {t_low:.2}~{t_high:.2} K 범위 밖입니다"
                ),
            });
        }

        for _ in 0..MAX_ITER {
            if t_high - t_low < T_TOL_K {
                break;
            }
            let t_mid = 0.5 * (t_low + t_high);
            if key(&Self::pt_point(fluid, sub, p, t_mid)?) < target {
                t_low = t_mid;
            } else {
                t_high = t_mid;
            }
        }
        Self::pt_point(fluid, sub, p, 0.5 * (t_low + t_high))
    }
}

impl PropertyBackend for CoolPropBackend {
    fn name(&self) -> &str {
        "coolprop"
    }

    fn supports(&self, fluid: Fluid) -> bool {
        substance(fluid).is_some()
    }

    fn state(&self, fluid: Fluid, input: StateInput) -> PropertyResult<StatePoint> {
        let sub = substance(fluid).ok_or_else(|| PropertyError::NotSupported {
            fluid,
            what: "CoolProp 백엔드에 등록되지 않은 유체".into(),
        })?;
        match input {
            StateInput::PT { p, t } => Self::pt_point(fluid, &sub, p, t),
            StateInput::PQ { p, q } => Self::pq_point(fluid, &sub, p, q),
            StateInput::TQ { t, q } => {
                check_quality(fluid, q)?;
                if !t.is_finite() || t < sub.t_min {
                    return Err(PropertyError::OutOfRange {
                        fluid,
                        what: format!("온도 {t:.2} K가 삼중점({:.2} K) 아래입니다", sub.t_min),
                    });
                }
                Self::evaluate(
                    fluid,
                    &sub,
                    FluidInput::temperature(t),
                    FluidInput::quality(q),
                    Some(q),
                    &format!("T={t:.3} K, x={q:.4}"),
                )
            }
            StateInput::PS { p, s } => {
                Self::solve_at_pressure(fluid, &sub, p, s, "비엔트로피", |st| st.entropy_j_per_kg_k)
            }
            StateInput::PH { p, h } => {
                Self::solve_at_pressure(fluid, &sub, p, h, "비엔탈피", |st| st.enthalpy_j_per_kg)
            }
        }
    }
}
