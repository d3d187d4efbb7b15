//! IAPWS-IF97 물/증기 물성을 seuif97 크레이트로 위임한 백엔드.
//! seuif97 입출력: 압력 MPa, 온도 °C, h/s kJ 기준. 여기서 SI(Pa, K, J)로 바꾼다.

use seuif97::{ph, ps, pt, px, tx, OH, OP, OS, OT, OV};

use super::{
    check_quality, validate_point, Fluid, PropertyBackend, PropertyError, PropertyResult,
    StateInput, StatePoint,
};
use crate::units::ZERO_CELSIUS_K;

/// 삼중점 압력 [Pa]
const P_TRIPLE_PA: f64 = 611.212_677;
/// 삼중점 온도 [K]
const T_TRIPLE_K: f64 = 273.16;
/// 임계 압력 [Pa]
const P_CRIT_PA: f64 = 22.064e6;
/// 임계 온도 [K]
const T_CRIT_K: f64 = 647.096;
/// Region 1~3 상한
const P_MAX_PA: f64 = 100.0e6;
const T_MAX_K: f64 = 1073.15;
/// Region 5 상한 (고온은 50 MPa 이하에서만)
const P_MAX_REGION5_PA: f64 = 50.0e6;
const T_MAX_REGION5_K: f64 = 2273.15;
/// 역계산 결과의 하한 판정 허용오차 [K]
const T_FLOOR_TOL_K: f64 = 1.0e-3;
/// 역방정식 온도 보정 (뉴턴법)
const REFINE_MAX_ITER: usize = 30;
const REFINE_DT_C: f64 = 1.0e-4;
const REFINE_MAX_STEP_C: f64 = 1.0;
const REFINE_REL_TOL: f64 = 1.0e-12;

/// 물/증기 전용 IF97 백엔드.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iapws97Backend;

fn mpa(p_pa: f64) -> f64 {
    p_pa / 1.0e6
}

fn out_of_range(what: String) -> PropertyError {
    PropertyError::OutOfRange {
        fluid: Fluid::Water,
        what,
    }
}

/// 압력·온도가 IF97 적용 범위 안인지 확인한다.
fn check_pt_range(p_pa: f64, t_k: f64) -> PropertyResult<()> {
    if !(p_pa > 0.0 && p_pa <= P_MAX_PA) {
        return Err(out_of_range(format!(
            "압력 {p_pa:.1} Pa (0 초과 100 MPa 이하만 계산 가능)"
        )));
    }
    if t_k < ZERO_CELSIUS_K - T_FLOOR_TOL_K {
        return Err(out_of_range(format!(
            "온도 {t_k:.3} K가 IF97 하한 273.15 K보다 낮습니다"
        )));
    }
    let upper = if p_pa <= P_MAX_REGION5_PA {
        T_MAX_REGION5_K
    } else {
        T_MAX_K
    };
    if t_k > upper {
        return Err(out_of_range(format!(
            "온도 {t_k:.3} K가 상한 {upper} K를 넘습니다"
        )));
    }
    Ok(())
}

/// 역방정식(ps, ph)의 온도를 정방향 `pt` 식에 맞춘다.
///
/// IF97 역방정식은 정방향 식과 수 mK까지 어긋날 수 있어, 압축액처럼 상태 변화가
/// 작은 곳에서는 그 오차가 에너지 차이를 덮는다. 단상 영역에서만 쓴다.
/// 수렴하지 않으면 역방정식 온도를 그대로 돌려준다.
fn refine_temperature(p_pa: f64, t_c: f64, target: f64, o_id: i32) -> f64 {
    let p = mpa(p_pa);
    let tol = REFINE_REL_TOL * target.abs().max(1.0);
    let mut t = t_c;
    for _ in 0..REFINE_MAX_ITER {
        let value = pt(p, t, o_id);
        let residual = value - target;
        if residual.abs() <= tol {
            return t;
        }
        let slope = (pt(p, t + REFINE_DT_C, o_id) - value) / REFINE_DT_C;
        if !(slope.is_finite() && slope > 0.0) {
            break;
        }
        let step = residual / slope;
        if !step.is_finite() || step.abs() > REFINE_MAX_STEP_C {
            break;
        }
        t -= step;
    }
    tracing::debug!(p_pa, t_c, target, o_id, "IF97 역방정식 온도 보정 실패");
    t_c
}

fn check_saturation_pressure(p_pa: f64) -> PropertyResult<()> {
    if !(P_TRIPLE_PA..P_CRIT_PA).contains(&p_pa) {
        return Err(out_of_range(format!(
            "포화 압력 {p_pa:.1} Pa (삼중점~임계점 사이만 포화 상태 존재)"
        )));
    }
    Ok(())
}

impl Iapws97Backend {
    pub fn new() -> Self {
        Self
    }

    /// seuif97 출력(°C, kJ)을 상태점으로 조립한다.
    fn assemble(
        p_pa: f64,
        t_c: f64,
        h_kj: f64,
        s_kj: f64,
        v: f64,
        quality: Option<f64>,
    ) -> PropertyResult<StatePoint> {
        let h = h_kj * 1000.0;
        let point = StatePoint {
            pressure_pa: p_pa,
            temperature_k: t_c + ZERO_CELSIUS_K,
            enthalpy_j_per_kg: h,
            entropy_j_per_kg_k: s_kj * 1000.0,
            specific_volume_m3_per_kg: v,
            internal_energy_j_per_kg: h - p_pa * v,
            quality,
        };
        validate_point(Fluid::Water, point)
    }

    /// 포화 돔 내부라면 엔탈피로 건도를 구한다.
    fn dome_quality(p_pa: f64, h_kj: f64) -> Option<f64> {
        if !(P_TRIPLE_PA..P_CRIT_PA).contains(&p_pa) {
            return None;
        }
        let hf = px(mpa(p_pa), 0.0, OH);
        let hg = px(mpa(p_pa), 1.0, OH);
        if !(hf.is_finite() && hg.is_finite()) || hg <= hf {
            return None;
        }
        if h_kj >= hf && h_kj <= hg {
            Some(((h_kj - hf) / (hg - hf)).clamp(0.0, 1.0))
        } else {
            None
        }
    }

    /// 역계산(PS, PH)으로 얻은 온도가 적용 범위 안인지 확인한 뒤 상태를 만든다.
    fn inverse_state(p_pa: f64, t_c: f64, h_kj: f64, s_kj: f64, v: f64) -> PropertyResult<StatePoint> {
        if !t_c.is_finite() {
            return Err(PropertyError::Backend {
                fluid: Fluid::Water,
                what: "역계산 온도가 수렴하지 않았습니다".into(),
            });
        }
        check_pt_range(p_pa, t_c + ZERO_CELSIUS_K)?;
        let quality = Self::dome_quality(p_pa, h_kj);
        Self::assemble(p_pa, t_c, h_kj, s_kj, v, quality)
    }
}

impl PropertyBackend for Iapws97Backend {
    fn name(&self) -> &str {
        "IAPWS-IF97"
    }

    fn supports(&self, fluid: Fluid) -> bool {
        fluid == Fluid::Water
    }

    fn state(&self, fluid: Fluid, input: StateInput) -> PropertyResult<StatePoint> {
        if fluid != Fluid::Water {
            return Err(PropertyError::NotSupported {
                fluid,
                what: "IF97은 물/증기 전용".into(),
            });
        }
        match input {
            StateInput::PT { p, t } => {
                check_pt_range(p, t)?;
                let t_c = t - ZERO_CELSIUS_K;
                let h = pt(mpa(p), t_c, OH);
                let s = pt(mpa(p), t_c, OS);
                let v = pt(mpa(p), t_c, OV);
                Self::assemble(p, t_c, h, s, v, None)
            }
            StateInput::PQ { p, q } => {
                check_quality(fluid, q)?;
                check_saturation_pressure(p)?;
                let t_c = px(mpa(p), q, OT);
                let h = px(mpa(p), q, OH);
                let s = px(mpa(p), q, OS);
                let v = px(mpa(p), q, OV);
                Self::assemble(p, t_c, h, s, v, Some(q))
            }
            StateInput::TQ { t, q } => {
                check_quality(fluid, q)?;
                if !(T_TRIPLE_K..T_CRIT_K).contains(&t) {
                    return Err(out_of_range(format!(
                        "포화 온도 {t:.3} K (삼중점~임계점 사이만 포화 상태 존재)"
                    )));
                }
                let t_c = t - ZERO_CELSIUS_K;
                let p_pa = tx(t_c, q, OP) * 1.0e6;
                let h = tx(t_c, q, OH);
                let s = tx(t_c, q, OS);
                let v = tx(t_c, q, OV);
                Self::assemble(p_pa, t_c, h, s, v, Some(q))
            }
            StateInput::PS { p, s } => {
                check_pt_range(p, ZERO_CELSIUS_K)?;
                let s_kj = s / 1000.0;
                let t_c = ps(mpa(p), s_kj, OT);
                let h = ps(mpa(p), s_kj, OH);
                if t_c.is_finite() && Self::dome_quality(p, h).is_none() {
                    let t_c = refine_temperature(p, t_c, s_kj, OS);
                    let h = pt(mpa(p), t_c, OH);
                    let v = pt(mpa(p), t_c, OV);
                    return Self::inverse_state(p, t_c, h, s_kj, v);
                }
                let v = ps(mpa(p), s_kj, OV);
                Self::inverse_state(p, t_c, h, s_kj, v)
            }
            StateInput::PH { p, h } => {
                check_pt_range(p, ZERO_CELSIUS_K)?;
                let h_kj = h / 1000.0;
                let t_c = ph(mpa(p), h_kj, OT);
                if t_c.is_finite() && Self::dome_quality(p, h_kj).is_none() {
                    let t_c = refine_temperature(p, t_c, h_kj, OH);
                    let s = pt(mpa(p), t_c, OS);
                    let v = pt(mpa(p), t_c, OV);
                    return Self::inverse_state(p, t_c, h_kj, s, v);
                }
                let s = ph(mpa(p), h_kj, OS);
                let v = ph(mpa(p), h_kj, OV);
                Self::inverse_state(p, t_c, h_kj, s, v)
            }
        }
    }

    fn saturation_temperature(&self, fluid: Fluid, p: f64) -> PropertyResult<f64> {
        if fluid != Fluid::Water {
            return Err(PropertyError::NotSupported {
                fluid,
                what: "IF97은 물/증기 전용".into(),
            });
        }
        check_saturation_pressure(p)?;
        let t_c = px(mpa(p), 1.0, OT);
        if !t_c.is_finite() {
            return Err(PropertyError::Backend {
                fluid,
                what: "포화온도 계산 실패".into(),
            });
        }
        Ok(t_c + ZERO_CELSIUS_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_other_fluids() {
        let err = Iapws97Backend
            .state(Fluid::Air, StateInput::PT { p: 1.0e5, t: 300.0 })
            .unwrap_err();
        assert!(matches!(err, PropertyError::NotSupported { .. }));
    }

    #[test]
    fn supercritical_saturation_is_out_of_range() {
        let err = Iapws97Backend
            .state(Fluid::Water, StateInput::PQ { p: 25.0e6, q: 1.0 })
            .unwrap_err();
        assert!(matches!(err, PropertyError::OutOfRange { .. }));
    }

    #[test]
    fn below_freezing_is_out_of_range() {
        let err = Iapws97Backend
            .state(Fluid::Water, StateInput::PT { p: 1.0e5, t: 260.0 })
            .unwrap_err();
        assert!(matches!(err, PropertyError::OutOfRange { .. }));
    }

    #[test]
    fn compressed_liquid_entropy_inverse_matches_forward_equation() {
        let backend = Iapws97Backend;
        let inlet = backend
            .state(Fluid::Water, StateInput::PT { p: 35.0e5, t: 313.15 })
            .unwrap();
        let outlet = backend
            .state(
                Fluid::Water,
                StateInput::PS {
                    p: 1.0e5,
                    s: inlet.entropy_j_per_kg_k,
                },
            )
            .unwrap();
        let t_c = outlet.temperature_k - ZERO_CELSIUS_K;
        let s_forward = pt(0.1, t_c, OS) * 1000.0;
        assert!((s_forward - inlet.entropy_j_per_kg_k).abs() < 1e-8, "s={s_forward}");
        assert_eq!(outlet.enthalpy_j_per_kg, pt(0.1, t_c, OH) * 1000.0);
        // 압축액 등엔트로피 팽창: 약 10 mK 냉각
        let dt = inlet.temperature_k - outlet.temperature_k;
        assert!(dt > 0.0 && dt < 0.05, "dT={dt}");
    }

    #[test]
    fn superheated_enthalpy_inverse_matches_forward_equation() {
        let backend = Iapws97Backend;
        let a = backend
            .state(Fluid::Water, StateInput::PT { p: 30.0e5, t: 623.15 })
            .unwrap();
        let b = backend
            .state(
                Fluid::Water,
                StateInput::PH {
                    p: 30.0e5,
                    h: a.enthalpy_j_per_kg,
                },
            )
            .unwrap();
        assert!((b.temperature_k - 623.15).abs() < 1e-8, "T={}", b.temperature_k);
        assert!((b.entropy_j_per_kg_k - a.entropy_j_per_kg_k).abs() < 1e-6);
    }

    #[test]
    fn saturation_at_one_atmosphere() {
        let t_sat = Iapws97Backend
            .saturation_temperature(Fluid::Water, 101_325.0)
            .unwrap();
        assert!((t_sat - 373.124).abs() < 0.05, "t_sat={t_sat}");
    }
}
