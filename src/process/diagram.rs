//! 랭킨 사이클 T-s / P-v 선도용 데이터.
//! 포화 돔 계산이 실패해도 사이클 자체 결과는 유지하고 돔만 비워 둔다.

use serde::{Deserialize, Serialize};

use super::rankine::{CyclePoint, RankineResult};
use crate::properties::{Fluid, PropertyBackend, PropertyResult, StateInput};
use crate::units::pa_to_bar;

/// 돔 온도 범위 [K]
const DOME_T_MIN_K: f64 = 273.16;
const DOME_T_MAX_K: f64 = 640.0;
/// 기본 돔 점 개수
pub const DOME_POINTS: usize = 50;

/// 포화 돔 곡선 (온도별 포화수/포화증기 엔트로피)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaturationDome {
    pub temperature_k: Vec<f64>,
    pub entropy_liquid: Vec<f64>,
    pub entropy_vapor: Vec<f64>,
}

impl SaturationDome {
    pub fn is_empty(&self) -> bool {
        self.temperature_k.is_empty()
    }
}

/// 선도 데이터. 사이클 경로는 1→2→3→4→1로 닫힌다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleDiagram {
    pub dome: SaturationDome,
    /// T-s 선도 x축 [J/(kg·K)]
    pub cycle_entropy: Vec<f64>,
    /// T-s 선도 y축 [K]
    pub cycle_temperature_k: Vec<f64>,
    /// P-v 선도 x축 [m³/kg]
    pub cycle_specific_volume: Vec<f64>,
    /// P-v 선도 y축 [bar]
    pub cycle_pressure_bar: Vec<f64>,
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// 삼중점~640 K 사이 포화 돔을 계산한다.
pub fn saturation_dome(
    backend: &dyn PropertyBackend,
    fluid: Fluid,
    points: usize,
) -> PropertyResult<SaturationDome> {
    let temperature_k = linspace(DOME_T_MIN_K, DOME_T_MAX_K, points);
    let mut entropy_liquid = Vec::with_capacity(points);
    let mut entropy_vapor = Vec::with_capacity(points);
    for &t in &temperature_k {
        let liquid = backend.state(fluid, StateInput::TQ { t, q: 0.0 })?;
        let vapor = backend.state(fluid, StateInput::TQ { t, q: 1.0 })?;
        entropy_liquid.push(liquid.entropy_j_per_kg_k);
        entropy_vapor.push(vapor.entropy_j_per_kg_k);
    }
    Ok(SaturationDome {
        temperature_k,
        entropy_liquid,
        entropy_vapor,
    })
}

/// 계산된 사이클로 선도 데이터를 만든다.
pub fn cycle_diagram(backend: &dyn PropertyBackend, result: &RankineResult) -> CycleDiagram {
    let dome = match saturation_dome(backend, result.fluid, DOME_POINTS) {
        Ok(dome) => dome,
        Err(err) => {
            tracing::warn!(error = %err, "포화 돔 계산 실패, 선도에서 돔을 생략합니다");
            SaturationDome::default()
        }
    };

    let closed: Vec<_> = CyclePoint::ORDER
        .iter()
        .chain(std::iter::once(&CyclePoint::PumpInlet))
        .filter_map(|&p| result.state(p))
        .collect();

    CycleDiagram {
        dome,
        cycle_entropy: closed.iter().map(|s| s.entropy_j_per_kg_k).collect(),
        cycle_temperature_k: closed.iter().map(|s| s.temperature_k).collect(),
        cycle_specific_volume: closed
            .iter()
            .map(|s| s.specific_volume_m3_per_kg)
            .collect(),
        cycle_pressure_bar: closed.iter().map(|s| pa_to_bar(s.pressure_pa)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_ends() {
        let v = linspace(273.16, 640.0, 50);
        assert_eq!(v.len(), 50);
        assert_eq!(v[0], 273.16);
        assert!((v[49] - 640.0).abs() < 1e-9);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
