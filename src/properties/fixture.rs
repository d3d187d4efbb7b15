use super::{Fluid, PropertyBackend, PropertyError, PropertyResult, StateInput, StatePoint};

/// 합성 물성표 백엔드.
///
/// 등록된 (유체, 입력) 조합과 상대오차 안에서 일치하는 조회에만 응답한다.
/// 실제 물성 라이브러리 없이 계산기의 산술을 검증할 때 쓴다.
#[derive(Debug, Clone)]
pub struct FixtureBackend {
    entries: Vec<(Fluid, StateInput, StatePoint)>,
    rel_tol: f64,
}

impl Default for FixtureBackend {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            rel_tol: 1e-9,
        }
    }
}

fn close(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs()).max(1.0)
}

fn same_input(a: StateInput, b: StateInput, tol: f64) -> bool {
    use StateInput::*;
    match (a, b) {
        (PT { p: p1, t: t1 }, PT { p: p2, t: t2 }) => close(p1, p2, tol) && close(t1, t2, tol),
        (PQ { p: p1, q: q1 }, PQ { p: p2, q: q2 }) => close(p1, p2, tol) && close(q1, q2, tol),
        (TQ { t: t1, q: q1 }, TQ { t: t2, q: q2 }) => close(t1, t2, tol) && close(q1, q2, tol),
        (PS { p: p1, s: s1 }, PS { p: p2, s: s2 }) => close(p1, p2, tol) && close(s1, s2, tol),
        (PH { p: p1, h: h1 }, PH { p: p2, h: h2 }) => close(p1, p2, tol) && close(h1, h2, tol),
        _ => false,
    }
}

impl FixtureBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 조회 일치 판정에 쓰는 상대오차를 바꾼다.
    pub fn with_tolerance(mut self, rel_tol: f64) -> Self {
        self.rel_tol = rel_tol;
        self
    }

    /// 상태 하나를 등록한다.
    pub fn with_state(mut self, fluid: Fluid, input: StateInput, point: StatePoint) -> Self {
        self.insert(fluid, input, point);
        self
    }

    pub fn insert(&mut self, fluid: Fluid, input: StateInput, point: StatePoint) {
        self.entries.push((fluid, input, point));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PropertyBackend for FixtureBackend {
    fn name(&self) -> &str {
        "fixture"
    }

    fn supports(&self, fluid: Fluid) -> bool {
        self.entries.iter().any(|(f, _, _)| *f == fluid)
    }

    fn state(&self, fluid: Fluid, input: StateInput) -> PropertyResult<StatePoint> {
        self.entries
            .iter()
            .find(|(f, i, _)| *f == fluid && same_input(*i, input, self.rel_tol))
            .map(|(_, _, point)| *point)
            .ok_or_else(|| PropertyError::OutOfRange {
                fluid,
                what: format!("물성표에 없는 상태 ({input})"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64) -> StatePoint {
        StatePoint {
            pressure_pa: 1.0e5,
            temperature_k: t,
            enthalpy_j_per_kg: 1.0,
            entropy_j_per_kg_k: 2.0,
            specific_volume_m3_per_kg: 0.5,
            internal_energy_j_per_kg: 0.5,
            quality: None,
        }
    }

    #[test]
    fn matches_within_tolerance_only() {
        let backend = FixtureBackend::new().with_state(
            Fluid::Air,
            StateInput::PT { p: 1.0e5, t: 300.0 },
            point(300.0),
        );
        let hit = backend.state(
            Fluid::Air,
            StateInput::PT {
                p: 1.0e5 * (1.0 + 1e-12),
                t: 300.0,
            },
        );
        assert_eq!(hit.unwrap().temperature_k, 300.0);
        assert!(backend
            .state(Fluid::Air, StateInput::PT { p: 1.0e5, t: 301.0 })
            .is_err());
        assert!(backend
            .state(Fluid::Nitrogen, StateInput::PT { p: 1.0e5, t: 300.0 })
            .is_err());
        assert!(!backend.supports(Fluid::Water));
    }
}
