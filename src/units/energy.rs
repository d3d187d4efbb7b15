use serde::{Deserialize, Serialize};

/// 출력용 에너지 단위. 비에너지(…/kg)에도 같은 배율을 쓴다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyUnit {
    Joule,
    Kilojoule,
    Megajoule,
    KiloCalorie,
    Btu,
}

impl EnergyUnit {
    /// 1 단위에 해당하는 줄
    fn joules(self) -> f64 {
        match self {
            EnergyUnit::Joule => 1.0,
            EnergyUnit::Kilojoule => 1.0e3,
            EnergyUnit::Megajoule => 1.0e6,
            EnergyUnit::KiloCalorie => 4_184.0,
            EnergyUnit::Btu => 1_055.06,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            EnergyUnit::Joule => "J",
            EnergyUnit::Kilojoule => "kJ",
            EnergyUnit::Megajoule => "MJ",
            EnergyUnit::KiloCalorie => "kcal",
            EnergyUnit::Btu => "Btu",
        }
    }
}

/// J 값을 표시 단위로 바꾼다.
pub fn joule_to(value_j: f64, unit: EnergyUnit) -> f64 {
    value_j / unit.joules()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_match_definitions() {
        assert_eq!(joule_to(2_500.0, EnergyUnit::Kilojoule), 2.5);
        assert!((joule_to(1.324e6, EnergyUnit::Megajoule) - 1.324).abs() < 1e-12);
        assert!((joule_to(4_184.0, EnergyUnit::KiloCalorie) - 1.0).abs() < 1e-12);
    }
}
