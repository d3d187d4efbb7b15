use serde::{Deserialize, Serialize};

/// 출력용 압력 단위. 모두 절대압이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureUnit {
    Pascal,
    KiloPascal,
    Bar,
    MegaPascal,
    Psi,
    Atm,
}

const PA_PER_BAR: f64 = 100_000.0;

impl PressureUnit {
    /// 1 단위에 해당하는 Pa
    fn pascals(self) -> f64 {
        match self {
            PressureUnit::Pascal => 1.0,
            PressureUnit::KiloPascal => 1.0e3,
            PressureUnit::Bar => PA_PER_BAR,
            PressureUnit::MegaPascal => 1.0e6,
            PressureUnit::Psi => 6_894.757,
            PressureUnit::Atm => 101_325.0,
        }
    }

    /// 출력용 단위 기호
    pub fn symbol(self) -> &'static str {
        match self {
            PressureUnit::Pascal => "Pa",
            PressureUnit::KiloPascal => "kPa",
            PressureUnit::Bar => "bar",
            PressureUnit::MegaPascal => "MPa",
            PressureUnit::Psi => "psia",
            PressureUnit::Atm => "atm",
        }
    }
}

/// Pa 값을 표시 단위로 바꾼다.
pub fn from_pascal(value_pa: f64, unit: PressureUnit) -> f64 {
    value_pa / unit.pascals()
}

/// bar(abs) → Pa. 요청 입력이 bar 기준이다.
pub fn bar_to_pa(value_bar: f64) -> f64 {
    value_bar * PA_PER_BAR
}

/// Pa → bar(abs)
pub fn pa_to_bar(value_pa: f64) -> f64 {
    value_pa / PA_PER_BAR
}
