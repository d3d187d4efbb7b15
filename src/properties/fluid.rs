use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 계산에서 다루는 유체 종류.
///
/// 직렬화 이름은 요청 JSON과 이력 테이블에 그대로 쓰인다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fluid {
    Water,
    Air,
    Nitrogen,
    Oxygen,
    Methane,
    #[serde(rename = "CO2", alias = "CarbonDioxide")]
    CarbonDioxide,
}

impl Fluid {
    /// 지원 유체 전체 목록
    pub const ALL: [Fluid; 6] = [
        Fluid::Water,
        Fluid::Air,
        Fluid::Nitrogen,
        Fluid::Oxygen,
        Fluid::Methane,
        Fluid::CarbonDioxide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Fluid::Water => "Water",
            Fluid::Air => "Air",
            Fluid::Nitrogen => "Nitrogen",
            Fluid::Oxygen => "Oxygen",
            Fluid::Methane => "Methane",
            Fluid::CarbonDioxide => "CO2",
        }
    }
}

impl fmt::Display for Fluid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 알 수 없는 유체 이름
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("알 수 없는 유체: {0}")]
pub struct UnknownFluid(pub String);

impl FromStr for Fluid {
    type Err = UnknownFluid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" | "h2o" | "steam" => Ok(Fluid::Water),
            "air" => Ok(Fluid::Air),
            "nitrogen" | "n2" => Ok(Fluid::Nitrogen),
            "oxygen" | "o2" => Ok(Fluid::Oxygen),
            "methane" | "ch4" => Ok(Fluid::Methane),
            "co2" | "carbondioxide" | "carbon dioxide" => Ok(Fluid::CarbonDioxide),
            _ => Err(UnknownFluid(s.to_string())),
        }
    }
}
