//! 입력 경계(bar, °C)와 출력 표시에 쓰는 단위 변환.
//! 계산 내부는 항상 SI(Pa, K, J/kg)로 통일한다.

pub mod energy;
pub mod pressure;
pub mod temperature;

pub use energy::{joule_to, EnergyUnit};
pub use pressure::{bar_to_pa, from_pascal, pa_to_bar, PressureUnit};
pub use temperature::{celsius_to_kelvin, from_kelvin, TemperatureUnit, ZERO_CELSIUS_K};
