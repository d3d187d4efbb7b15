use serde::{Deserialize, Serialize};

/// 출력용 온도 단위. 계산은 항상 켈빈으로 한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    Kelvin,
    Celsius,
    Fahrenheit,
    Rankine,
}

/// 0°C에 해당하는 켈빈 값
pub const ZERO_CELSIUS_K: f64 = 273.15;

/// 요청 입력(°C)을 절대온도로 바꾼다.
pub fn celsius_to_kelvin(value_c: f64) -> f64 {
    value_c + ZERO_CELSIUS_K
}

/// 켈빈 값을 표시 단위로 바꾼다.
pub fn from_kelvin(value_k: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Kelvin => value_k,
        TemperatureUnit::Celsius => value_k - ZERO_CELSIUS_K,
        TemperatureUnit::Fahrenheit => value_k * 1.8 - 459.67,
        TemperatureUnit::Rankine => value_k * 1.8,
    }
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Kelvin => "K",
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Rankine => "°R",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boiling_point_in_each_unit() {
        let t = celsius_to_kelvin(100.0);
        assert!((t - 373.15).abs() < 1e-12);
        assert!((from_kelvin(t, TemperatureUnit::Celsius) - 100.0).abs() < 1e-9);
        assert!((from_kelvin(t, TemperatureUnit::Fahrenheit) - 212.0).abs() < 1e-9);
        assert!((from_kelvin(t, TemperatureUnit::Rankine) - 671.67).abs() < 1e-9);
    }
}
