use serde::{Deserialize, Serialize};

/// Weather condition names accepted by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Fog,
    Thunderstorm,
    Drizzle,
    Unknown,
}

impl WeatherCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::Unknown => "Unknown",
        }
    }

    pub const fn all() -> &'static [WeatherCondition] {
        &[
            WeatherCondition::Clear,
            WeatherCondition::Cloudy,
            WeatherCondition::Rain,
            WeatherCondition::Snow,
            WeatherCondition::Fog,
            WeatherCondition::Thunderstorm,
            WeatherCondition::Drizzle,
            WeatherCondition::Unknown,
        ]
    }

    /// Exact, case-sensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == name)
    }

    /// Integer code expected by the model. `Unknown` shares code 0 with `Clear`.
    pub fn encode(&self) -> u8 {
        match self {
            WeatherCondition::Clear => 0,
            WeatherCondition::Cloudy => 1,
            WeatherCondition::Rain => 2,
            WeatherCondition::Snow => 3,
            WeatherCondition::Fog => 4,
            WeatherCondition::Thunderstorm => 5,
            WeatherCondition::Drizzle => 6,
            WeatherCondition::Unknown => 0,
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode a condition name; unrecognized or empty names encode as 0.
pub fn encode_condition_name(name: &str) -> u8 {
    WeatherCondition::from_name(name).map(|c| c.encode()).unwrap_or(0)
}

/// Bucket a WMO weather code (as reported by Open-Meteo) into a condition.
pub fn map_weather_code(code: i64) -> WeatherCondition {
    match code {
        0 => WeatherCondition::Clear,
        1..=3 => WeatherCondition::Cloudy,
        45 | 48 => WeatherCondition::Fog,
        51 | 53 | 55 | 61 | 63 | 65 => WeatherCondition::Rain,
        71 | 73 | 75 => WeatherCondition::Snow,
        95 | 96 | 99 => WeatherCondition::Thunderstorm,
        _ => WeatherCondition::Unknown,
    }
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn meters_to_miles(m: f64) -> f64 {
    m / 1609.0
}

pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh / 1.609
}

pub fn hpa_to_inhg(hpa: f64) -> f64 {
    hpa * 0.02953
}

/// Weather observation already converted to the units the form uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_f: f64,
    pub humidity_pct: f64,
    pub visibility_mi: f64,
    pub wind_speed_mph: f64,
    pub pressure_in: f64,
    pub condition: WeatherCondition,
}

impl WeatherReading {
    /// Build a reading from metric values as returned by the forecast service.
    pub fn from_metric(
        temperature_c: f64,
        humidity_pct: f64,
        visibility_m: f64,
        wind_speed_kmh: f64,
        pressure_hpa: f64,
        weather_code: i64,
    ) -> Self {
        Self {
            temperature_f: celsius_to_fahrenheit(temperature_c),
            humidity_pct,
            visibility_mi: meters_to_miles(visibility_m),
            wind_speed_mph: kmh_to_mph(wind_speed_kmh),
            pressure_in: hpa_to_inhg(pressure_hpa),
            condition: map_weather_code(weather_code),
        }
    }
}
