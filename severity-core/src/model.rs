use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::weather::{WeatherCondition, WeatherReading};

/// Coordinates and optional target time for a weather lookup.
#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Local date/time to look up; `None` means current conditions.
    pub when: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Road features the user can tick on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadFeature {
    Crossing,
    GiveWay,
    Junction,
    NoExit,
    Railway,
    Roundabout,
    Stop,
}

impl RoadFeature {
    /// Field name used by the model.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadFeature::Crossing => "Crossing",
            RoadFeature::GiveWay => "Give_Way",
            RoadFeature::Junction => "Junction",
            RoadFeature::NoExit => "No_Exit",
            RoadFeature::Railway => "Railway",
            RoadFeature::Roundabout => "Roundabout",
            RoadFeature::Stop => "Stop",
        }
    }

    /// Human label, e.g. "Give Way".
    pub fn label(&self) -> String {
        self.as_str().replacen('_', " ", 1)
    }

    pub const fn all() -> &'static [RoadFeature] {
        &[
            RoadFeature::Crossing,
            RoadFeature::GiveWay,
            RoadFeature::Junction,
            RoadFeature::NoExit,
            RoadFeature::Railway,
            RoadFeature::Roundabout,
            RoadFeature::Stop,
        ]
    }
}

impl std::fmt::Display for RoadFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RoadFeature {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.replace([' ', '-'], "_").to_lowercase();

        RoadFeature::all()
            .iter()
            .copied()
            .find(|f| f.as_str().to_lowercase() == normalized)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown road feature '{value}'. Supported: crossing, give_way, junction, \
                     no_exit, railway, roundabout, stop."
                )
            })
    }
}

/// Everything the user has entered so far.
///
/// Numeric fields are kept as the text the user typed; coercion happens
/// only when the feature payload is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub date_time: Option<NaiveDateTime>,
    pub duration_min: String,
    pub latitude: String,
    pub longitude: String,
    pub temperature_f: String,
    pub humidity_pct: String,
    pub visibility_mi: String,
    pub wind_speed_mph: String,
    pub pressure_in: String,
    pub weather_condition: Option<WeatherCondition>,
    pub crossing: bool,
    pub give_way: bool,
    pub junction: bool,
    pub no_exit: bool,
    pub railway: bool,
    pub roundabout: bool,
    pub stop: bool,
}

/// A single field edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FormUpdate {
    DateTime(NaiveDateTime),
    Duration(String),
    Latitude(String),
    Longitude(String),
    Temperature(String),
    Humidity(String),
    Visibility(String),
    WindSpeed(String),
    Pressure(String),
    /// Condition selected by name; anything not in the closed set clears the selection.
    WeatherCondition(String),
    Flag(RoadFeature, bool),
}

impl FormState {
    /// Merge one update, returning the new snapshot.
    pub fn apply(mut self, update: FormUpdate) -> Self {
        match update {
            FormUpdate::DateTime(dt) => self.date_time = Some(dt),
            FormUpdate::Duration(v) => self.duration_min = v,
            FormUpdate::Latitude(v) => self.latitude = v,
            FormUpdate::Longitude(v) => self.longitude = v,
            FormUpdate::Temperature(v) => self.temperature_f = v,
            FormUpdate::Humidity(v) => self.humidity_pct = v,
            FormUpdate::Visibility(v) => self.visibility_mi = v,
            FormUpdate::WindSpeed(v) => self.wind_speed_mph = v,
            FormUpdate::Pressure(v) => self.pressure_in = v,
            FormUpdate::WeatherCondition(name) => {
                self.weather_condition = WeatherCondition::from_name(&name)
            }
            FormUpdate::Flag(feature, on) => *self.flag_mut(feature) = on,
        }
        self
    }

    pub fn flag(&self, feature: RoadFeature) -> bool {
        match feature {
            RoadFeature::Crossing => self.crossing,
            RoadFeature::GiveWay => self.give_way,
            RoadFeature::Junction => self.junction,
            RoadFeature::NoExit => self.no_exit,
            RoadFeature::Railway => self.railway,
            RoadFeature::Roundabout => self.roundabout,
            RoadFeature::Stop => self.stop,
        }
    }

    fn flag_mut(&mut self, feature: RoadFeature) -> &mut bool {
        match feature {
            RoadFeature::Crossing => &mut self.crossing,
            RoadFeature::GiveWay => &mut self.give_way,
            RoadFeature::Junction => &mut self.junction,
            RoadFeature::NoExit => &mut self.no_exit,
            RoadFeature::Railway => &mut self.railway,
            RoadFeature::Roundabout => &mut self.roundabout,
            RoadFeature::Stop => &mut self.stop,
        }
    }

    /// Write located coordinates with six decimals.
    pub fn with_coordinates(self, coords: Coordinates) -> Self {
        self.apply(FormUpdate::Latitude(format!("{:.6}", coords.latitude)))
            .apply(FormUpdate::Longitude(format!("{:.6}", coords.longitude)))
    }

    /// Overwrite the weather fields with a converted reading.
    pub fn with_weather(mut self, reading: &WeatherReading) -> Self {
        self.temperature_f = format!("{:.1}", reading.temperature_f);
        self.humidity_pct = reading.humidity_pct.to_string();
        self.visibility_mi = format!("{:.2}", reading.visibility_mi);
        self.wind_speed_mph = format!("{:.1}", reading.wind_speed_mph);
        self.pressure_in = format!("{:.2}", reading.pressure_in);
        self.weather_condition = Some(reading.condition);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_returns_new_snapshot_and_keeps_the_old_one() {
        let before = FormState::default();
        let after = before.clone().apply(FormUpdate::Latitude("40.1".into()));

        assert_eq!(before.latitude, "");
        assert_eq!(after.latitude, "40.1");
    }

    #[test]
    fn unknown_condition_name_clears_selection() {
        let form = FormState::default()
            .apply(FormUpdate::WeatherCondition("Snow".into()))
            .apply(FormUpdate::WeatherCondition("Sleet".into()));

        assert_eq!(form.weather_condition, None);
    }

    #[test]
    fn flags_toggle_independently() {
        let form = FormState::default()
            .apply(FormUpdate::Flag(RoadFeature::GiveWay, true))
            .apply(FormUpdate::Flag(RoadFeature::Stop, true))
            .apply(FormUpdate::Flag(RoadFeature::Stop, false));

        assert!(form.flag(RoadFeature::GiveWay));
        assert!(!form.flag(RoadFeature::Stop));
        assert!(!form.flag(RoadFeature::Crossing));
    }

    #[test]
    fn coordinates_are_written_with_six_decimals() {
        let form = FormState::default().with_coordinates(Coordinates {
            latitude: 39.5,
            longitude: -98.35,
        });

        assert_eq!(form.latitude, "39.500000");
        assert_eq!(form.longitude, "-98.350000");
    }

    #[test]
    fn weather_reading_is_formatted_into_text_fields() {
        let reading = WeatherReading {
            temperature_f: 68.04,
            humidity_pct: 55.0,
            visibility_mi: 9.876,
            wind_speed_mph: 12.34,
            pressure_in: 29.9139,
            condition: WeatherCondition::Fog,
        };

        let form = FormState::default().with_weather(&reading);

        assert_eq!(form.temperature_f, "68.0");
        assert_eq!(form.humidity_pct, "55");
        assert_eq!(form.visibility_mi, "9.88");
        assert_eq!(form.wind_speed_mph, "12.3");
        assert_eq!(form.pressure_in, "29.91");
        assert_eq!(form.weather_condition, Some(WeatherCondition::Fog));
    }

    #[test]
    fn road_feature_parses_loose_names() {
        assert_eq!(RoadFeature::try_from("give way").unwrap(), RoadFeature::GiveWay);
        assert_eq!(RoadFeature::try_from("No_Exit").unwrap(), RoadFeature::NoExit);
        assert!(RoadFeature::try_from("bridge").is_err());
        assert_eq!(RoadFeature::NoExit.label(), "No Exit");
    }
}
