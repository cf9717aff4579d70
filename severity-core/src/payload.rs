//! Feature payload sent to the inference endpoint.
//!
//! The model expects every field on every request, so fields the form does not
//! collect are filled with fixed placeholders rather than omitted.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::model::FormState;

/// Parse user text as a number; anything unparsable (or non-finite) becomes 0.
pub fn coerce_number(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Request body understood by the scoring endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub input_data: Vec<FeatureRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "Start_Lat")]
    pub start_lat: f64,
    #[serde(rename = "Start_Lng")]
    pub start_lng: f64,
    #[serde(rename = "Distance(mi)")]
    pub distance_mi: u8,

    #[serde(rename = "Temperature(F)")]
    pub temperature_f: f64,
    #[serde(rename = "Humidity(%)")]
    pub humidity_pct: f64,
    #[serde(rename = "Visibility(mi)")]
    pub visibility_mi: f64,
    #[serde(rename = "Wind_Speed(mph)")]
    pub wind_speed_mph: f64,
    #[serde(rename = "Pressure(in)")]
    pub pressure_in: f64,
    #[serde(rename = "Wind_Chill(F)")]
    pub wind_chill_f: f64,
    #[serde(rename = "Precipitation(in)")]
    pub precipitation_in: u8,

    #[serde(rename = "Weather_Condition")]
    pub weather_condition: u8,
    #[serde(rename = "Wind_Direction")]
    pub wind_direction: u8,
    #[serde(rename = "Sunrise_Sunset")]
    pub sunrise_sunset: u8,
    #[serde(rename = "Civil_Twilight")]
    pub civil_twilight: u8,
    #[serde(rename = "Nautical_Twilight")]
    pub nautical_twilight: u8,
    #[serde(rename = "Astronomical_Twilight")]
    pub astronomical_twilight: u8,

    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Hour")]
    pub hour: u32,
    /// 0 = Sunday.
    #[serde(rename = "Weekday")]
    pub weekday: u32,
    #[serde(rename = "Duration_Minutes")]
    pub duration_minutes: f64,

    #[serde(rename = "Airport_Code")]
    pub airport_code: u8,
    #[serde(rename = "City")]
    pub city: u8,
    #[serde(rename = "County")]
    pub county: u8,
    #[serde(rename = "State")]
    pub state: u8,
    #[serde(rename = "Zipcode")]
    pub zipcode: u8,
    #[serde(rename = "Country")]
    pub country: u8,
    #[serde(rename = "Timezone")]
    pub timezone: u8,
    #[serde(rename = "Station")]
    pub station: u8,
    #[serde(rename = "Weather_Timestamp")]
    pub weather_timestamp: u8,

    #[serde(rename = "Crossing")]
    pub crossing: bool,
    #[serde(rename = "Give_Way")]
    pub give_way: bool,
    #[serde(rename = "Junction")]
    pub junction: bool,
    #[serde(rename = "No_Exit")]
    pub no_exit: bool,
    #[serde(rename = "Railway")]
    pub railway: bool,
    #[serde(rename = "Roundabout")]
    pub roundabout: bool,
    #[serde(rename = "Stop")]
    pub stop: bool,
    #[serde(rename = "Traffic_Signal")]
    pub traffic_signal: bool,
    #[serde(rename = "Amenity")]
    pub amenity: bool,
    #[serde(rename = "Bump")]
    pub bump: bool,
    #[serde(rename = "Turning_Loop")]
    pub turning_loop: bool,
    #[serde(rename = "Traffic_Calming")]
    pub traffic_calming: bool,
}

/// Daylight is approximated as 06:00 up to (not including) 18:00.
fn is_daytime(hour: u32) -> bool {
    (6..18).contains(&hour)
}

/// Derive the full feature record from the form. `now` stands in for a missing date/time.
pub fn build_record(form: &FormState, now: NaiveDateTime) -> FeatureRecord {
    let at = form.date_time.unwrap_or(now);
    let temperature_f = coerce_number(&form.temperature_f);

    FeatureRecord {
        start_lat: coerce_number(&form.latitude),
        start_lng: coerce_number(&form.longitude),
        distance_mi: 0,

        temperature_f,
        humidity_pct: coerce_number(&form.humidity_pct),
        visibility_mi: coerce_number(&form.visibility_mi),
        wind_speed_mph: coerce_number(&form.wind_speed_mph),
        pressure_in: coerce_number(&form.pressure_in),
        wind_chill_f: temperature_f,
        precipitation_in: 0,

        weather_condition: form.weather_condition.map(|c| c.encode()).unwrap_or(0),
        wind_direction: 0,
        sunrise_sunset: u8::from(is_daytime(at.hour())),
        civil_twilight: 1,
        nautical_twilight: 1,
        astronomical_twilight: 1,

        year: at.year(),
        month: at.month(),
        day: at.day(),
        hour: at.hour(),
        weekday: at.weekday().num_days_from_sunday(),
        duration_minutes: coerce_number(&form.duration_min),

        airport_code: 0,
        city: 0,
        county: 0,
        state: 0,
        zipcode: 0,
        country: 0,
        timezone: 0,
        station: 0,
        weather_timestamp: 0,

        crossing: form.crossing,
        give_way: form.give_way,
        junction: form.junction,
        no_exit: form.no_exit,
        railway: form.railway,
        roundabout: form.roundabout,
        stop: form.stop,
        traffic_signal: false,
        amenity: false,
        bump: false,
        turning_loop: false,
        traffic_calming: false,
    }
}

pub fn build_payload(form: &FormState, now: NaiveDateTime) -> ScoringRequest {
    ScoringRequest { input_data: vec![build_record(form, now)] }
}
