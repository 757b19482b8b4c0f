//! Serde helpers for the timestamps carried on a task spec.
//! Accepts `yyyy-MM-dd HH:mm:ss`, ISO-8601 without offset, or epoch millis.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{de, Deserialize, Deserializer};

const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Millis(i64),
    Text(String),
}

fn convert<E: de::Error>(raw: Raw) -> Result<Option<NaiveDateTime>, E> {
    match raw {
        Raw::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .map(|t| Some(t.with_timezone(&Local).naive_local()))
            .ok_or_else(|| E::custom(format!("timestamp {ms} out of range"))),
        Raw::Text(text) if text.trim().is_empty() => Ok(None),
        Raw::Text(text) => FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text.trim(), fmt).ok())
            .map(Some)
            .ok_or_else(|| E::custom(format!("unrecognized date-time \"{text}\""))),
    }
}

pub fn option<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Raw>::deserialize(deserializer)? {
        Some(raw) => convert(raw),
        None => Ok(None),
    }
}

/// Missing or blank values fall back to the current local time.
pub fn or_now<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(option(deserializer)?.unwrap_or_else(now))
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
