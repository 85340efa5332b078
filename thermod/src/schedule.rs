//! The weekly schedule matrix: day, hour and quarter keyed target
//! temperatures, as stored in the timetable JSON document.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Weekday;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Day of week, serialized with the lowercase English names used as JSON
/// keys of the timetable document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Day {
        match weekday {
            Weekday::Mon => Day::Monday,
            Weekday::Tue => Day::Tuesday,
            Weekday::Wed => Day::Wednesday,
            Weekday::Thu => Day::Thursday,
            Weekday::Fri => Day::Friday,
            Weekday::Sat => Day::Saturday,
            Weekday::Sun => Day::Sunday,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hour key of the schedule, rendered as `h00`..`h23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u8);

impl Hour {
    pub fn new(hour: u8) -> Option<Hour> {
        (hour < 24).then_some(Hour(hour))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Hour> {
        (0..24).map(Hour)
    }

    /// Parses `h07`, `h7` or a bare `7`.
    fn parse(raw: &str) -> Option<Hour> {
        let digits = raw.strip_prefix('h').unwrap_or(raw);
        digits.parse().ok().and_then(Hour::new)
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{:02}", self.0)
    }
}

impl Serialize for Hour {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hour {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Hour, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Hour::parse(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "the provided hour `{raw}` is not valid, it must be in range 0-23 \
                 with an optional leading `h`"
            ))
        })
    }
}

/// A single cell of the schedule: a symbolic setpoint resolved through the
/// settings block, or a literal temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    T0,
    Tmin,
    Tmax,
    Degrees(f64),
}

impl Target {
    /// Builds a literal target, rejecting non-finite values.
    ///
    /// Literals are rounded to one decimal so the persisted document stays
    /// stable against sensor-grade noise.
    pub fn degrees(value: f64) -> Option<Target> {
        value
            .is_finite()
            .then(|| Target::Degrees((value * 10.0).round() / 10.0))
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Target::T0 => serializer.serialize_str("t0"),
            Target::Tmin => serializer.serialize_str("tmin"),
            Target::Tmax => serializer.serialize_str("tmax"),
            Target::Degrees(value) => serializer.serialize_str(&format!("{value:.1}")),
        }
    }
}

struct TargetVisitor;

impl Visitor<'_> for TargetVisitor {
    type Value = Target;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("`t0`, `tmin`, `tmax` or a finite number")
    }

    fn visit_str<E: de::Error>(self, raw: &str) -> Result<Target, E> {
        match raw {
            "t0" => Ok(Target::T0),
            "tmin" => Ok(Target::Tmin),
            "tmax" => Ok(Target::Tmax),
            _ => raw
                .parse::<f64>()
                .ok()
                .and_then(Target::degrees)
                .ok_or_else(|| {
                    E::custom(format!(
                        "the provided temperature `{raw}` is not valid, it must be \
                         a number or one of t0, tmin, tmax"
                    ))
                }),
        }
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Target, E> {
        Target::degrees(value)
            .ok_or_else(|| E::custom("numbers must have finite values in the timetable"))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Target, E> {
        self.visit_f64(value as f64)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Target, E> {
        self.visit_f64(value as f64)
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Target, D::Error> {
        deserializer.deserialize_any(TargetVisitor)
    }
}

/// Partial schedule carried by a settings update: any subset of days, each
/// with any subset of hours, each hour with its full four quarters.
pub type SchedulePatch = BTreeMap<Day, BTreeMap<Hour, [Target; 4]>>;

/// The full 7x24x4 matrix of per-quarter-hour targets.
///
/// The type itself accepts partial documents so patches can reuse the same
/// serde shape; completeness is enforced by [`Schedule::validate`] before a
/// schedule is installed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule(BTreeMap<Day, BTreeMap<Hour, [Target; 4]>>);

impl Schedule {
    /// A complete schedule with every slot set to the same target.
    pub fn uniform(target: Target) -> Schedule {
        let mut days = BTreeMap::new();
        for day in Day::ALL {
            let hours = Hour::all().map(|hour| (hour, [target; 4])).collect();
            days.insert(day, hours);
        }
        Schedule(days)
    }

    pub fn slot(&self, day: Day, hour: Hour, quarter: usize) -> Option<Target> {
        self.0.get(&day)?.get(&hour)?.get(quarter).copied()
    }

    pub fn set_slot(&mut self, day: Day, hour: Hour, quarter: usize, target: Target) {
        if quarter < 4 {
            let quarters = self
                .0
                .entry(day)
                .or_default()
                .entry(hour)
                .or_insert([target; 4]);
            quarters[quarter] = target;
        }
    }

    /// Overwrites every hour present in the patch, leaving the rest alone.
    pub fn merge(&mut self, patch: SchedulePatch) {
        for (day, hours) in patch {
            let entry = self.0.entry(day).or_default();
            for (hour, quarters) in hours {
                entry.insert(hour, quarters);
            }
        }
    }

    /// Checks the matrix is rectangular: all 7 days with all 24 hours each.
    /// Quarters are fixed-size arrays, so they cannot be incomplete.
    pub fn validate(&self) -> Result<(), String> {
        for day in Day::ALL {
            let hours = self
                .0
                .get(&day)
                .ok_or_else(|| format!("day `{day}` is missing from the timetable"))?;

            for hour in Hour::all() {
                if !hours.contains_key(&hour) {
                    return Err(format!("hour `{hour}` of `{day}` is missing from the timetable"));
                }
            }
        }
        Ok(())
    }
}
