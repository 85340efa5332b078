//! The timetable: persisted settings, weekly schedule and the heating
//! decision function.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Local, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::TimetableError;
use crate::schedule::{Day, Hour, Schedule, SchedulePatch, Target};
use crate::status::{Decision, Mode, TemperatureScale, ThermodStatus};

/// Absolute setpoints the symbolic targets resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Temperatures {
    pub t0: f64,
    pub tmin: f64,
    pub tmax: f64,
}

impl Temperatures {
    pub fn resolve(&self, target: Target) -> f64 {
        match target {
            Target::T0 => self.t0,
            Target::Tmin => self.tmin,
            Target::Tmax => self.tmax,
            Target::Degrees(value) => value,
        }
    }
}

fn default_differential() -> f64 {
    0.5
}

/// The complete state persisted in `timetable.json`, which is also the body
/// of `GET /settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub status: Mode,
    #[serde(default = "default_differential")]
    pub differential: f64,
    /// Minimum off-duration in seconds after a threshold switch-off, `null`
    /// to disable the cool-down.
    #[serde(default)]
    pub grace_time: Option<u64>,
    pub temperatures: Temperatures,
    pub timetable: Schedule,
    #[serde(default)]
    pub scale: TemperatureScale,
    #[serde(default)]
    pub cooling: bool,
}

impl Settings {
    /// Checks the schema-level and semantic rules of the whole document.
    ///
    /// `tmin <= tmax` and `t0 <= tmin` are expected but deliberately not
    /// enforced, a misordered configuration only draws a warning.
    pub fn validate(&self) -> Result<(), TimetableError> {
        if !self.differential.is_finite() || !(0.0..=1.0).contains(&self.differential) {
            return Err(TimetableError::InvalidContent(format!(
                "the differential value ({}) is invalid, it must be a number in range [0;1]",
                self.differential
            )));
        }

        for (name, value) in [
            ("t0", self.temperatures.t0),
            ("tmin", self.temperatures.tmin),
            ("tmax", self.temperatures.tmax),
        ] {
            if !value.is_finite() {
                return Err(TimetableError::InvalidContent(format!(
                    "the {name} temperature ({value}) is invalid, it must be a finite number"
                )));
            }
        }

        self.timetable
            .validate()
            .map_err(TimetableError::InvalidContent)?;

        if self.temperatures.tmin > self.temperatures.tmax {
            warn!(
                "tmin ({}) is above tmax ({})",
                self.temperatures.tmin, self.temperatures.tmax
            );
        }
        if self.temperatures.t0 > self.temperatures.tmin {
            warn!(
                "t0 ({}) is above tmin ({})",
                self.temperatures.t0, self.temperatures.tmin
            );
        }

        Ok(())
    }
}

/// Partial update of [`Temperatures`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemperaturesPatch {
    #[serde(default)]
    pub t0: Option<f64>,
    #[serde(default)]
    pub tmin: Option<f64>,
    #[serde(default)]
    pub tmax: Option<f64>,
}

// Keeps `"grace_time": null` (disable the cool-down) distinguishable from an
// absent key (leave it alone).
fn some_or_null<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<u64>>, D::Error> {
    Option::<u64>::deserialize(deserializer).map(Some)
}

/// Partial update of [`Settings`] as accepted by `POST /settings`.
///
/// Unknown top-level keys are rejected at deserialization; `scale` and
/// `cooling` can only be changed in the persisted file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default)]
    pub status: Option<Mode>,
    #[serde(default)]
    pub temperatures: Option<TemperaturesPatch>,
    #[serde(default)]
    pub differential: Option<f64>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub grace_time: Option<Option<u64>>,
    #[serde(default)]
    pub timetable: Option<SchedulePatch>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.temperatures.is_none()
            && self.differential.is_none()
            && self.grace_time.is_none()
            && self.timetable.is_none()
    }

    fn apply_to(self, settings: &mut Settings) {
        if let Some(status) = self.status {
            settings.status = status;
        }
        if let Some(temperatures) = self.temperatures {
            if let Some(t0) = temperatures.t0 {
                settings.temperatures.t0 = t0;
            }
            if let Some(tmin) = temperatures.tmin {
                settings.temperatures.tmin = tmin;
            }
            if let Some(tmax) = temperatures.tmax {
                settings.temperatures.tmax = tmax;
            }
        }
        if let Some(differential) = self.differential {
            settings.differential = differential;
        }
        if let Some(grace_time) = self.grace_time {
            settings.grace_time = grace_time;
        }
        if let Some(timetable) = self.timetable {
            settings.timetable.merge(timetable);
        }
    }
}

/// Weekly schedule, settings and decision engine of the thermostat.
///
/// Mutations are transactional and write-through: the candidate state is
/// validated and persisted to the backing file before it replaces the one in
/// memory, so a failed update never leaves a half-applied document anywhere.
#[derive(Debug)]
pub struct TimeTable {
    settings: Settings,
    path: Option<PathBuf>,
    last_off_time: Option<DateTime<Local>>,
}

impl TimeTable {
    /// Installs an in-memory timetable with no backing file.
    pub fn new(settings: Settings) -> Result<TimeTable, TimetableError> {
        settings.validate()?;
        Ok(TimeTable {
            settings,
            path: None,
            last_off_time: None,
        })
    }

    /// Reads, validates and installs the timetable from a JSON file, which
    /// becomes the backing file of every later mutation.
    pub fn load(path: impl Into<PathBuf>) -> Result<TimeTable, TimetableError> {
        let path = path.into();
        debug!(path = %path.display(), "loading timetable");
        let settings = read_settings(&path)?;
        Ok(TimeTable {
            settings,
            path: Some(path),
            last_off_time: None,
        })
    }

    /// Re-reads the backing file. On any failure the previous settings are
    /// retained and the error is reported to the caller.
    pub fn reload(&mut self) -> Result<(), TimetableError> {
        let path = self.path.as_ref().ok_or(TimetableError::NoBackingFile)?;
        debug!(path = %path.display(), "reloading timetable");
        self.settings = read_settings(path)?;
        Ok(())
    }

    /// Writes the current settings to the backing file (temp file + rename).
    pub fn save(&self) -> Result<(), TimetableError> {
        let path = self.path.as_ref().ok_or(TimetableError::NoBackingFile)?;
        write_settings(path, &self.settings)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> Mode {
        self.settings.status
    }

    pub fn differential(&self) -> f64 {
        self.settings.differential
    }

    pub fn grace_time(&self) -> Option<u64> {
        self.settings.grace_time
    }

    pub fn temperatures(&self) -> Temperatures {
        self.settings.temperatures
    }

    pub fn scale(&self) -> TemperatureScale {
        self.settings.scale
    }

    pub fn cooling(&self) -> bool {
        self.settings.cooling
    }

    /// Resolves a symbolic or literal target to degrees in the configured
    /// scale.
    pub fn degrees(&self, target: Target) -> f64 {
        self.settings.temperatures.resolve(target)
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<(), TimetableError> {
        self.transact(|settings| {
            settings.status = mode;
            Ok(())
        })
    }

    pub fn set_differential(&mut self, differential: f64) -> Result<(), TimetableError> {
        self.transact(|settings| {
            settings.differential = differential;
            Ok(())
        })
    }

    pub fn set_grace_time(&mut self, grace_time: Option<u64>) -> Result<(), TimetableError> {
        self.transact(|settings| {
            settings.grace_time = grace_time;
            Ok(())
        })
    }

    pub fn set_temperatures(&mut self, temperatures: Temperatures) -> Result<(), TimetableError> {
        self.transact(|settings| {
            settings.temperatures = temperatures;
            Ok(())
        })
    }

    pub fn set_slot(
        &mut self,
        day: Day,
        hour: Hour,
        quarter: usize,
        target: Target,
    ) -> Result<(), TimetableError> {
        self.transact(|settings| {
            if quarter >= 4 {
                return Err(TimetableError::InvalidContent(format!(
                    "the provided quarter is not valid ({quarter}), it must be in range 0-3"
                )));
            }
            settings.timetable.set_slot(day, hour, quarter, target);
            Ok(())
        })
    }

    /// Applies a partial update as a single transaction: either every field
    /// of the patch is merged, validated and persisted, or nothing changes.
    pub fn update(&mut self, patch: SettingsPatch) -> Result<(), TimetableError> {
        self.transact(|settings| {
            patch.apply_to(settings);
            Ok(())
        })
    }

    fn transact<F>(&mut self, mutate: F) -> Result<(), TimetableError>
    where
        F: FnOnce(&mut Settings) -> Result<(), TimetableError>,
    {
        let mut next = self.settings.clone();
        mutate(&mut next)?;
        next.validate()?;
        if let Some(path) = &self.path {
            write_settings(path, &next)?;
        }
        self.settings = next;
        Ok(())
    }

    /// The actuator went on: the cool-down bookkeeping is reset.
    pub fn note_switch_on(&mut self) {
        self.last_off_time = None;
    }

    /// The actuator went off through the threshold rule: start the grace
    /// period. Mode-forced switch-offs must not call this.
    pub fn note_switch_off(&mut self, now: DateTime<Local>) {
        self.last_off_time = Some(now);
    }

    /// The decision function.
    ///
    /// Pure with respect to `(settings, current_temperature, actuator_is_on,
    /// now)`: it never mutates the timetable, so repeated calls with the same
    /// arguments give the same answer.
    pub fn should_the_heating_be_on(
        &self,
        current_temperature: f64,
        actuator_is_on: bool,
        now: DateTime<Local>,
    ) -> Decision {
        let settings = &self.settings;
        let snapshot = |heat: bool, target: Option<f64>, error: Option<String>| ThermodStatus {
            timestamp: now.timestamp(),
            mode: settings.status,
            current_temperature: Some(current_temperature),
            target_temperature: target,
            heating_status: heat as u8,
            error,
        };

        let selector = match settings.status {
            Mode::On => {
                return Decision {
                    heat: true,
                    status: snapshot(true, None, None),
                }
            }
            Mode::Off => {
                return Decision {
                    heat: false,
                    status: snapshot(false, None, None),
                }
            }
            Mode::Tmax => Some(Target::Tmax),
            Mode::Tmin => Some(Target::Tmin),
            Mode::T0 => Some(Target::T0),
            Mode::Auto => self.slot_for(now),
        };

        let Some(selector) = selector else {
            // A hole in the matrix cannot survive validation, but a decision
            // is still owed if one ever shows up at runtime: report it and
            // keep the actuator as it is.
            let error = format!(
                "no schedule entry for {} {} quarter {}",
                Day::from(now.weekday()),
                Hour::new(now.hour() as u8).map(|h| h.to_string()).unwrap_or_default(),
                now.minute() / 15
            );
            return Decision {
                heat: actuator_is_on,
                status: snapshot(actuator_is_on, None, Some(error)),
            };
        };

        let target = settings.temperatures.resolve(selector);
        let half = settings.differential / 2.0;

        let wanted = if settings.cooling {
            if current_temperature >= target + half {
                true
            } else if current_temperature <= target - half {
                false
            } else {
                actuator_is_on
            }
        } else if current_temperature <= target - half {
            true
        } else if current_temperature >= target + half {
            false
        } else {
            actuator_is_on
        };

        // A switch-on during the grace period after a threshold switch-off
        // is suppressed to prevent short-cycling.
        let heat = if wanted && !actuator_is_on && self.in_grace_period(now) {
            debug!("switch-on suppressed by grace time");
            false
        } else {
            wanted
        };

        Decision {
            heat,
            status: snapshot(heat, Some(target), None),
        }
    }

    fn in_grace_period(&self, now: DateTime<Local>) -> bool {
        match (self.settings.grace_time, self.last_off_time) {
            (Some(grace), Some(off)) => {
                let grace = Duration::seconds(i64::try_from(grace).unwrap_or(i64::MAX));
                now.signed_duration_since(off) < grace
            }
            _ => false,
        }
    }

    fn slot_for(&self, now: DateTime<Local>) -> Option<Target> {
        let day = Day::from(now.weekday());
        let hour = Hour::new(now.hour() as u8)?;
        let quarter = (now.minute() / 15) as usize;
        self.settings.timetable.slot(day, hour, quarter)
    }
}

fn read_settings(path: &Path) -> Result<Settings, TimetableError> {
    let raw = fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&raw).map_err(TimetableError::from_json)?;
    settings.validate()?;
    Ok(settings)
}

fn write_settings(path: &Path, settings: &Settings) -> Result<(), TimetableError> {
    let json = serde_json::to_string_pretty(settings).map_err(TimetableError::from_json)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_settings() -> Settings {
        Settings {
            status: Mode::Auto,
            differential: 0.5,
            grace_time: None,
            temperatures: Temperatures {
                t0: 5.0,
                tmin: 17.0,
                tmax: 22.0,
            },
            timetable: Schedule::uniform(Target::Tmax),
            scale: TemperatureScale::Celsius,
            cooling: false,
        }
    }

    // 2018-01-01 was a Monday.
    fn monday(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2018, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn switches_on_below_the_band() {
        let tt = TimeTable::new(base_settings()).unwrap();

        // tmax 22, differential 0.5: on-threshold is 21.75
        let decision = tt.should_the_heating_be_on(21.7, false, monday(10, 0));
        assert!(decision.heat);
        assert_eq!(decision.status.target_temperature, Some(22.0));
        assert_eq!(decision.status.heating_status, 1);
    }

    #[test]
    fn switches_off_above_the_band() {
        let tt = TimeTable::new(base_settings()).unwrap();

        // off-threshold is 22.25
        let decision = tt.should_the_heating_be_on(22.3, true, monday(10, 0));
        assert!(!decision.heat);
    }

    #[test]
    fn hysteresis_band_preserves_the_current_state() {
        let tt = TimeTable::new(base_settings()).unwrap();

        assert!(tt.should_the_heating_be_on(22.0, true, monday(10, 0)).heat);
        assert!(!tt.should_the_heating_be_on(22.0, false, monday(10, 0)).heat);
    }

    #[test]
    fn forced_modes_ignore_the_temperature() {
        let mut settings = base_settings();
        settings.status = Mode::On;
        let tt = TimeTable::new(settings).unwrap();
        let decision = tt.should_the_heating_be_on(50.0, false, monday(10, 0));
        assert!(decision.heat);
        assert_eq!(decision.status.target_temperature, None);

        let mut settings = base_settings();
        settings.status = Mode::Off;
        let tt = TimeTable::new(settings).unwrap();
        let decision = tt.should_the_heating_be_on(5.0, true, monday(10, 0));
        assert!(!decision.heat);
        assert_eq!(decision.status.target_temperature, None);
    }

    #[test]
    fn manual_modes_use_the_corresponding_setpoint() {
        let mut settings = base_settings();
        settings.status = Mode::Tmin;
        let tt = TimeTable::new(settings).unwrap();

        let decision = tt.should_the_heating_be_on(16.0, false, monday(10, 0));
        assert!(decision.heat);
        assert_eq!(decision.status.target_temperature, Some(17.0));
    }

    #[test]
    fn auto_mode_resolves_the_current_slot() {
        let mut settings = base_settings();
        settings
            .timetable
            .set_slot(Day::Monday, Hour::new(7).unwrap(), 2, Target::Tmin);
        let tt = TimeTable::new(settings).unwrap();

        // Monday 07:30 falls in quarter 2 of h07.
        let decision = tt.should_the_heating_be_on(18.0, false, monday(7, 30));
        assert_eq!(decision.status.target_temperature, Some(17.0));
        assert!(!decision.heat);

        // One quarter later the slot is back to tmax.
        let decision = tt.should_the_heating_be_on(18.0, false, monday(7, 45));
        assert_eq!(decision.status.target_temperature, Some(22.0));
        assert!(decision.heat);
    }

    #[test]
    fn cooling_thresholds_are_symmetric() {
        let mut settings = base_settings();
        settings.cooling = true;
        settings.differential = 0.4;
        settings.temperatures.tmax = 24.0;
        let tt = TimeTable::new(settings).unwrap();

        // target 24, differential 0.4: on at >= 24.2, off at <= 23.8
        assert!(tt.should_the_heating_be_on(24.3, false, monday(15, 0)).heat);
        assert!(!tt.should_the_heating_be_on(23.7, true, monday(15, 0)).heat);
        assert!(tt.should_the_heating_be_on(24.0, true, monday(15, 0)).heat);
    }

    #[test]
    fn grace_time_suppresses_early_switch_on() {
        let mut settings = base_settings();
        settings.grace_time = Some(600);
        let mut tt = TimeTable::new(settings).unwrap();

        let off_at = monday(10, 0);
        tt.note_switch_off(off_at);

        // 21.6 is below the on-threshold, but the cool-down is running.
        let halfway = off_at + Duration::seconds(300);
        assert!(!tt.should_the_heating_be_on(21.6, false, halfway).heat);

        // Once the grace period has elapsed the threshold rule applies again.
        let after = off_at + Duration::seconds(601);
        assert!(tt.should_the_heating_be_on(21.6, false, after).heat);
    }

    #[test]
    fn grace_time_boundary_is_exclusive() {
        let mut settings = base_settings();
        settings.grace_time = Some(600);
        let mut tt = TimeTable::new(settings).unwrap();

        let off_at = monday(10, 0);
        tt.note_switch_off(off_at);
        assert!(
            tt.should_the_heating_be_on(21.6, false, off_at + Duration::seconds(600))
                .heat
        );
    }

    #[test]
    fn switch_on_clears_the_grace_period() {
        let mut settings = base_settings();
        settings.grace_time = Some(600);
        let mut tt = TimeTable::new(settings).unwrap();

        tt.note_switch_off(monday(10, 0));
        tt.note_switch_on();
        assert!(
            tt.should_the_heating_be_on(21.6, false, monday(10, 1)).heat
        );
    }

    #[test]
    fn grace_time_without_switch_off_has_no_effect() {
        let mut settings = base_settings();
        settings.grace_time = Some(600);
        let tt = TimeTable::new(settings).unwrap();

        assert!(tt.should_the_heating_be_on(21.6, false, monday(10, 0)).heat);
    }

    #[test]
    fn decision_is_deterministic() {
        let tt = TimeTable::new(base_settings()).unwrap();
        let now = monday(10, 7);

        let first = tt.should_the_heating_be_on(21.9, true, now);
        let second = tt.should_the_heating_be_on(21.9, true, now);
        assert_eq!(first, second);
    }

    #[test]
    fn validation_rejects_bad_differential() {
        let mut settings = base_settings();
        settings.differential = 1.5;
        assert!(matches!(
            TimeTable::new(settings),
            Err(TimetableError::InvalidContent(_))
        ));
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let mut document = serde_json::to_value(base_settings()).unwrap();
        document["boost"] = serde_json::json!(true);

        let err = serde_json::from_value::<Settings>(document)
            .map_err(TimetableError::from_json)
            .unwrap_err();
        assert!(matches!(err, TimetableError::InvalidContent(_)));
    }

    #[test]
    fn missing_day_fails_content_validation() {
        let mut document = serde_json::to_value(base_settings()).unwrap();
        document["timetable"]
            .as_object_mut()
            .unwrap()
            .remove("wednesday");

        let settings: Settings = serde_json::from_value(document).unwrap();
        assert!(matches!(
            settings.validate(),
            Err(TimetableError::InvalidContent(_))
        ));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.json");
        fs::write(
            &path,
            serde_json::to_string_pretty(&base_settings()).unwrap(),
        )
        .unwrap();

        let tt = TimeTable::load(&path).unwrap();
        tt.save().unwrap();

        let again = TimeTable::load(&path).unwrap();
        assert_eq!(tt.settings(), again.settings());
    }

    #[test]
    fn load_classifies_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.json");
        fs::write(&path, "[global] not json").unwrap();

        assert!(matches!(
            TimeTable::load(&path),
            Err(TimetableError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn update_merges_a_single_hour_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.json");
        let mut settings = base_settings();
        settings.timetable = Schedule::uniform(Target::Tmin);
        fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

        let mut tt = TimeTable::load(&path).unwrap();
        let patch: SettingsPatch = serde_json::from_str(
            r#"{"timetable": {"monday": {"h07": ["tmax", "tmax", "tmax", "tmax"]}}}"#,
        )
        .unwrap();
        tt.update(patch).unwrap();

        let h07 = Hour::new(7).unwrap();
        let h08 = Hour::new(8).unwrap();
        assert_eq!(
            tt.settings().timetable.slot(Day::Monday, h07, 0),
            Some(Target::Tmax)
        );
        assert_eq!(
            tt.settings().timetable.slot(Day::Monday, h08, 0),
            Some(Target::Tmin)
        );

        // The file on disk matches the post-patch state.
        let on_disk = TimeTable::load(&path).unwrap();
        assert_eq!(on_disk.settings(), tt.settings());
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut tt = TimeTable::new(base_settings()).unwrap();

        // The status change is valid, the differential is not: neither must
        // be applied.
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"status": "on", "differential": 5.0}"#).unwrap();
        assert!(tt.update(patch).is_err());
        assert_eq!(tt.mode(), Mode::Auto);
        assert_eq!(tt.differential(), 0.5);
    }

    #[test]
    fn update_is_idempotent() {
        let mut tt = TimeTable::new(base_settings()).unwrap();
        let raw = r#"{"status": "tmin", "temperatures": {"tmax": 21.0}, "grace_time": 300}"#;

        tt.update(serde_json::from_str(raw).unwrap()).unwrap();
        let once = tt.settings().clone();
        tt.update(serde_json::from_str(raw).unwrap()).unwrap();
        assert_eq!(tt.settings(), &once);
    }

    #[test]
    fn patch_grace_time_null_disables_the_cool_down() {
        let mut settings = base_settings();
        settings.grace_time = Some(600);
        let mut tt = TimeTable::new(settings).unwrap();

        let patch: SettingsPatch = serde_json::from_str(r#"{"grace_time": null}"#).unwrap();
        assert!(!patch.is_empty());
        tt.update(patch).unwrap();
        assert_eq!(tt.grace_time(), None);

        // An absent key leaves the value alone instead.
        let patch: SettingsPatch = serde_json::from_str(r#"{"status": "auto"}"#).unwrap();
        tt.update(patch).unwrap();
        assert_eq!(tt.grace_time(), None);
    }

    #[test]
    fn patch_rejects_non_numeric_temperatures() {
        let err = serde_json::from_str::<SettingsPatch>(r#"{"temperatures": {"tmax": "hot"}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn setters_keep_prior_state_on_failure() {
        let mut tt = TimeTable::new(base_settings()).unwrap();
        assert!(tt.set_differential(7.0).is_err());
        assert_eq!(tt.differential(), 0.5);

        assert!(tt
            .set_slot(Day::Monday, Hour::new(7).unwrap(), 9, Target::Tmin)
            .is_err());
        assert_eq!(
            tt.settings().timetable.slot(Day::Monday, Hour::new(7).unwrap(), 0),
            Some(Target::Tmax)
        );
    }
}
