//! JSON import and export of the whole training log.
//!
//! Documents use camelCase keys. Logged values are taken as they come: a missing or invalid
//! number is replaced by zero and a session without a valid date is skipped, so one dirty entry
//! never rejects the rest of the history.

use chrono::{DateTime, Utc};
use ironlog_domain as domain;
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Settings(#[from] domain::LevelCurveError),
}

/// Everything the progression engine needs to restore its state.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Snapshot {
    pub workout_sessions: Vec<domain::WorkoutSession>,
    pub experience: f64,
    pub settings: domain::Settings,
}

pub fn from_json(json: &str) -> Result<Snapshot, SnapshotError> {
    let document: Document = serde_json::from_str(json)?;
    Snapshot::try_from(document)
}

pub fn to_json(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&Document::from(snapshot))?)
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "lenient_sessions")]
    pub sessions: Vec<WorkoutSession>,
    #[serde(default, deserialize_with = "lenient_experience")]
    pub experience: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl From<&Snapshot> for Document {
    fn from(value: &Snapshot) -> Self {
        Self {
            sessions: value
                .workout_sessions
                .iter()
                .map(WorkoutSession::from)
                .collect(),
            experience: value.experience,
            settings: Some(Settings::from(value.settings)),
        }
    }
}

impl TryFrom<Document> for Snapshot {
    type Error = SnapshotError;

    fn try_from(value: Document) -> Result<Self, Self::Error> {
        let experience = if value.experience.is_finite() && value.experience >= 0.0 {
            value.experience
        } else {
            warn!("replacing invalid experience {} by 0", value.experience);
            0.0
        };
        Ok(Self {
            workout_sessions: value
                .sessions
                .into_iter()
                .map(domain::WorkoutSession::from)
                .collect(),
            experience,
            settings: value
                .settings
                .map(domain::Settings::try_from)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Uuid>,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub duration_minutes: u32,
    #[serde(default, deserialize_with = "lenient_volume")]
    pub total_volume: f32,
    #[serde(default)]
    pub exercises: Vec<ExercisePerformance>,
}

impl From<&domain::WorkoutSession> for WorkoutSession {
    fn from(value: &domain::WorkoutSession) -> Self {
        Self {
            id: (!value.id.is_nil()).then_some(*value.id),
            date: value.date,
            routine_name: value.routine_name.clone(),
            duration_minutes: value.duration_minutes,
            total_volume: value.total_volume,
            exercises: value
                .exercises
                .iter()
                .map(ExercisePerformance::from)
                .collect(),
        }
    }
}

impl From<WorkoutSession> for domain::WorkoutSession {
    fn from(value: WorkoutSession) -> Self {
        Self {
            id: value.id.map_or_else(domain::WorkoutSessionID::nil, From::from),
            date: value.date,
            routine_name: value.routine_name,
            duration_minutes: value.duration_minutes,
            total_volume: value.total_volume,
            exercises: value
                .exercises
                .into_iter()
                .map(domain::ExercisePerformance::from)
                .collect(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePerformance {
    pub exercise_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

impl From<&domain::ExercisePerformance> for ExercisePerformance {
    fn from(value: &domain::ExercisePerformance) -> Self {
        Self {
            exercise_name: value.exercise_name.clone(),
            exercise_id: value.exercise_id.as_ref().map(|id| id.as_str().to_owned()),
            sets: value.sets.iter().map(SetRecord::from).collect(),
        }
    }
}

impl From<ExercisePerformance> for domain::ExercisePerformance {
    fn from(value: ExercisePerformance) -> Self {
        Self {
            exercise_name: value.exercise_name,
            exercise_id: value.exercise_id.map(domain::ExerciseID::from),
            sets: value
                .sets
                .into_iter()
                .map(domain::SetRecord::from)
                .collect(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    #[serde(default, deserialize_with = "lenient_count")]
    pub set_number: u32,
    #[serde(default, deserialize_with = "lenient_weight")]
    pub weight: Option<f32>,
    #[serde(default, deserialize_with = "lenient_reps")]
    pub reps: Option<i64>,
    #[serde(default)]
    pub completed: bool,
}

impl From<&domain::SetRecord> for SetRecord {
    fn from(value: &domain::SetRecord) -> Self {
        Self {
            set_number: value.set_number,
            weight: Some(value.weight.into()),
            reps: Some(i64::from(u32::from(value.reps))),
            completed: value.completed,
        }
    }
}

impl From<SetRecord> for domain::SetRecord {
    fn from(value: SetRecord) -> Self {
        Self {
            set_number: value.set_number,
            weight: domain::Weight::or_zero(value.weight.unwrap_or_default()),
            reps: domain::Reps::or_zero(value.reps.unwrap_or_default()),
            completed: value.completed,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub level_curve: LevelCurve,
    pub overload: OverloadRule,
    pub xp_formula: XpFormula,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_window: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(domain::Settings::default())
    }
}

impl From<domain::Settings> for Settings {
    fn from(value: domain::Settings) -> Self {
        Self {
            level_curve: LevelCurve {
                base_xp: value.level_curve.base_xp(),
            },
            overload: OverloadRule {
                weight_increase_threshold: value.overload.weight_increase_threshold,
                weight_increment: value.overload.weight_increment,
                rep_decrement: value.overload.rep_decrement,
                min_reps: value.overload.min_reps,
                rep_increment: value.overload.rep_increment,
            },
            xp_formula: XpFormula {
                base: value.xp_formula.base,
                per_minute: value.xp_formula.per_minute,
                volume_step: value.xp_formula.volume_step,
                per_volume_step: value.xp_formula.per_volume_step,
                volume_cap: value.xp_formula.volume_cap,
                per_completed_set: value.xp_formula.per_completed_set,
                per_personal_record: value.xp_formula.per_personal_record,
            },
            history_window: value.history_window,
        }
    }
}

impl TryFrom<Settings> for domain::Settings {
    type Error = SnapshotError;

    fn try_from(value: Settings) -> Result<Self, Self::Error> {
        Ok(Self {
            level_curve: domain::LevelCurve::new(value.level_curve.base_xp)?,
            overload: domain::OverloadRule {
                weight_increase_threshold: value.overload.weight_increase_threshold,
                weight_increment: value.overload.weight_increment,
                rep_decrement: value.overload.rep_decrement,
                min_reps: value.overload.min_reps,
                rep_increment: value.overload.rep_increment,
            },
            xp_formula: domain::XpFormula {
                base: value.xp_formula.base,
                per_minute: value.xp_formula.per_minute,
                volume_step: value.xp_formula.volume_step,
                per_volume_step: value.xp_formula.per_volume_step,
                volume_cap: value.xp_formula.volume_cap,
                per_completed_set: value.xp_formula.per_completed_set,
                per_personal_record: value.xp_formula.per_personal_record,
            },
            history_window: value.history_window,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LevelCurve {
    pub base_xp: f64,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverloadRule {
    pub weight_increase_threshold: u32,
    pub weight_increment: f32,
    pub rep_decrement: u32,
    pub min_reps: u32,
    pub rep_increment: u32,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct XpFormula {
    pub base: u32,
    pub per_minute: u32,
    pub volume_step: f32,
    pub per_volume_step: u32,
    pub volume_cap: u32,
    pub per_completed_set: u32,
    pub per_personal_record: u32,
}

fn lenient_sessions<'de, D>(deserializer: D) -> Result<Vec<WorkoutSession>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match WorkoutSession::deserialize(value) {
            Ok(workout_session) => Some(workout_session),
            Err(err) => {
                warn!("skipping session {i}: {err}");
                None
            }
        })
        .collect())
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Uuid::deserialize(&value)
        .inspect_err(|err| warn!("replacing invalid session id {value}: {err}"))
        .ok())
}

fn lenient_experience<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decimal_number(&value).unwrap_or_else(|| {
        warn!("replacing invalid experience {value} by 0");
        0.0
    }))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(whole_number(&value)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_else(|| {
            warn!("replacing invalid count {value} by 0");
            0
        }))
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_volume<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decimal_number(&value)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map_or_else(
            || {
                warn!("replacing invalid total volume {value} by 0");
                0.0
            },
            |v| v as f32,
        ))
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_weight<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Null => None,
        Value::Number(number) => number.as_f64().map(|n| n as f32),
        Value::String(string) => match domain::Weight::try_from(string.as_str()) {
            Ok(weight) => Some(f32::from(weight)),
            Err(err) => {
                warn!("replacing invalid weight {value} by 0: {err}");
                Some(0.0)
            }
        },
        _ => {
            warn!("replacing invalid weight {value} by 0");
            Some(0.0)
        }
    })
}

fn lenient_reps<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Null => None,
        Value::String(string) => match domain::Reps::try_from(string.as_str()) {
            Ok(reps) => Some(i64::from(u32::from(reps))),
            Err(err) => {
                warn!("replacing invalid reps {value} by 0: {err}");
                Some(0)
            }
        },
        _ => Some(whole_number(&value).unwrap_or_else(|| {
            warn!("replacing invalid reps {value} by 0");
            0
        })),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.fract() == 0.0 && n.abs() < 1e15)
                .map(|n| n as i64)
        }),
        Value::String(string) => string.trim().parse().ok(),
        _ => None,
    }
}

fn decimal_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(string) => string.replace(',', ".").trim().parse().ok(),
        _ => None,
    }
}
