//! services/app/src/gateway/wire.rs
//!
//! Defines the JSON envelopes and records exchanged with the backend, and their
//! conversion into the core domain types. Decoding is lenient where the backend
//! is known to vary (numbers sent as strings, nested id objects, tag shapes).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use empathy_core::domain::{
    Challenge, ChallengeStep, JoinedChallenge, ProfileSummary, Reward, Session, Story,
    UserChallenge, UserChallengeId, UserId,
};
use empathy_core::progress::{self, COMPLETE};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

//=========================================================================================
// Backend Status Codes
//=========================================================================================

pub const USER_REGISTERED: &str = "user_registered_successfully";
pub const USER_ALREADY_EXISTS: &str = "user_already_exists";
pub const LOGIN_FAILED: &str = "user_login_failed_please_check_your_credentials";
pub const CHALLENGE_JOINED: &str = "challenge_join_successful";
pub const CHALLENGE_ALREADY_JOINED: &str = "challenge_already_exists_for_user";
pub const STORY_POSTED: &str = "user_story_posted_successfully";

//=========================================================================================
// Envelopes
//=========================================================================================

/// `{data: ...}` for reads, `{message, data?}` for mutations, `{success, data}` for login.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(_) => serde_json::from_value(body).unwrap_or(Envelope {
                success: None,
                message: None,
                data: Value::Null,
            }),
            // A bare array is a list endpoint without an envelope.
            Value::Array(_) => Envelope {
                success: None,
                message: None,
                data: body,
            },
            Value::String(message) => Envelope {
                success: None,
                message: Some(message),
                data: Value::Null,
            },
            _ => Envelope {
                success: None,
                message: None,
                data: Value::Null,
            },
        }
    }

    pub fn has_message(&self, code: &str) -> bool {
        self.message.as_deref() == Some(code)
    }
}

/// The machine-checkable status string a failure body carries, if any.
pub fn failure_code(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| {
                map.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
            })
            .or_else(|| map.get("title").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// Structured detail a failure body carries (field errors and the like).
pub fn failure_details(body: &Value) -> Option<Value> {
    let map = body.as_object()?;
    map.get("errors")
        .or_else(|| map.get("details"))
        .or_else(|| map.get("error").and_then(|e| e.get("details")))
        .filter(|v| !v.is_null())
        .cloned()
}

//=========================================================================================
// Lenient Scalars
//=========================================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Int(i) => Some(*i as f64),
            NumberOrText::Float(f) => Some(*f),
            NumberOrText::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NumberOrText>::deserialize(deserializer)?.and_then(|v| v.as_f64()))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.map(|v| v as i64))
}

fn count(value: Option<f64>) -> u32 {
    value.map(|v| v.max(0.0).round() as u32).unwrap_or(0)
}

fn percentage(value: Option<f64>) -> u8 {
    value
        .map(|v| v.clamp(0.0, f64::from(COMPLETE)).round() as u8)
        .unwrap_or(0)
}

/// Accepts RFC 3339, zone-less ISO date-times (read as UTC) and plain dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref().and_then(parse_timestamp)
}

//=========================================================================================
// Auth Records
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, alias = "userId", deserialize_with = "lenient_id")]
    id: Option<UserId>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

impl LoginRecord {
    /// `None` when the backend did not issue a token.
    pub fn to_domain(self) -> Option<Session> {
        let token = self.token.filter(|t| !t.trim().is_empty())?;
        Some(Session {
            token: Some(token),
            user_id: self.id,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
        })
    }
}

//=========================================================================================
// Challenge Records
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    step_no: Option<i64>,
    #[serde(default)]
    step_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    active_user_count: Option<f64>,
    #[serde(default, alias = "challengeDetail")]
    steps: Option<Vec<StepRecord>>,
}

impl ChallengeRecord {
    pub fn to_domain(self) -> Challenge {
        let steps = self
            .steps
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, step)| ChallengeStep {
                step_no: step
                    .step_no
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(index as u32 + 1),
                step_text: step.step_text.unwrap_or_default(),
            })
            .collect();
        Challenge {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            difficulty: self.difficulty.unwrap_or_default(),
            start_date: timestamp(self.start_date),
            active_user_count: count(self.active_user_count),
            steps,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChallengeRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    challenge_id: Option<i64>,
    #[serde(default)]
    started_on: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    progress: Option<f64>,
    #[serde(default)]
    completed_steps: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedChallengeRecord {
    #[serde(alias = "challenge")]
    challenge_dto: ChallengeRecord,
    #[serde(alias = "userChallenge")]
    user_challenge_dto: UserChallengeRecord,
}

impl JoinedChallengeRecord {
    pub fn to_domain(self) -> JoinedChallenge {
        let challenge = self.challenge_dto.to_domain();
        let record = self.user_challenge_dto;
        let progress = percentage(record.progress);
        // Without an explicit set, the first steps in order are taken as done.
        let completed_steps = match record.completed_steps {
            Some(steps) => steps.into_iter().collect(),
            None => progress::steps_from_progress(&challenge.steps, progress),
        };
        let user_challenge = UserChallenge {
            id: record.id.unwrap_or_default(),
            user_id: record.user_id,
            challenge_id: record.challenge_id.unwrap_or(challenge.id),
            started_on: timestamp(record.started_on),
            progress,
            completed_steps,
        };
        JoinedChallenge {
            challenge,
            user_challenge,
        }
    }
}

/// The join result's `data`: a bare id, or an object carrying it.
pub fn joined_id(data: &Value) -> Option<UserChallengeId> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct JoinRecord {
        #[serde(default, deserialize_with = "lenient_id")]
        user_challenge_id: Option<i64>,
        #[serde(default, deserialize_with = "lenient_id")]
        id: Option<i64>,
    }

    match data {
        Value::Object(_) => serde_json::from_value::<JoinRecord>(data.clone())
            .ok()
            .and_then(|r| r.user_challenge_id.or(r.id)),
        other => serde_json::from_value::<NumberOrText>(other.clone())
            .ok()
            .and_then(|v| v.as_f64())
            .map(|v| v as i64),
    }
}

//=========================================================================================
// Story Records
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagRecord {
    Plain(String),
    Named {
        #[serde(alias = "name", alias = "tagName")]
        tag: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
    #[serde(default, alias = "userStoryId", deserialize_with = "lenient_id")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    user_id: Option<i64>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default, rename = "story")]
    text: Option<String>,
    #[serde(default, alias = "tags")]
    user_story_tags: Option<Vec<TagRecord>>,
    #[serde(default)]
    is_shared: Option<bool>,
    #[serde(default)]
    is_anonymous: Option<bool>,
    #[serde(default)]
    posted_on: Option<String>,
    #[serde(default, alias = "likeCount", deserialize_with = "lenient_number")]
    likes: Option<f64>,
}

pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

impl StoryRecord {
    pub fn to_domain(self) -> Story {
        let is_anonymous = self.is_anonymous.unwrap_or(false);
        let author_display_name = match self.full_name.filter(|n| !n.trim().is_empty()) {
            Some(name) if !is_anonymous => name,
            _ => ANONYMOUS_AUTHOR.to_string(),
        };
        let mut tags: Vec<String> = Vec::new();
        for tag in self.user_story_tags.unwrap_or_default() {
            let text = match tag {
                TagRecord::Plain(t) | TagRecord::Named { tag: t } => t.trim().to_string(),
            };
            if !text.is_empty() && !tags.contains(&text) {
                tags.push(text);
            }
        }
        Story {
            id: self.id.unwrap_or_default(),
            user_id: self.user_id,
            author_display_name,
            text: self.text.unwrap_or_default(),
            tags,
            is_shared: self.is_shared.unwrap_or(false),
            is_anonymous,
            posted_on: timestamp(self.posted_on),
            like_count: count(self.likes),
        }
    }
}

//=========================================================================================
// Profile Records
//=========================================================================================

#[derive(Debug, Deserialize)]
struct RewardRecord {
    #[serde(rename = "ImageUrl", alias = "imageUrl")]
    image_url: String,
}

/// Rewards arrive as a JSON-encoded string (or occasionally a plain array).
/// Anything unparseable degrades to no rewards.
pub fn parse_rewards(raw: &Value) -> Vec<Reward> {
    let parsed = match raw {
        Value::Null => return Vec::new(),
        Value::String(s) if s.trim().is_empty() => return Vec::new(),
        Value::String(s) => serde_json::from_str::<Vec<RewardRecord>>(s),
        other => serde_json::from_value::<Vec<RewardRecord>>(other.clone()),
    };
    match parsed {
        Ok(records) => records
            .into_iter()
            .map(|r| Reward {
                image_url: r.image_url,
            })
            .collect(),
        Err(e) => {
            warn!("Discarding unparseable rewards: {}", e);
            Vec::new()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    joined_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    shared_stories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    challenges: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    earned_badges: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    empathy_points: Option<f64>,
    #[serde(default)]
    rewards: Value,
}

impl ProfileRecord {
    pub fn to_domain(self) -> ProfileSummary {
        ProfileSummary {
            full_name: self.full_name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            joined_date: timestamp(self.joined_date),
            shared_stories: count(self.shared_stories),
            challenges: count(self.challenges),
            earned_badges: count(self.earned_badges),
            empathy_points: count(self.empathy_points),
            rewards: parse_rewards(&self.rewards),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoryFeedbackRecord {
    #[serde(default)]
    pub feedback: Option<String>,
}
