//! crates/empathy_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of the wire format and of local persistence;
//! the backend remains the authoritative owner of every record except `Session`.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub type UserId = i64;
pub type StoryId = i64;
pub type ChallengeId = i64;
pub type UserChallengeId = i64;

/// The locally persisted proof of authentication for this installation.
///
/// A session without a token is a valid value (for example a registration that
/// did not log the user in); only a non-empty token makes it authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
}

impl Session {
    /// The bearer credential to attach to authenticated requests, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A user-submitted narrative.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub id: StoryId,
    pub user_id: Option<UserId>,
    pub author_display_name: String,
    pub text: String,
    /// Ordered set: insertion order is kept, duplicates are not.
    pub tags: Vec<String>,
    pub is_shared: bool,
    pub is_anonymous: bool,
    pub posted_on: Option<DateTime<Utc>>,
    pub like_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeStep {
    pub step_no: u32,
    pub step_text: String,
}

/// A backend-defined community activity with ordered steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    pub id: ChallengeId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub start_date: Option<DateTime<Utc>>,
    pub active_user_count: u32,
    pub steps: Vec<ChallengeStep>,
}

/// The per-user join and progress record for a challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct UserChallenge {
    pub id: UserChallengeId,
    pub user_id: Option<UserId>,
    pub challenge_id: ChallengeId,
    pub started_on: Option<DateTime<Utc>>,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub completed_steps: BTreeSet<u32>,
}

/// A joined challenge as shown on the detail screen.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedChallenge {
    pub challenge: Challenge,
    pub user_challenge: UserChallenge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reward {
    pub image_url: String,
}

/// Read projection of the signed-in user's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub full_name: String,
    pub description: String,
    pub joined_date: Option<DateTime<Utc>>,
    pub shared_stories: u32,
    pub challenges: u32,
    pub earned_badges: u32,
    pub empathy_points: u32,
    pub rewards: Vec<Reward>,
}

//=========================================================================================
// Operation Inputs and Outcomes
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStory {
    pub text: String,
    pub tags: Vec<String>,
    pub is_shared: bool,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub challenge_id: ChallengeId,
    pub started_on: DateTime<Utc>,
    pub initial_progress: u8,
}

impl JoinRequest {
    pub fn starting_now(challenge_id: ChallengeId) -> Self {
        Self {
            challenge_id,
            started_on: Utc::now(),
            initial_progress: 0,
        }
    }
}

/// Result of joining a challenge. Both a fresh join and a repeated join are
/// successes and carry the identifier of the single record for the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub user_challenge_id: UserChallengeId,
    pub already_joined: bool,
}

/// Encouragement text the backend returns after a story is posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFeedback {
    pub feedback: Option<String>,
}
