//! services/app/src/screens/challenge_detail.rs
//!
//! A joined challenge with its step checklist. Checking steps is local until
//! the user saves; a confirmed save is reflected in the loaded record until
//! the next focus fetches the authoritative one.

use super::{lock, ActionGuard, FocusQuery, QueryState};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ApiGateway;
use chrono::{DateTime, Utc};
use empathy_core::domain::{JoinedChallenge, UserChallengeId};
use empathy_core::progress;
use std::collections::BTreeSet;
use std::sync::Mutex;
use tokio::task::JoinHandle;

pub struct ChallengeDetailScreen {
    gateway: ApiGateway,
    user_challenge_id: UserChallengeId,
    joined: FocusQuery<JoinedChallenge>,
    /// Unsaved checklist edits; `None` means "as loaded".
    edits: Mutex<Option<BTreeSet<u32>>>,
    save: ActionGuard,
}

impl ChallengeDetailScreen {
    pub fn new(gateway: ApiGateway, user_challenge_id: UserChallengeId) -> Self {
        let fetcher = gateway.clone();
        let joined = FocusQuery::new("challenge_detail", move || {
            let gateway = fetcher.clone();
            async move { gateway.get_joined_challenge(user_challenge_id).await }
        });
        Self {
            gateway,
            user_challenge_id,
            joined,
            edits: Mutex::new(None),
            save: ActionGuard::default(),
        }
    }

    pub fn user_challenge_id(&self) -> UserChallengeId {
        self.user_challenge_id
    }

    /// Reloads and drops unsaved edits from the previous visit.
    pub fn on_focus(&self) -> JoinHandle<()> {
        *lock(&self.edits) = None;
        self.joined.focus()
    }

    pub fn on_blur(&self) {
        self.joined.blur();
    }

    pub fn state(&self) -> QueryState<JoinedChallenge> {
        self.joined.state()
    }

    pub fn checked_steps(&self) -> BTreeSet<u32> {
        if let Some(edits) = lock(&self.edits).as_ref() {
            return edits.clone();
        }
        self.joined
            .with_data(|j| j.user_challenge.completed_steps.clone())
            .unwrap_or_default()
    }

    /// Flips one step. Ignored until the challenge has loaded, and for numbers
    /// that are not steps of this challenge.
    pub fn toggle_step(&self, step_no: u32) -> bool {
        let known = self
            .joined
            .with_data(|j| j.challenge.steps.iter().any(|s| s.step_no == step_no))
            .unwrap_or(false);
        if !known {
            return false;
        }
        let mut checked = self.checked_steps();
        if !checked.remove(&step_no) {
            checked.insert(step_no);
        }
        *lock(&self.edits) = Some(checked);
        true
    }

    /// Progress the checklist would have if saved now.
    pub fn preview_progress(&self) -> u8 {
        let checked = self.checked_steps();
        self.joined
            .with_data(|j| progress::progress_for_steps(&j.challenge.steps, &checked))
            .unwrap_or(0)
    }

    pub fn is_completed(&self) -> bool {
        progress::is_complete(self.preview_progress())
    }

    /// Days since the user started the challenge, if the start is known.
    pub fn days_elapsed(&self, now: DateTime<Utc>) -> Option<i64> {
        self.joined
            .with_data(|j| j.user_challenge.started_on)
            .flatten()
            .map(|start| progress::days_elapsed(start, now))
    }

    pub fn is_saving(&self) -> bool {
        self.save.is_busy()
    }

    /// Saves the checklist and returns the resulting progress. Fails with
    /// `NotLoaded` before the challenge has loaded, so an empty checklist is
    /// never sent in place of the user's real progress.
    pub async fn save_progress(&self) -> GatewayResult<u8> {
        self.save
            .run(async {
                let steps = self
                    .joined
                    .with_data(|j| j.challenge.steps.clone())
                    .ok_or(GatewayError::NotLoaded)?;
                let checked = self.checked_steps();
                self.gateway
                    .update_challenge_progress(self.user_challenge_id, &checked)
                    .await?;

                let saved = progress::progress_for_steps(&steps, &checked);
                self.joined.update(|j| {
                    j.user_challenge.completed_steps = checked.clone();
                    j.user_challenge.progress = saved;
                });
                // Toggles made while the request was pending stay unsaved.
                let mut edits = lock(&self.edits);
                if edits.as_ref() == Some(&checked) {
                    *edits = None;
                }
                Ok(saved)
            })
            .await
    }
}
