//! services/app/src/screens/challenges.rs

use super::{lock, ActionGuard, FocusQuery, QueryState, Route};
use crate::error::GatewayResult;
use crate::gateway::ApiGateway;
use empathy_core::domain::{Challenge, ChallengeId, JoinRequest};
use empathy_core::search;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

/// The challenge catalogue with client-side search and joining.
pub struct ChallengesScreen {
    gateway: ApiGateway,
    challenges: FocusQuery<Vec<Challenge>>,
    search: Mutex<String>,
    join: ActionGuard,
}

impl ChallengesScreen {
    pub fn new(gateway: ApiGateway) -> Self {
        let fetcher = gateway.clone();
        let challenges = FocusQuery::new("challenges", move || {
            let gateway = fetcher.clone();
            async move { gateway.list_challenges().await }
        });
        Self {
            gateway,
            challenges,
            search: Mutex::new(String::new()),
            join: ActionGuard::default(),
        }
    }

    pub fn on_focus(&self) -> JoinHandle<()> {
        self.challenges.focus()
    }

    pub fn on_blur(&self) {
        self.challenges.blur();
    }

    pub fn state(&self) -> QueryState<Vec<Challenge>> {
        self.challenges.state()
    }

    pub fn set_search(&self, query: &str) {
        *lock(&self.search) = query.to_string();
    }

    /// The loaded challenges matching the current search, in backend order.
    /// Empty while loading or after a failure.
    pub fn visible(&self) -> Vec<Challenge> {
        let query = lock(&self.search).clone();
        self.challenges
            .with_data(|all| search::filter(all, &query).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_joining(&self) -> bool {
        self.join.is_busy()
    }

    /// Joins and routes to the detail screen of the resulting record, whether
    /// it is new or the user had already joined.
    pub async fn join(&self, challenge_id: ChallengeId) -> GatewayResult<Route> {
        self.join
            .run(async {
                let outcome = self
                    .gateway
                    .join_challenge(&JoinRequest::starting_now(challenge_id))
                    .await?;
                if outcome.already_joined {
                    info!(challenge_id, "Challenge was already joined; opening it");
                }
                Ok(Route::ChallengeDetail {
                    user_challenge_id: outcome.user_challenge_id,
                })
            })
            .await
    }
}
