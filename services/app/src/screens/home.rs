//! services/app/src/screens/home.rs
//!
//! The landing screen: a featured story panel and a current challenge panel.
//! Each panel has its own query, so one failing leaves the other intact.

use super::{FocusQuery, QueryState};
use crate::gateway::ApiGateway;
use empathy_core::domain::{Challenge, Session, Story};
use tokio::task::JoinHandle;

pub struct HomeScreen {
    gateway: ApiGateway,
    story: FocusQuery<Option<Story>>,
    challenge: FocusQuery<Option<Challenge>>,
}

impl HomeScreen {
    pub fn new(gateway: ApiGateway) -> Self {
        let stories = gateway.clone();
        let story = FocusQuery::new("home_story", move || {
            let gateway = stories.clone();
            async move {
                let all = gateway.list_stories().await?;
                Ok(all.into_iter().find(|s| s.is_shared))
            }
        });
        let challenges = gateway.clone();
        let challenge = FocusQuery::new("home_challenge", move || {
            let gateway = challenges.clone();
            async move { Ok(gateway.list_challenges().await?.into_iter().next()) }
        });
        Self {
            gateway,
            story,
            challenge,
        }
    }

    /// Starts both panel loads; they complete independently.
    pub fn on_focus(&self) -> Vec<JoinHandle<()>> {
        vec![self.story.focus(), self.challenge.focus()]
    }

    pub fn on_blur(&self) {
        self.story.blur();
        self.challenge.blur();
    }

    pub fn featured_story(&self) -> QueryState<Option<Story>> {
        self.story.state()
    }

    pub fn current_challenge(&self) -> QueryState<Option<Challenge>> {
        self.challenge.state()
    }

    /// Who to greet; read fresh from the session store.
    pub async fn greeting_name(&self) -> Option<String> {
        self.gateway
            .current_session()
            .await
            .as_ref()
            .map(Session::display_name)
            .filter(|name| !name.is_empty())
    }
}
