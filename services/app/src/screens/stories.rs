//! services/app/src/screens/stories.rs

use super::{lock, ActionGuard, FocusQuery, QueryState};
use crate::error::GatewayResult;
use crate::gateway::ApiGateway;
use empathy_core::domain::{Story, StoryId};
use empathy_core::search;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

/// The shared-stories feed with search and likes.
pub struct FeaturedStoriesScreen {
    gateway: ApiGateway,
    stories: FocusQuery<Vec<Story>>,
    search: Mutex<String>,
    like: ActionGuard,
}

impl FeaturedStoriesScreen {
    pub fn new(gateway: ApiGateway) -> Self {
        let fetcher = gateway.clone();
        let stories = FocusQuery::new("featured_stories", move || {
            let gateway = fetcher.clone();
            async move { gateway.list_stories().await }
        });
        Self {
            gateway,
            stories,
            search: Mutex::new(String::new()),
            like: ActionGuard::default(),
        }
    }

    pub fn on_focus(&self) -> JoinHandle<()> {
        self.stories.focus()
    }

    pub fn on_blur(&self) {
        self.stories.blur();
    }

    pub fn state(&self) -> QueryState<Vec<Story>> {
        self.stories.state()
    }

    pub fn set_search(&self, query: &str) {
        *lock(&self.search) = query.to_string();
    }

    pub fn visible(&self) -> Vec<Story> {
        let query = lock(&self.search).clone();
        self.stories
            .with_data(|all| search::filter(all, &query).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_liking(&self) -> bool {
        self.like.is_busy()
    }

    /// Likes a story, then re-lists once the like is acknowledged so the
    /// counts come from the backend. No re-list if the screen lost focus.
    pub async fn like(&self, story_id: StoryId) -> GatewayResult<()> {
        self.like
            .run(async {
                self.gateway.like_story(story_id).await?;
                if let Some(refresh) = self.stories.refetch() {
                    if let Err(e) = refresh.await {
                        warn!("Story refresh after like did not finish: {}", e);
                    }
                }
                Ok(())
            })
            .await
    }
}
