//! services/app/src/screens/share_story.rs
//!
//! The story composer. Shows the user's most recent story next to a draft
//! with its own tag list and visibility switches.

use super::{lock, ActionGuard, FocusQuery, QueryState};
use crate::error::GatewayResult;
use crate::gateway::ApiGateway;
use empathy_core::domain::{NewStory, Story, StoryFeedback};
use empathy_core::validation::{self, ValidationErrors};
use std::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryDraft {
    pub text: String,
    /// What the user is typing into the tag box.
    pub tag_input: String,
    /// Ordered set.
    pub tags: Vec<String>,
    pub is_shared: bool,
    pub is_anonymous: bool,
}

impl StoryDraft {
    /// Commits the tag box: trimmed, blank and duplicate tags are dropped.
    /// The box is cleared either way.
    pub fn commit_tag(&mut self) -> bool {
        let tag = self.tag_input.trim().to_string();
        self.tag_input.clear();
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn to_new_story(&self) -> NewStory {
        NewStory {
            text: self.text.clone(),
            tags: self.tags.clone(),
            is_shared: self.is_shared,
            is_anonymous: self.is_anonymous,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate_story(&self.to_new_story())
    }
}

pub struct ShareStoryScreen {
    gateway: ApiGateway,
    latest: FocusQuery<Option<Story>>,
    draft: Mutex<StoryDraft>,
    share: ActionGuard,
}

impl ShareStoryScreen {
    pub fn new(gateway: ApiGateway) -> Self {
        let fetcher = gateway.clone();
        let latest = FocusQuery::new("latest_own_story", move || {
            let gateway = fetcher.clone();
            async move {
                let mine = gateway.list_my_stories().await?;
                Ok(mine.into_iter().next())
            }
        });
        Self {
            gateway,
            latest,
            draft: Mutex::new(StoryDraft::default()),
            share: ActionGuard::default(),
        }
    }

    pub fn on_focus(&self) -> JoinHandle<()> {
        self.latest.focus()
    }

    pub fn on_blur(&self) {
        self.latest.blur();
    }

    /// The user's most recent story, `None` inside `Ready` if they have none.
    pub fn latest(&self) -> QueryState<Option<Story>> {
        self.latest.state()
    }

    pub fn draft(&self) -> StoryDraft {
        lock(&self.draft).clone()
    }

    /// Applies an edit to the draft, e.g. from a text field or a switch.
    pub fn edit(&self, f: impl FnOnce(&mut StoryDraft)) {
        f(&mut lock(&self.draft));
    }

    pub fn is_sharing(&self) -> bool {
        self.share.is_busy()
    }

    /// Posts the draft. On success the draft is cleared and, if the screen is
    /// still focused, the latest story panel reloads. The backend's
    /// encouragement is returned for display.
    pub async fn share(&self) -> GatewayResult<StoryFeedback> {
        let story = {
            let draft = lock(&self.draft);
            draft.validate()?;
            draft.to_new_story()
        };
        self.share
            .run(async {
                let feedback = self.gateway.add_story(&story).await?;
                *lock(&self.draft) = StoryDraft::default();
                let _ = self.latest.refetch();
                Ok(feedback)
            })
            .await
    }
}
