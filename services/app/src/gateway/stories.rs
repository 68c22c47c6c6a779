//! services/app/src/gateway/stories.rs
//!
//! Story feeds, posting and likes.

use super::wire::{StoryFeedbackRecord, StoryRecord, STORY_POSTED};
use super::{
    accept, decode_list, expect_message, ApiGateway, STORIES_ALL, STORIES_BY_USER, STORY_ADD,
    STORY_LIKE,
};
use crate::error::GatewayResult;
use empathy_core::domain::{NewStory, Story, StoryFeedback, StoryId};
use empathy_core::ports::ApiRequest;
use empathy_core::validation;
use serde_json::json;
use tracing::info;

/// Trimmed, non-empty, first occurrence wins.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

impl ApiGateway {
    /// Every shared story, in backend order.
    pub async fn list_stories(&self) -> GatewayResult<Vec<Story>> {
        let session = self.require_session().await?;
        let response = self
            .send_authorized(&session, ApiRequest::get(STORIES_ALL))
            .await?;
        let status = response.status;
        let envelope = accept(response)?;
        decode_list(envelope.data, status, "story list", StoryRecord::to_domain)
    }

    /// The signed-in user's own stories.
    pub async fn list_my_stories(&self) -> GatewayResult<Vec<Story>> {
        let session = self.require_session().await?;
        let user_id = Self::require_user_id(&session)?;
        let request = ApiRequest::get(STORIES_BY_USER).with_query("userId", user_id);
        let response = self.send_authorized(&session, request).await?;
        let status = response.status;
        let envelope = accept(response)?;
        decode_list(envelope.data, status, "own story list", StoryRecord::to_domain)
    }

    /// Posts a story. Blank text is rejected locally before anything is sent.
    pub async fn add_story(&self, story: &NewStory) -> GatewayResult<StoryFeedback> {
        validation::validate_story(story)?;
        let session = self.require_session().await?;
        let user_id = Self::require_user_id(&session)?;

        let body = json!({
            "userId": user_id,
            "story": story.text.trim(),
            "tags": normalize_tags(&story.tags),
            "isShared": story.is_shared,
            "isAnonymous": story.is_anonymous,
        });
        let response = self
            .send_authorized(&session, ApiRequest::post(STORY_ADD, body))
            .await?;
        let status = response.status;
        let envelope = accept(response)?;
        expect_message(&envelope, status, STORY_POSTED)?;

        let feedback = serde_json::from_value::<StoryFeedbackRecord>(envelope.data)
            .map(|r| r.feedback)
            .unwrap_or(None);
        info!("Story posted");
        Ok(StoryFeedback { feedback })
    }

    /// Likes a story. Callers re-fetch afterwards instead of bumping counters.
    pub async fn like_story(&self, story_id: StoryId) -> GatewayResult<()> {
        let session = self.require_session().await?;
        let user_id = Self::require_user_id(&session)?;
        let body = json!({ "userStoryId": story_id, "userId": user_id });
        let response = self
            .send_authorized(&session, ApiRequest::post(STORY_LIKE, body))
            .await?;
        accept(response)?;
        info!(story_id, "Story liked");
        Ok(())
    }
}
