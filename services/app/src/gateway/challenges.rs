//! services/app/src/gateway/challenges.rs
//!
//! Challenge listing, joining, detail and step progress.

use super::wire::{
    joined_id, ChallengeRecord, Envelope, JoinedChallengeRecord, CHALLENGE_ALREADY_JOINED,
    CHALLENGE_JOINED,
};
use super::{
    accept, decode, decode_list, ApiGateway, CHALLENGES_ALL, CHALLENGE_JOIN,
    CHALLENGE_JOINED_DETAIL, CHALLENGE_UPDATE_STEPS,
};
use crate::error::{GatewayError, GatewayResult};
use empathy_core::domain::{Challenge, JoinOutcome, JoinRequest, JoinedChallenge, UserChallengeId};
use empathy_core::ports::ApiRequest;
use serde_json::json;
use std::collections::BTreeSet;
use tracing::info;

impl ApiGateway {
    /// All challenges, in the order the backend returned them.
    pub async fn list_challenges(&self) -> GatewayResult<Vec<Challenge>> {
        let session = self.require_session().await?;
        let response = self
            .send_authorized(&session, ApiRequest::get(CHALLENGES_ALL))
            .await?;
        let status = response.status;
        let envelope = accept(response)?;
        decode_list(envelope.data, status, "challenge list", ChallengeRecord::to_domain)
    }

    /// Joins a challenge. Joining one the user already has is not an error:
    /// the backend answers with the existing record's id and both outcomes
    /// surface the id the same way.
    pub async fn join_challenge(&self, request: &JoinRequest) -> GatewayResult<JoinOutcome> {
        let session = self.require_session().await?;
        let user_id = Self::require_user_id(&session)?;

        let body = json!({
            "userId": user_id,
            "challengeId": request.challenge_id,
            "startedOn": request.started_on.to_rfc3339(),
            "progress": request.initial_progress,
        });
        let response = self
            .send_authorized(&session, ApiRequest::post(CHALLENGE_JOIN, body))
            .await?;
        let status = response.status;

        let envelope = Envelope::from_body(response.body.clone());
        let already_joined = envelope.has_message(CHALLENGE_ALREADY_JOINED);
        if !(already_joined || envelope.has_message(CHALLENGE_JOINED)) {
            // Neither join code: report the backend's failure as-is.
            let envelope = accept(response)?;
            return Err(GatewayError::backend(Some(status), envelope.message, None));
        }

        let user_challenge_id = joined_id(&envelope.data).ok_or_else(|| {
            GatewayError::unexpected_response(status, "join without a user challenge id")
        })?;
        info!(
            challenge_id = request.challenge_id,
            user_challenge_id, already_joined, "Challenge joined"
        );
        Ok(JoinOutcome {
            user_challenge_id,
            already_joined,
        })
    }

    /// The joined challenge merged with the user's progress record.
    pub async fn get_joined_challenge(
        &self,
        user_challenge_id: UserChallengeId,
    ) -> GatewayResult<JoinedChallenge> {
        let session = self.require_session().await?;
        let request = ApiRequest::get(CHALLENGE_JOINED_DETAIL).with_query("id", user_challenge_id);
        let response = self.send_authorized(&session, request).await?;
        let status = response.status;
        let envelope = accept(response)?;
        let record: JoinedChallengeRecord = decode(envelope.data, status, "joined challenge")?;
        Ok(record.to_domain())
    }

    /// Saves the set of completed steps. The backend recomputes progress; the
    /// authoritative value comes back with the next fetch.
    pub async fn update_challenge_progress(
        &self,
        user_challenge_id: UserChallengeId,
        completed_steps: &BTreeSet<u32>,
    ) -> GatewayResult<()> {
        let session = self.require_session().await?;
        let body = json!({
            "userChallengeId": user_challenge_id,
            "completedSteps": completed_steps.iter().collect::<Vec<_>>(),
        });
        let response = self
            .send_authorized(&session, ApiRequest::put(CHALLENGE_UPDATE_STEPS, body))
            .await?;
        accept(response)?;
        info!(user_challenge_id, steps = completed_steps.len(), "Challenge progress saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{gateway_with, signed_in, FakeTransport};
    use empathy_core::ports::HttpMethod;
    use serde_json::Value;

    #[tokio::test]
    async fn challenges_keep_backend_order() {
        let transport = FakeTransport::new();
        transport.respond(
            CHALLENGES_ALL,
            200,
            json!({"data": [
                {"id": 3, "name": "Zeta", "category": "Kindness", "difficulty": "Easy", "activeUserCount": 4},
                {"id": 1, "name": "Alpha", "category": "Community", "difficulty": "Hard"}
            ]}),
        );
        let gateway = gateway_with(&transport, Some(signed_in()));
        let list = gateway.list_challenges().await.unwrap();
        assert_eq!(list.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(list[0].active_user_count, 4);
        assert_eq!(transport.calls()[0].bearer.as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn fresh_and_repeated_joins_surface_the_same_id() {
        let transport = FakeTransport::new();
        transport.respond(
            CHALLENGE_JOIN,
            200,
            json!({"message": CHALLENGE_JOINED, "data": {"userChallengeId": 42}}),
        );
        transport.respond(
            CHALLENGE_JOIN,
            200,
            json!({"message": CHALLENGE_ALREADY_JOINED, "data": 42}),
        );
        let gateway = gateway_with(&transport, Some(signed_in()));
        let request = JoinRequest::starting_now(7);

        let first = gateway.join_challenge(&request).await.unwrap();
        let second = gateway.join_challenge(&request).await.unwrap();
        assert_eq!(first.user_challenge_id, 42);
        assert_eq!(second.user_challenge_id, first.user_challenge_id);
        assert!(!first.already_joined);
        assert!(second.already_joined);

        let call = &transport.calls()[0];
        assert_eq!(call.method, HttpMethod::Post);
        let body = call.body.as_ref().unwrap();
        assert_eq!(body["userId"], 1);
        assert_eq!(body["challengeId"], 7);
        assert_eq!(body["progress"], 0);
    }

    #[tokio::test]
    async fn already_joined_reported_with_conflict_status_is_still_success() {
        let transport = FakeTransport::new();
        transport.respond(
            CHALLENGE_JOIN,
            409,
            json!({"message": CHALLENGE_ALREADY_JOINED, "data": {"id": 42}}),
        );
        let gateway = gateway_with(&transport, Some(signed_in()));
        let outcome = gateway.join_challenge(&JoinRequest::starting_now(7)).await.unwrap();
        assert_eq!(outcome.user_challenge_id, 42);
    }

    #[tokio::test]
    async fn join_failures_and_missing_ids_are_errors() {
        let transport = FakeTransport::new();
        transport.respond(CHALLENGE_JOIN, 400, json!({"message": "challenge_closed"}));
        let gateway = gateway_with(&transport, Some(signed_in()));
        let err = gateway.join_challenge(&JoinRequest::starting_now(7)).await.unwrap_err();
        assert_eq!(err.message(), "challenge_closed");

        let transport = FakeTransport::new();
        transport.respond(CHALLENGE_JOIN, 200, json!({"message": CHALLENGE_JOINED}));
        let gateway = gateway_with(&transport, Some(signed_in()));
        let err = gateway.join_challenge(&JoinRequest::starting_now(7)).await.unwrap_err();
        assert!(err.message().starts_with("Unexpected response"));
    }

    #[tokio::test]
    async fn joined_detail_is_requested_by_id() {
        let transport = FakeTransport::new();
        transport.respond(
            CHALLENGE_JOINED_DETAIL,
            200,
            json!({"data": {
                "challengeDto": {"id": 7, "name": "Listen", "challengeDetail": [
                    {"stepNo": 1, "stepText": "a"}, {"stepNo": 2, "stepText": "b"}
                ]},
                "userChallengeDto": {"id": 42, "challengeId": 7, "progress": 50, "completedSteps": [2]}
            }}),
        );
        let gateway = gateway_with(&transport, Some(signed_in()));
        let joined = gateway.get_joined_challenge(42).await.unwrap();
        assert_eq!(joined.user_challenge.progress, 50);
        assert_eq!(joined.user_challenge.completed_steps, BTreeSet::from([2]));
        assert_eq!(
            transport.calls()[0].query,
            vec![("id".to_string(), "42".to_string())]
        );
    }

    #[tokio::test]
    async fn malformed_detail_is_an_error_not_a_panic() {
        let transport = FakeTransport::new();
        transport.respond(CHALLENGE_JOINED_DETAIL, 200, json!({"data": [1, 2, 3]}));
        let gateway = gateway_with(&transport, Some(signed_in()));
        assert!(gateway.get_joined_challenge(42).await.is_err());
    }

    #[tokio::test]
    async fn progress_update_sends_sorted_step_numbers() {
        let transport = FakeTransport::new();
        transport.respond(CHALLENGE_UPDATE_STEPS, 200, Value::Null);
        let gateway = gateway_with(&transport, Some(signed_in()));
        gateway
            .update_challenge_progress(42, &BTreeSet::from([3, 1]))
            .await
            .unwrap();
        let call = &transport.calls()[0];
        assert_eq!(call.method, HttpMethod::Put);
        assert_eq!(
            call.body,
            Some(json!({"userChallengeId": 42, "completedSteps": [1, 3]}))
        );
    }
}
