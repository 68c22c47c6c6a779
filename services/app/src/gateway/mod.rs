//! services/app/src/gateway/mod.rs
//!
//! The API gateway: one async function per backend capability. Every function
//! reads the session from the injected `SessionStore` (never from a cached copy),
//! performs at most one round-trip through the injected `HttpTransport`, and
//! returns a `GatewayResult`.

pub mod auth;
pub mod challenges;
pub mod profile;
pub mod stories;
pub mod wire;

use crate::error::{GatewayError, GatewayResult};
use empathy_core::domain::{Session, UserId};
use empathy_core::ports::{ApiRequest, ApiResponse, HttpTransport, SessionStore};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;
use wire::{failure_code, failure_details, Envelope};

//=========================================================================================
// Endpoint Paths (relative to the configured base URL)
//=========================================================================================

pub const AUTH_REGISTER: &str = "Auth/register";
pub const AUTH_LOGIN: &str = "Auth/login";
pub const CHALLENGES_ALL: &str = "UserChallenge/get-all-challenges";
pub const CHALLENGE_JOIN: &str = "UserChallenge/join-challenge";
pub const CHALLENGE_JOINED_DETAIL: &str = "UserChallenge/get-newly-joined-challenge";
pub const CHALLENGE_UPDATE_STEPS: &str = "UserChallenge/update-challenge-steps";
pub const STORIES_ALL: &str = "UserStory/get-user-stories";
pub const STORIES_BY_USER: &str = "UserStory/get-user-stories-by-userId";
pub const STORY_ADD: &str = "UserStory/add-user-story";
pub const STORY_LIKE: &str = "UserStory/like-user-story";
pub const PROFILE_DETAILS: &str = "User/get-user-profile-details";

//=========================================================================================
// The Gateway
//=========================================================================================

#[derive(Clone)]
pub struct ApiGateway {
    transport: Arc<dyn HttpTransport>,
    sessions: Arc<dyn SessionStore>,
}

impl ApiGateway {
    pub fn new(transport: Arc<dyn HttpTransport>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            transport,
            sessions,
        }
    }

    /// The stored session, if any. A store that cannot be read counts as empty.
    pub async fn current_session(&self) -> Option<Session> {
        match self.sessions.load().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session store unreadable, treating as signed out: {}", e);
                None
            }
        }
    }

    /// The session of an authenticated user, or `Unauthenticated` without
    /// touching the network.
    async fn require_session(&self) -> GatewayResult<Session> {
        self.current_session()
            .await
            .filter(Session::is_authenticated)
            .ok_or(GatewayError::Unauthenticated)
    }

    fn require_user_id(session: &Session) -> GatewayResult<UserId> {
        session.user_id.ok_or(GatewayError::Unauthenticated)
    }

    /// Exactly one transport call; transport failures become `Network`.
    async fn round_trip(&self, request: ApiRequest) -> GatewayResult<ApiResponse> {
        let path = request.path.clone();
        self.transport.send(request).await.map_err(|e| {
            warn!("Request to {} failed in transport: {}", path, e);
            GatewayError::from(e)
        })
    }

    /// Attaches the session's bearer token. A 401 means the token is no longer
    /// valid: the session is cleared and the call reports `Unauthenticated`.
    async fn send_authorized(
        &self,
        session: &Session,
        request: ApiRequest,
    ) -> GatewayResult<ApiResponse> {
        let token = session.bearer().ok_or(GatewayError::Unauthenticated)?;
        let response = self.round_trip(request.with_bearer(token)).await?;
        if response.status == 401 {
            warn!("Backend rejected the session token; clearing session");
            if let Err(e) = self.sessions.clear().await {
                warn!("Failed to clear rejected session: {}", e);
            }
            return Err(GatewayError::Unauthenticated);
        }
        Ok(response)
    }
}

//=========================================================================================
// Response Normalisation
//=========================================================================================

/// Non-2xx responses and `success: false` envelopes become `Backend` failures
/// carrying the backend's status string when it sent one.
fn accept(response: ApiResponse) -> GatewayResult<Envelope> {
    let status = response.status;
    if !response.is_success() {
        return Err(GatewayError::backend(
            Some(status),
            failure_code(&response.body),
            failure_details(&response.body),
        ));
    }
    let code = failure_code(&response.body);
    let details = failure_details(&response.body);
    let envelope = Envelope::from_body(response.body);
    if envelope.success == Some(false) {
        return Err(GatewayError::backend(Some(status), code, details));
    }
    Ok(envelope)
}

/// Mutation envelopes must carry the expected status string, unless they
/// carry none at all or flag success explicitly.
fn expect_message(envelope: &Envelope, status: u16, expected: &str) -> GatewayResult<()> {
    match envelope.message.as_deref() {
        Some(m) if m != expected && envelope.success != Some(true) => Err(GatewayError::backend(
            Some(status),
            Some(m.to_string()),
            None,
        )),
        _ => Ok(()),
    }
}

fn decode<T: DeserializeOwned>(data: Value, status: u16, what: &str) -> GatewayResult<T> {
    serde_json::from_value(data).map_err(|e| {
        warn!("Could not decode {}: {}", what, e);
        GatewayError::unexpected_response(status, what)
    })
}

/// A list `data`; a missing list is an empty one.
fn decode_list<R, T>(data: Value, status: u16, what: &str, convert: fn(R) -> T) -> GatewayResult<Vec<T>>
where
    R: DeserializeOwned,
{
    if data.is_null() {
        return Ok(Vec::new());
    }
    let records: Vec<R> = decode(data, status, what)?;
    Ok(records.into_iter().map(convert).collect())
}
