//! services/app/src/gateway/auth.rs
//!
//! Account creation, login and logout.

use super::wire::{failure_code, LoginRecord, LOGIN_FAILED, USER_ALREADY_EXISTS, USER_REGISTERED};
use super::{accept, expect_message, ApiGateway, AUTH_LOGIN, AUTH_REGISTER};
use crate::error::{GatewayError, GatewayResult};
use empathy_core::domain::{Credentials, Registration, Session};
use empathy_core::ports::ApiRequest;
use empathy_core::validation;
use serde_json::json;
use tracing::{info, warn};

impl ApiGateway {
    /// Creates an account. Returns the new session when the backend logs the
    /// user straight in (its response carries a token); it is saved before
    /// returning.
    pub async fn register(&self, input: &Registration) -> GatewayResult<Option<Session>> {
        validation::validate_registration(input)?;

        let request = ApiRequest::post(
            AUTH_REGISTER,
            json!({
                "firstName": input.first_name.trim(),
                "lastName": input.last_name.trim(),
                "email": input.email.trim(),
                "password": input.password,
            }),
        );
        let response = self.round_trip(request).await?;
        let status = response.status;
        if failure_code(&response.body).as_deref() == Some(USER_ALREADY_EXISTS) {
            info!("Registration refused: account already exists");
            return Err(GatewayError::AccountExists);
        }

        let envelope = accept(response)?;
        expect_message(&envelope, status, USER_REGISTERED)?;

        let session = serde_json::from_value::<LoginRecord>(envelope.data)
            .ok()
            .and_then(LoginRecord::to_domain);
        if let Some(session) = &session {
            self.store_session(session).await?;
        }
        info!("Account registered");
        Ok(session)
    }

    /// Authenticates and saves the resulting session.
    pub async fn login(&self, credentials: &Credentials) -> GatewayResult<Session> {
        validation::validate_credentials(credentials)?;

        let request = ApiRequest::post(
            AUTH_LOGIN,
            json!({
                "email": credentials.email.trim(),
                "password": credentials.password,
            }),
        );
        let response = self.round_trip(request).await?;
        let status = response.status;
        if status == 401 || failure_code(&response.body).as_deref() == Some(LOGIN_FAILED) {
            return Err(GatewayError::InvalidCredentials);
        }

        let envelope = accept(response)?;
        let session = serde_json::from_value::<LoginRecord>(envelope.data)
            .ok()
            .and_then(LoginRecord::to_domain)
            .ok_or_else(|| GatewayError::unexpected_response(status, "login without a token"))?;

        self.store_session(&session).await?;
        info!("Logged in as user {:?}", session.user_id);
        Ok(session)
    }

    /// Removes the stored session. Later authenticated calls fail fast.
    pub async fn logout(&self) -> GatewayResult<()> {
        self.sessions.clear().await.map_err(|e| {
            warn!("Failed to clear session: {}", e);
            GatewayError::Storage(e.to_string())
        })?;
        info!("Logged out");
        Ok(())
    }

    async fn store_session(&self, session: &Session) -> GatewayResult<()> {
        self.sessions
            .save(session)
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))
    }
}
