//! services/app/src/gateway/profile.rs

use super::wire::ProfileRecord;
use super::{accept, decode, ApiGateway, PROFILE_DETAILS};
use crate::error::{GatewayError, GatewayResult};
use empathy_core::domain::ProfileSummary;
use empathy_core::ports::ApiRequest;

impl ApiGateway {
    /// The signed-in user's profile. Unparseable rewards degrade to none.
    pub async fn profile_summary(&self) -> GatewayResult<ProfileSummary> {
        let session = self.require_session().await?;
        let user_id = Self::require_user_id(&session)?;
        let request = ApiRequest::get(PROFILE_DETAILS).with_query("userId", user_id);
        let response = self.send_authorized(&session, request).await?;
        let status = response.status;
        let envelope = accept(response)?;
        if envelope.data.is_null() {
            return Err(GatewayError::unexpected_response(status, "empty profile"));
        }
        let record: ProfileRecord = decode(envelope.data, status, "profile")?;
        Ok(record.to_domain())
    }
}
