//! services/app/src/screens/profile.rs

use super::{ActionGuard, FocusQuery, QueryState, Route};
use crate::error::GatewayResult;
use crate::gateway::ApiGateway;
use chrono::{DateTime, Utc};
use empathy_core::domain::ProfileSummary;
use tokio::task::JoinHandle;

/// Shown when the join date is missing or unparseable.
pub const UNKNOWN_DATE: &str = "—";

/// `Month YYYY`, e.g. `March 2024`.
pub fn member_since(joined: Option<DateTime<Utc>>) -> String {
    joined
        .map(|date| date.format("%B %Y").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

pub struct ProfileScreen {
    gateway: ApiGateway,
    profile: FocusQuery<ProfileSummary>,
    logout: ActionGuard,
}

impl ProfileScreen {
    pub fn new(gateway: ApiGateway) -> Self {
        let fetcher = gateway.clone();
        let profile = FocusQuery::new("profile", move || {
            let gateway = fetcher.clone();
            async move { gateway.profile_summary().await }
        });
        Self {
            gateway,
            profile,
            logout: ActionGuard::default(),
        }
    }

    pub fn on_focus(&self) -> JoinHandle<()> {
        self.profile.focus()
    }

    pub fn on_blur(&self) {
        self.profile.blur();
    }

    pub fn state(&self) -> QueryState<ProfileSummary> {
        self.profile.state()
    }

    pub fn member_since(&self) -> String {
        member_since(self.profile.with_data(|p| p.joined_date).flatten())
    }

    /// Ends the session; the app returns to the welcome screen.
    pub async fn logout(&self) -> GatewayResult<Route> {
        self.logout
            .run(async {
                self.profile.blur();
                self.gateway.logout().await?;
                Ok(Route::Welcome)
            })
            .await
    }
}
