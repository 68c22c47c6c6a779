//! services/app/src/screens/navigation.rs

use empathy_core::domain::UserChallengeId;
use empathy_core::ports::SessionStore;
use tracing::warn;

/// Every destination in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Welcome,
    CreateAccount,
    Login,
    Home,
    Challenges,
    ChallengeDetail { user_challenge_id: UserChallengeId },
    FeaturedStories,
    ShareStory,
    Profile,
}

impl Route {
    /// Routes reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Welcome | Route::CreateAccount | Route::Login)
    }
}

/// Where the app opens: straight to `Home` for a stored session with a token,
/// otherwise the welcome screen.
pub async fn initial_route(store: &dyn SessionStore) -> Route {
    match store.load().await {
        Ok(Some(session)) if session.is_authenticated() => Route::Home,
        Ok(_) => Route::Welcome,
        Err(e) => {
            warn!("Session store unreadable at startup: {}", e);
            Route::Welcome
        }
    }
}
