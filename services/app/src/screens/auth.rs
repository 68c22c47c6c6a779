//! services/app/src/screens/auth.rs
//!
//! Login and account-creation forms. Neither screen shows server data, so
//! there is no query here: just form state, local validation and the submit
//! action with its navigation outcome.

use super::{ActionGuard, Route};
use crate::error::GatewayResult;
use crate::gateway::ApiGateway;
use empathy_core::domain::{Credentials, Registration};
use empathy_core::validation::{self, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate_credentials(&self.credentials())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateAccountForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl CreateAccountForm {
    pub fn registration(&self) -> Registration {
        Registration {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }

    /// Field rules plus the confirm-password match, all reported together.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Err(e) = validation::validate_registration(&self.registration()) {
            errors.merge(e);
        }
        if let Err(e) = validation::validate_password_confirmation(&self.password, &self.confirm_password) {
            errors.merge(e);
        }
        errors.into_result()
    }
}

pub struct LoginScreen {
    gateway: ApiGateway,
    submit: ActionGuard,
}

impl LoginScreen {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            submit: ActionGuard::default(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submit.is_busy()
    }

    /// Signs in and returns the next route.
    pub async fn submit(&self, form: &LoginForm) -> GatewayResult<Route> {
        self.submit
            .run(async {
                self.gateway.login(&form.credentials()).await?;
                Ok(Route::Home)
            })
            .await
    }
}

pub struct CreateAccountScreen {
    gateway: ApiGateway,
    submit: ActionGuard,
}

impl CreateAccountScreen {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            submit: ActionGuard::default(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submit.is_busy()
    }

    /// Creates the account. Lands on `Home` when the backend signed the user
    /// in, otherwise on `Login`.
    pub async fn submit(&self, form: &CreateAccountForm) -> GatewayResult<Route> {
        form.validate()?;
        self.submit
            .run(async {
                let session = self.gateway.register(&form.registration()).await?;
                Ok(match session {
                    Some(_) => Route::Home,
                    None => Route::Login,
                })
            })
            .await
    }
}
