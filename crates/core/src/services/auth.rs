use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Credentials, Registration, Session};
use crate::services::account_store::AccountStore;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Sign-up, sign-in and sign-out with the form checks done before any remote call.
pub struct AuthService {
    store: Arc<dyn AccountStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, input: Registration) -> Result<Session> {
        if input.email.trim().is_empty()
            || input.password.is_empty()
            || input.confirm_password.is_empty()
        {
            return Err(Error::Validation("Please fill in all fields".into()));
        }

        if input.password != input.confirm_password {
            return Err(Error::Validation("Passwords do not match".into()));
        }

        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let user = self
            .store
            .sign_up(input.email.trim(), &input.password)
            .await?;
        tracing::info!(uid = %user.uid, "Registered");
        Ok(Session::new(user))
    }

    pub async fn login(&self, input: Credentials) -> Result<Session> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(Error::Validation("Please fill in all fields".into()));
        }

        let user = self
            .store
            .sign_in(input.email.trim(), &input.password)
            .await?;
        Ok(Session::new(user))
    }

    pub async fn logout(&self, session: Session) -> Result<()> {
        self.store.sign_out(&session).await
    }
}
