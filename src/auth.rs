use secrecy::SecretString;
use tracing::info;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::format;
use crate::session::{SessionError, SessionStore};
use crate::user::{
    Credentials, EmailRequest, LoginResponse, MessageResponse, ProfileUpdate, Registration, User,
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Account operations. The session store is passed in per call so that the
/// caller owns its lifetime; every profile the server returns is written
/// back to it.
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let problems = format::registration_problems(registration);
        if let Some(first) = problems.into_iter().next() {
            return Err(ApiError::Validation(first));
        }
        let user: User = self.api.post("auth/register", registration).await?;
        info!(user_id = %user.id, "registered account");
        Ok(user)
    }

    pub async fn login(
        &self,
        session: &mut SessionStore,
        credentials: &Credentials,
    ) -> Result<User, AuthError> {
        let response: LoginResponse = self.api.post("auth/login", credentials).await?;
        let user = response.user;
        session.begin(SecretString::from(response.access_token), user.clone())?;
        info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    pub fn logout(&self, session: &mut SessionStore) -> Result<(), SessionError> {
        session.end()?;
        info!("logged out");
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> Result<String, ApiError> {
        let response: MessageResponse = self
            .api
            .get_with_query("auth/verify-email", &[("token", token)])
            .await?;
        Ok(response.message)
    }

    pub async fn resend_verification(&self, email: &str) -> Result<String, ApiError> {
        let response: MessageResponse = self
            .api
            .post("auth/resend-verification", &EmailRequest { email })
            .await?;
        Ok(response.message)
    }

    /// Fetches `/users/me` and refreshes the cached user.
    pub async fn refresh_user(&self, session: &mut SessionStore) -> Result<User, AuthError> {
        let user: User = self.authorized(session).get("users/me").await?;
        session.set_user(user.clone())?;
        Ok(user)
    }

    pub async fn update_profile(
        &self,
        session: &mut SessionStore,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        if let Some(username) = &update.username {
            if let Some(problem) = format::username_problem(username) {
                return Err(ApiError::Validation(problem.to_string()).into());
            }
        }
        let user: User = self.authorized(session).put("users/me", update).await?;
        session.set_user(user.clone())?;
        info!(user_id = %user.id, "updated profile");
        Ok(user)
    }

    fn authorized(&self, session: &SessionStore) -> ApiClient {
        self.api.clone().with_token(session.token())
    }
}
