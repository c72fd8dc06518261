//! Signed-in admin session

use crate::Result;
use adminfix_rest::{AuthUser, Credentials, RestClient, Session};

/// A REST client authorized as the admin user
pub struct AdminSession {
    pub client: RestClient,
    pub session: Session,
    pub user: AuthUser,
}

impl AdminSession {
    /// Sign in, then fetch the user behind the token
    pub async fn open(mut client: RestClient, credentials: &Credentials) -> Result<Self> {
        let session = client
            .sign_in(&credentials.email, credentials.password())
            .await?;
        tracing::debug!("Signed in as {}", credentials.email);
        if let Some(expires_in) = session.expires_in {
            tracing::debug!("Token expires in {}s", expires_in);
        }

        client.set_session(&session);
        let user = client.current_user().await?;
        tracing::debug!("User ID: {}", user.id);

        Ok(Self {
            client,
            session,
            user,
        })
    }

    /// Sign in again with the same credentials to prove the login still works
    pub async fn verify_login(&self, credentials: &Credentials) -> Result<()> {
        self.client
            .sign_in(&credentials.email, credentials.password())
            .await?;
        Ok(())
    }

    /// Revoke the session. Failures are logged, not returned.
    pub async fn close(self) {
        if let Err(e) = self.client.sign_out().await {
            tracing::warn!("Sign out failed: {}", e);
        }
    }
}
