//! Registration, login, and the password reset flow.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::{User, mask_email};
use crate::error::{DomainError, FieldError};
use crate::ports::{
    Mailer, OutgoingMail, PasswordService, ResetTokenError, ResetTokenStore, UserRepository,
};
use crate::validation::{validate_password, validate_registration};

const INVALID_RESET_TOKEN: &str = "Invalid or expired password reset token";

/// Where reset links point and how long their tokens live.
#[derive(Debug, Clone)]
pub struct ResetPolicy {
    pub link_base_url: String,
    pub token_ttl: Duration,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            link_base_url: "http://localhost:3000/change-password".to_string(),
            token_ttl: Duration::from_secs(3600),
        }
    }
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    reset_tokens: Arc<dyn ResetTokenStore>,
    mailer: Arc<dyn Mailer>,
    policy: ResetPolicy,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        reset_tokens: Arc<dyn ResetTokenStore>,
        mailer: Arc<dyn Mailer>,
        policy: ResetPolicy,
    ) -> Self {
        Self {
            users,
            passwords,
            reset_tokens,
            mailer,
            policy,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        if let Some(error) = validate_registration(username, email, password) {
            return Err(DomainError::Validation(vec![error]));
        }

        let (by_username, by_email) = futures::try_join!(
            self.users.find_by_username(username),
            self.users.find_by_email(email),
        )?;
        if by_username.is_some() || by_email.is_some() {
            let error = if by_username.is_some() {
                FieldError::new("username", "Username already taken")
            } else {
                FieldError::new("email", "Email already taken")
            };
            return Err(DomainError::Duplicate {
                message: "Duplicated username or email".to_string(),
                errors: vec![error],
            });
        }

        let password_hash = self.hash(password)?;
        let user = self
            .users
            .insert(User::new(username.to_string(), email.to_string(), password_hash))
            .await?;

        tracing::info!(user_id = %user.id, email = %mask_email(email), "User registered");
        Ok(user)
    }

    /// Identifiers containing `@` are looked up as emails, anything else as a
    /// username.
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<User, DomainError> {
        let found = if username_or_email.contains('@') {
            self.users.find_by_email(username_or_email).await?
        } else {
            self.users.find_by_username(username_or_email).await?
        };

        let Some(user) = found else {
            return Err(DomainError::invalid(
                "usernameOrEmail",
                "Username or email incorrect",
            ));
        };

        if !self.verify(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(DomainError::invalid("password", "Wrong password"));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    pub async fn me(&self, caller: Option<Uuid>) -> Result<Option<User>, DomainError> {
        match caller {
            Some(id) => Ok(self.users.find_by_id(id).await?),
            None => Ok(None),
        }
    }

    /// Issue a reset token and mail a link. Unknown addresses succeed
    /// silently, as do mail failures, so the response never reveals whether
    /// an account exists.
    pub async fn forgot_password(&self, email: &str) -> Result<(), DomainError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!(email = %mask_email(email), "Reset requested for unknown email");
            return Ok(());
        };

        let token = Uuid::new_v4().to_string();
        let token_hash = self.hash(&token)?;
        self.reset_tokens
            .put(user.id, &token_hash, self.policy.token_ttl)
            .await?;

        let link = format!(
            "{}?token={}&userId={}",
            self.policy.link_base_url, token, user.id
        );
        let mail = OutgoingMail {
            to: user.email.clone(),
            subject: "Reset your password".to_string(),
            html: format!(r#"<a href="{link}">Click here to reset your password</a>"#),
        };

        if let Err(e) = self.mailer.send(mail).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send reset mail");
        } else {
            tracing::info!(user_id = %user.id, "Reset mail sent");
        }

        Ok(())
    }

    /// Consume a reset token and set a new password.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        token: &str,
        new_password: &str,
    ) -> Result<User, DomainError> {
        if let Some(error) = validate_password("newPassword", new_password) {
            return Err(DomainError::Validation(vec![error]));
        }

        let Some(token_hash) = self.reset_tokens.get(user_id).await? else {
            return Err(DomainError::invalid("token", INVALID_RESET_TOKEN));
        };
        if !self.verify(token, &token_hash)? {
            return Err(DomainError::invalid("token", INVALID_RESET_TOKEN));
        }

        let Some(mut user) = self.users.find_by_id(user_id).await? else {
            return Err(DomainError::invalid("token", "User no longer exists"));
        };

        let password_hash = self.hash(new_password)?;
        self.users.update_password(user_id, &password_hash).await?;
        self.reset_tokens.remove(user_id).await?;

        user.password_hash = password_hash;
        tracing::info!(%user_id, "Password reset");
        Ok(user)
    }

    fn hash(&self, secret: &str) -> Result<String, DomainError> {
        self.passwords
            .hash(secret)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    fn verify(&self, secret: &str, hash: &str) -> Result<bool, DomainError> {
        self.passwords
            .verify(secret, hash)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }
}

impl From<ResetTokenError> for DomainError {
    fn from(err: ResetTokenError) -> Self {
        match err {
            ResetTokenError::Connection(msg) => DomainError::Transient(msg),
            ResetTokenError::Operation(msg) => DomainError::Internal(msg),
        }
    }
}
