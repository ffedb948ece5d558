use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use forum_core::DomainError;
use forum_core::ports::{MailError, Mailer, OutgoingMail};
use forum_core::services::{AccountService, ResetPolicy};
use forum_infra::{Argon2PasswordService, InMemoryResetTokenStore, InMemoryStore};

/// Keeps every mail instead of sending it.
#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl Outbox {
    fn reset_link_params(&self) -> (String, Uuid) {
        let sent = self.sent.lock().unwrap();
        let html = &sent.last().expect("no mail sent").html;
        let query = html.split('?').nth(1).unwrap().split('"').next().unwrap();

        let mut token = None;
        let mut user_id = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("token", v)) => token = Some(v.to_string()),
                Some(("userId", v)) => user_id = Some(v.parse().unwrap()),
                _ => {}
            }
        }
        (token.unwrap(), user_id.unwrap())
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

struct BrokenMailer;

#[async_trait]
impl Mailer for BrokenMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), MailError> {
        Err(MailError::SendError("smtp down".to_string()))
    }
}

fn accounts_with(mailer: Arc<dyn Mailer>) -> AccountService {
    AccountService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(Argon2PasswordService::new()),
        Arc::new(InMemoryResetTokenStore::new()),
        mailer,
        ResetPolicy {
            link_base_url: "http://localhost:3000/change-password".to_string(),
            token_ttl: Duration::from_secs(60),
        },
    )
}

fn field_of(err: DomainError) -> String {
    match err {
        DomainError::Validation(errors) => errors[0].field.clone(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_register_then_login_either_way() {
    let accounts = accounts_with(Arc::new(Outbox::default()));

    let user = accounts
        .register("alice_w", "alice@example.com", "hunter22")
        .await
        .unwrap();
    assert_ne!(user.password_hash, "hunter22");

    let by_name = accounts.login("alice_w", "hunter22").await.unwrap();
    let by_email = accounts.login("alice@example.com", "hunter22").await.unwrap();
    assert_eq!(by_name.id, user.id);
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn test_login_failures_name_the_field() {
    let accounts = accounts_with(Arc::new(Outbox::default()));
    accounts
        .register("alice_w", "alice@example.com", "hunter22")
        .await
        .unwrap();

    let err = accounts.login("nobody", "hunter22").await.unwrap_err();
    assert_eq!(field_of(err), "usernameOrEmail");

    let err = accounts.login("alice_w", "wrong-password").await.unwrap_err();
    assert_eq!(field_of(err), "password");
}

#[tokio::test]
async fn test_duplicate_registration() {
    let accounts = accounts_with(Arc::new(Outbox::default()));
    accounts
        .register("alice_w", "alice@example.com", "hunter22")
        .await
        .unwrap();

    let err = accounts
        .register("alice_w", "other@example.com", "hunter22")
        .await
        .unwrap_err();
    match err {
        DomainError::Duplicate { errors, .. } => assert_eq!(errors[0].field, "username"),
        other => panic!("unexpected error: {other:?}"),
    }

    let err = accounts
        .register("bob_the_builder", "alice@example.com", "hunter22")
        .await
        .unwrap_err();
    match err {
        DomainError::Duplicate { errors, .. } => assert_eq!(errors[0].field, "email"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_me_without_session() {
    let accounts = accounts_with(Arc::new(Outbox::default()));

    assert!(accounts.me(None).await.unwrap().is_none());
    assert!(accounts.me(Some(Uuid::new_v4())).await.unwrap().is_none());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let outbox = Arc::new(Outbox::default());
    let accounts = accounts_with(outbox.clone());
    let user = accounts
        .register("alice_w", "alice@example.com", "hunter22")
        .await
        .unwrap();

    accounts.forgot_password("alice@example.com").await.unwrap();
    let (token, user_id) = outbox.reset_link_params();
    assert_eq!(user_id, user.id);

    let err = accounts
        .change_password(user_id, &token, "short")
        .await
        .unwrap_err();
    assert_eq!(field_of(err), "newPassword");

    let err = accounts
        .change_password(user_id, "forged-token", "brand-new-pass")
        .await
        .unwrap_err();
    assert_eq!(field_of(err), "token");

    accounts
        .change_password(user_id, &token, "brand-new-pass")
        .await
        .unwrap();
    accounts.login("alice_w", "brand-new-pass").await.unwrap();

    // Tokens are single use.
    let err = accounts
        .change_password(user_id, &token, "another-pass")
        .await
        .unwrap_err();
    assert_eq!(field_of(err), "token");
}

#[tokio::test]
async fn test_forgot_password_never_reveals_accounts() {
    let outbox = Arc::new(Outbox::default());
    let accounts = accounts_with(outbox.clone());

    accounts.forgot_password("ghost@example.com").await.unwrap();
    assert!(outbox.sent.lock().unwrap().is_empty());

    let accounts = accounts_with(Arc::new(BrokenMailer));
    accounts
        .register("alice_w", "alice@example.com", "hunter22")
        .await
        .unwrap();
    accounts.forgot_password("alice@example.com").await.unwrap();
}
