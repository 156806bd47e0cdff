//! Account flows - sign-up with a generated password, login, logout and
//! the profile's current week

use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{Backend, BackendError};
use crate::local::{LocalError, LocalStore};
use crate::models::{AuthSession, Profile};
use crate::program::{ProgramError, get_week_progression};

pub const PASSWORD_LENGTH: usize = 16;
const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Local(#[from] LocalError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error("not logged in")]
    NotLoggedIn,
}

/// Credentials handed back once after sign-up; the password is never stored
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: String,
    pub email: String,
    pub password: String,
}

/// Loose `local@domain.tld` check: no whitespace, one `@`, a dot after it
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn validate_signup(full_name: &str, email: &str) -> Result<(), AuthError> {
    if full_name.trim().is_empty() {
        return Err(AuthError::Validation("Please enter your name".to_string()));
    }
    if !is_valid_email(email.trim()) {
        return Err(AuthError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

pub fn generate_password_with<R: Rng>(rng: &mut R) -> String {
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_CHARSET[rng.gen_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

pub fn generate_secure_password() -> String {
    generate_password_with(&mut rand::thread_rng())
}

/// Register with a generated password, then drop the session the backend may
/// have opened so the user logs in explicitly with the shown credentials.
///
/// Any stored session is forgotten as well, since the backend sign-out
/// revokes its token.
pub async fn sign_up(
    backend: &dyn Backend,
    local: &LocalStore,
    full_name: &str,
    email: &str,
) -> Result<Credentials, AuthError> {
    validate_signup(full_name, email)?;
    let email = email.trim();
    let password = generate_secure_password();

    let user = backend.sign_up(email, &password, full_name.trim()).await?;
    if let Err(e) = backend.sign_out().await {
        warn!(error = %e, "Sign-out after sign-up failed");
    }
    local.clear_session()?;
    info!(user_id = %user.id, "Account created");

    Ok(Credentials {
        user_id: user.id,
        email: email.to_string(),
        password,
    })
}

/// Sign in, make sure a profile row exists and remember the session locally
pub async fn login(
    backend: &dyn Backend,
    local: &LocalStore,
    email: &str,
    password: &str,
) -> Result<(AuthSession, Profile), AuthError> {
    let session = backend.sign_in(email.trim(), password).await?;
    let profile = ensure_profile(backend, &session).await?;
    local.save_session(&session)?;
    info!(user_id = %session.user.id, "Logged in");
    Ok((session, profile))
}

pub async fn ensure_profile(
    backend: &dyn Backend,
    session: &AuthSession,
) -> Result<Profile, AuthError> {
    if let Some(profile) = backend.get_profile(&session.user.id).await? {
        return Ok(profile);
    }
    let profile = Profile::new(&session.user.id, None, session.user.email.clone());
    Ok(backend.upsert_profile(&profile).await?)
}

/// Forget the local session even when the backend call fails
pub async fn logout(backend: &dyn Backend, local: &LocalStore) -> Result<(), AuthError> {
    if let Err(e) = backend.sign_out().await {
        warn!(error = %e, "Backend sign-out failed");
    }
    local.clear_session()?;
    info!("Logged out");
    Ok(())
}

pub fn current_session(local: &LocalStore) -> Result<Option<AuthSession>, AuthError> {
    Ok(local.load_session()?)
}

pub fn require_session(local: &LocalStore) -> Result<AuthSession, AuthError> {
    current_session(local)?.ok_or(AuthError::NotLoggedIn)
}

pub async fn set_current_week(
    backend: &dyn Backend,
    user_id: &str,
    week: u32,
) -> Result<(), AuthError> {
    get_week_progression(week)?;
    backend.update_current_week(user_id, week).await?;
    info!(user_id, week, "Current week updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SqliteBackend;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("a.b+c@mail.co.uk"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@.com"));
        assert!(!is_valid_email("jane@example."));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn test_validate_signup_messages() {
        assert!(validate_signup("Jane", "jane@example.com").is_ok());
        match validate_signup("  ", "jane@example.com") {
            Err(AuthError::Validation(msg)) => assert_eq!(msg, "Please enter your name"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(validate_signup("Jane", "nope").is_err());
    }

    #[test]
    fn test_generated_password_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let pw = generate_password_with(&mut rng);
        assert_eq!(pw.chars().count(), PASSWORD_LENGTH);
        assert!(pw.bytes().all(|b| PASSWORD_CHARSET.contains(&b)));
        assert_ne!(generate_secure_password(), generate_secure_password());
    }

    #[tokio::test]
    async fn test_sign_up_then_login_creates_profile() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let local = LocalStore::open_in_memory().unwrap();

        let creds = sign_up(&backend, &local, "Jane Doe", " jane@example.com ")
            .await
            .unwrap();
        assert_eq!(creds.email, "jane@example.com");
        assert!(current_session(&local).unwrap().is_none());

        let (session, profile) = login(&backend, &local, &creds.email, &creds.password)
            .await
            .unwrap();
        assert_eq!(session.user.id, creds.user_id);
        assert_eq!(profile.current_week, 1);
        assert_eq!(require_session(&local).unwrap(), session);

        set_current_week(&backend, &session.user.id, 4).await.unwrap();
        assert!(matches!(
            set_current_week(&backend, &session.user.id, 9).await,
            Err(AuthError::Program(ProgramError::UnknownWeek(9)))
        ));
        let profile = backend.get_profile(&session.user.id).await.unwrap().unwrap();
        assert_eq!(profile.current_week, 4);

        logout(&backend, &local).await.unwrap();
        assert!(matches!(require_session(&local), Err(AuthError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_sign_up_forgets_stored_session() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let local = LocalStore::open_in_memory().unwrap();

        let first = sign_up(&backend, &local, "Jane Doe", "jane@example.com")
            .await
            .unwrap();
        login(&backend, &local, &first.email, &first.password)
            .await
            .unwrap();
        assert!(current_session(&local).unwrap().is_some());

        sign_up(&backend, &local, "John Roe", "john@example.com")
            .await
            .unwrap();
        assert!(current_session(&local).unwrap().is_none());
    }
}
