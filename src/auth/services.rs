use tracing::{info, warn};

use crate::auth::{
    dto::{LoginRequest, RegisterRequest},
    error::AuthError,
    jwt::JwtKeys,
    password::{hash_password_async, verify_password_async},
    repo::UserStore,
    repo_types::{InsertOutcome, NewUser},
};

/// Hashes the password and stores a new `user`-role record, failing with
/// `Conflict` when the email is taken.
pub async fn register_user(store: &dyn UserStore, req: RegisterRequest) -> Result<(), AuthError> {
    let RegisterRequest {
        username,
        email,
        password,
    } = req;

    // cheap rejection before paying for bcrypt; the upsert below still
    // guards concurrent registrations
    if store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AuthError::Conflict);
    }

    let password_hash = hash_password_async(password).await?;

    let outcome = store
        .insert_if_absent(NewUser {
            username,
            email: email.clone(),
            password_hash,
        })
        .await?;

    match outcome {
        InsertOutcome::Inserted => {
            info!(email = %email, "user registered");
            Ok(())
        }
        InsertOutcome::AlreadyExists => {
            warn!(email = %email, "email already registered");
            Err(AuthError::Conflict)
        }
    }
}

/// Checks credentials and returns a signed access token.
pub async fn login_user(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<String, AuthError> {
    let LoginRequest { email, password } = req;

    let Some(user) = store.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    match verify_password_async(password, user.password.clone()).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(email = %email, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => {
            // an unreadable stored hash must look like any other failed login
            warn!(email = %email, error = %e, "stored password hash unusable");
            return Err(AuthError::InvalidCredentials);
        }
    }

    let token = keys.sign(&user.email, &user.role)?;
    info!(email = %user.email, "user logged in");
    Ok(token)
}
