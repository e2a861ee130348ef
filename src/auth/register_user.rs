//! The route handler for creating a new user account.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, FieldErrors,
    auth::{PasswordHash, UserProfile, ValidatedPassword, create_user},
    db::lock_connection,
};

/// The state needed to register a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost for hashing the new user's password.
    pub password_hash_cost: u32,
    /// The database connection for storing the user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data sent to create a new account.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterData {
    /// The email the user will log in with.
    #[serde(default)]
    pub email: String,
    /// The password the user will log in with.
    #[serde(default)]
    pub password: String,
}

/// Create a new user from an email and password.
///
/// # Errors
///
/// Returns field errors if the email is invalid or already registered, or
/// the password is too weak.
pub async fn register_user(
    State(state): State<RegistrationState>,
    user_data: Result<Json<RegisterData>, JsonRejection>,
) -> Result<(StatusCode, Json<UserProfile>), Error> {
    let Json(user_data) = user_data.map_err(|rejection| Error::InvalidJson(rejection.body_text()))?;

    let mut errors = FieldErrors::new();

    let email = if user_data.email.trim().is_empty() {
        errors.add("email", "This field is required.");
        None
    } else {
        match EmailAddress::from_str(user_data.email.trim()) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.add("email", "Enter a valid email address.");
                None
            }
        }
    };

    let password = if user_data.password.is_empty() {
        errors.add("password", "This field is required.");
        None
    } else {
        match ValidatedPassword::new(&user_data.password) {
            Ok(password) => Some(password),
            Err(Error::TooWeak(feedback)) => {
                errors.add("password", feedback);
                None
            }
            Err(error) => return Err(error),
        }
    };

    let (Some(email), Some(password)) = (email, password) else {
        return Err(Error::Validation(errors));
    };

    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(email, password_hash, &connection)?;

    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}
