//! Defines the app level error type and its conversion to JSON error responses.

use std::{collections::BTreeMap, fmt::Display};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::category::CategoryId;

/// Validation messages keyed by the name of the field they apply to.
///
/// Serialises as a plain JSON object, e.g. `{"amount": ["This field is required."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty set of field errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create field errors holding a single `message` for `field`.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record `message` against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// The messages recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Whether no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return `Ok(())` if no errors were recorded, otherwise [Error::Validation].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }

        Ok(())
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request did not carry a valid auth cookie.
    #[error("the request is not authenticated")]
    Unauthenticated,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// One or more fields in a request body failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The request body could not be parsed as JSON.
    #[error("invalid request body: {0}")]
    InvalidJson(String),

    /// A query parameter used to filter transactions was not recognised or
    /// its value could not be parsed.
    #[error("{0}")]
    InvalidFilter(String),

    /// The `year` query parameter was not an integer in [1000, 9999].
    #[error("Invalid year parameter")]
    InvalidYear,

    /// The `month` query parameter was not an integer in [1, 12].
    #[error("Invalid month parameter")]
    InvalidMonth,

    /// The requested page is past the last page or is not a positive integer.
    #[error("Invalid page.")]
    InvalidPage,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The transaction does not exist or belongs to another user.
    #[error("Transaction not found or you do not have permission")]
    TransactionNotFound,

    /// The category does not exist or belongs to another user.
    #[error("Category not found or you do not have permission")]
    CategoryNotFound,

    /// The category ID given for a transaction does not refer to one of the
    /// user's categories.
    #[error("the category {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The user already has a category with the same name.
    #[error("a category with that name already exists")]
    DuplicateCategoryName,

    /// The email address is already registered to another user.
    #[error("a user with that email already exists")]
    DuplicateEmail,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("category.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::Unauthenticated | Error::CookieMissing => {
                StatusCode::UNAUTHORIZED
            }
            Error::TooWeak(_)
            | Error::Validation(_)
            | Error::InvalidJson(_)
            | Error::InvalidFilter(_)
            | Error::InvalidYear
            | Error::InvalidMonth
            | Error::InvalidCategory(_)
            | Error::EmptyCategoryName
            | Error::DuplicateCategoryName
            | Error::DuplicateEmail => StatusCode::BAD_REQUEST,
            Error::InvalidPage
            | Error::NotFound
            | Error::TransactionNotFound
            | Error::CategoryNotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Error::Validation(errors) => (status, Json(errors)).into_response(),
            Error::TooWeak(feedback) => {
                (status, Json(FieldErrors::single("password", feedback))).into_response()
            }
            Error::InvalidCategory(category_id) => (
                status,
                Json(FieldErrors::single(
                    "category",
                    format!("Invalid pk \"{category_id}\" - object does not exist."),
                )),
            )
                .into_response(),
            Error::EmptyCategoryName => (
                status,
                Json(FieldErrors::single("name", "This field may not be blank.")),
            )
                .into_response(),
            Error::DuplicateCategoryName => (
                status,
                Json(FieldErrors::single(
                    "name",
                    "A category with that name already exists.",
                )),
            )
                .into_response(),
            Error::DuplicateEmail => (
                status,
                Json(FieldErrors::single(
                    "email",
                    "A user with that email already exists.",
                )),
            )
                .into_response(),
            Error::InvalidCredentials => error_response(status, "Invalid email or password."),
            Error::Unauthenticated | Error::CookieMissing => {
                error_response(status, "Authentication credentials were not provided.")
            }
            Error::NotFound => error_response(status, "Not found."),
            Error::InvalidTimezoneError(timezone) => {
                tracing::error!("Could not get local timezone \"{timezone}\"");
                error_response(
                    status,
                    &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                )
            }
            // Server errors are not intended to be shown to the client.
            error if status.is_server_error() => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_response(
                    status,
                    "An unexpected error occurred, check the server logs for more details.",
                )
            }
            error => error_response(status, &error.to_string()),
        }
    }
}
