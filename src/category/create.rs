//! Category creation endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, FieldErrors,
    auth::UserID,
    category::{Category, CategoryName, create_category},
    db::lock_connection,
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating a category.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryData {
    /// The name of the new category.
    pub name: Option<String>,
}

/// Create a category for the logged in user.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    data: Result<Json<CategoryData>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let Json(data) = data.map_err(|rejection| Error::InvalidJson(rejection.body_text()))?;

    let name = match data.name {
        Some(name) => CategoryName::new(&name)?,
        None => {
            return Err(Error::Validation(FieldErrors::single(
                "name",
                "This field is required.",
            )));
        }
    };

    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(name, user_id, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}
