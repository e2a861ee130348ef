//! Category listing endpoint.

use axum::{Extension, Json, extract::State};

use crate::{
    Error,
    auth::UserID,
    category::{Category, create::CategoryState, get_categories},
    db::lock_connection,
};

/// List the logged in user's categories in alphabetical order.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_categories(user_id, &connection).map(Json)
}
