//! Category deletion endpoint.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    auth::UserID,
    category::{create::CategoryState, db::delete_category, parse_category_id},
    db::lock_connection,
};

/// Delete one of the logged in user's categories.
///
/// Transactions in the category are kept and lose their category.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(raw_category_id): Path<String>,
) -> Result<StatusCode, Error> {
    let category_id = parse_category_id(&raw_category_id)?;
    let connection = lock_connection(&state.db_connection)?;

    delete_category(category_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
