//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    auth::UserID,
    db::lock_connection,
    transaction::{delete_transaction, get_endpoint::TransactionState, parse_transaction_id},
};

/// A route handler for deleting one of the logged in user's transactions.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(raw_transaction_id): Path<String>,
) -> Result<StatusCode, Error> {
    let transaction_id = parse_transaction_id(&raw_transaction_id)?;
    let connection = lock_connection(&state.db_connection)?;

    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
