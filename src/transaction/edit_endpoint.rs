//! Defines the endpoint for partially updating a transaction.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    Error,
    auth::UserID,
    db::lock_connection,
    transaction::{
        Transaction, get_endpoint::TransactionState, get_transaction, parse_transaction_id,
        payload::TransactionPayload, update_transaction,
    },
};

/// A route handler that changes the fields present in the body of one of
/// the logged in user's transactions.
///
/// `"category": null` removes the category, and a `user` key is ignored.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(raw_transaction_id): Path<String>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let transaction_id = parse_transaction_id(&raw_transaction_id)?;
    let Json(payload) = payload.map_err(|rejection| Error::InvalidJson(rejection.body_text()))?;

    let connection = lock_connection(&state.db_connection)?;
    // Report a missing transaction before any problems with the body.
    let changes = match payload.into_changes(user_id, &connection) {
        Ok(changes) => changes,
        Err(error) => {
            get_transaction(transaction_id, user_id, &connection)?;
            return Err(error);
        }
    };

    update_transaction(transaction_id, user_id, changes, &connection).map(Json)
}
