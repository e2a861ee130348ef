//! Defines the endpoint for retrieving a single transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    transaction::{Transaction, get_transaction, parse_transaction_id},
};

/// The state needed to get, edit or delete a single transaction.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns one of the logged in user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(raw_transaction_id): Path<String>,
) -> Result<Json<Transaction>, Error> {
    let transaction_id = parse_transaction_id(&raw_transaction_id)?;
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}

#[cfg(test)]
mod get_transaction_endpoint_tests {
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_app, log_in_test_user, post_test_transaction},
        transaction::Transaction,
    };

    fn lunch() -> Value {
        json!({
            "amount": "12.50",
            "description": "Lunch",
            "payment_method": "cash",
            "transaction_type": "debit",
        })
    }

    #[tokio::test]
    async fn get_transaction_succeeds() {
        let app = get_test_app();
        let (_, auth_cookie) = log_in_test_user(&app, "foo@bar.baz").await;
        let want = post_test_transaction(&app, &auth_cookie, lunch()).await;

        let response = app
            .server
            .get(&format_endpoint(endpoints::TRANSACTION, want.id))
            .add_cookie(auth_cookie)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Transaction>(), want);
    }

    #[tokio::test]
    async fn get_other_users_transaction_is_not_found() {
        let app = get_test_app();
        let (_, auth_cookie) = log_in_test_user(&app, "foo@bar.baz").await;
        let (_, other_cookie) = log_in_test_user(&app, "other@bar.baz").await;
        let transaction = post_test_transaction(&app, &auth_cookie, lunch()).await;

        let response = app
            .server
            .get(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .add_cookie(other_cookie)
            .await;

        response.assert_status_not_found();
        assert_eq!(
            response.json::<Value>(),
            json!({ "error": "Transaction not found or you do not have permission" })
        );
    }

    #[tokio::test]
    async fn get_unknown_or_malformed_id_is_not_found() {
        let app = get_test_app();
        let (_, auth_cookie) = log_in_test_user(&app, "foo@bar.baz").await;

        for id in [Uuid::new_v4().to_string(), "42".to_owned()] {
            let response = app
                .server
                .get(&format_endpoint(endpoints::TRANSACTION, &id))
                .add_cookie(auth_cookie.clone())
                .await;

            response.assert_status_not_found();
        }
    }
}
