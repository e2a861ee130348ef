//! The route handler for a user deleting their own account.

use axum::{Extension, extract::State, http::StatusCode};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Error,
    auth::{UserID, cookie::invalidate_auth_cookie, middleware::AuthState, user::delete_user},
    db::lock_connection,
};

/// Delete the logged in user along with all of their categories and transactions.
///
/// The auth cookie is invalidated on success.
pub async fn delete_account_endpoint(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Result<(StatusCode, PrivateCookieJar), Error> {
    {
        let connection = lock_connection(&state.db_connection)?;
        delete_user(user_id, &connection)?;
    }

    tracing::info!("Deleted user {user_id}");

    Ok((StatusCode::NO_CONTENT, invalidate_auth_cookie(jar)))
}

#[cfg(test)]
mod delete_account_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        auth::count_users,
        endpoints,
        test_utils::{get_test_app, log_in_test_user},
    };

    #[tokio::test]
    async fn delete_account_removes_user_and_data() {
        let app = get_test_app();
        let (_, auth_cookie) = log_in_test_user(&app, "foo@bar.baz").await;
        app.server
            .post(endpoints::CATEGORIES)
            .add_cookie(auth_cookie.clone())
            .json(&json!({ "name": "Groceries" }))
            .await
            .assert_status(StatusCode::CREATED);
        app.server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(auth_cookie.clone())
            .json(&json!({
                "amount": "12.50",
                "payment_method": "cash",
                "transaction_type": "debit",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .server
            .delete(endpoints::CURRENT_USER)
            .add_cookie(auth_cookie.clone())
            .await;

        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
        let connection = app.state.db_connection.lock().unwrap();
        assert_eq!(count_users(&connection), Ok(0));
        let remaining: i64 = connection
            .query_row(
                "SELECT (SELECT COUNT(*) FROM category) + (SELECT COUNT(*) FROM \"transaction\")",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn deleted_account_cookie_is_rejected() {
        let app = get_test_app();
        let (_, auth_cookie) = log_in_test_user(&app, "foo@bar.baz").await;
        app.server
            .delete(endpoints::CURRENT_USER)
            .add_cookie(auth_cookie.clone())
            .await;

        let response = app
            .server
            .get(endpoints::TRANSACTIONS)
            .add_cookie(auth_cookie)
            .await;

        response.assert_status_unauthorized();
    }
}
