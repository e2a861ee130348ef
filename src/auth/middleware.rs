//! Authentication middleware that validates the auth cookie of API requests.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{cookie::get_token_from_cookies, get_user_by_id},
    db::lock_connection,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection, used to check the user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid authorization cookie.
///
/// The user ID is placed into the request extensions and the request is run
/// if the cookie is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}");
            return Error::Unauthenticated.into_response();
        }
    };

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(error) => {
            tracing::debug!("Rejecting request to {}: {error}", parts.uri.path());
            return error.into_response();
        }
    };

    let user_exists = match lock_connection(&state.db_connection) {
        Ok(connection) => match get_user_by_id(token.user_id, &connection) {
            Ok(_) => true,
            Err(Error::NotFound) => false,
            Err(error) => return error.into_response(),
        },
        Err(error) => return error.into_response(),
    };

    if !user_exists {
        tracing::debug!("Rejecting token for deleted user {}", token.user_id);
        return Error::Unauthenticated.into_response();
    }

    parts.extensions.insert(token.user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

#[cfg(test)]
mod auth_guard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Router,
        extract::State,
        http::StatusCode,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::PrivateCookieJar;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::Duration;

    use crate::{
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, UserID, cookie::set_auth_cookie},
        db::initialize,
        test_utils::insert_test_user,
    };

    use super::{AuthState, auth_guard};

    const TEST_LOG_IN_ROUTE_PATH: &str = "/log_in";
    const TEST_PROTECTED_ROUTE: &str = "/protected";

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    async fn stub_log_in_route(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> (StatusCode, PrivateCookieJar) {
        let user_id = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_user(&connection, "test@test.com").id
        };

        (
            StatusCode::OK,
            set_auth_cookie(jar, user_id, Duration::minutes(5)).unwrap(),
        )
    }

    fn get_test_server() -> (TestServer, AuthState) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let state = AuthState {
            cookie_key: create_cookie_key("foobar"),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_LOG_IN_ROUTE_PATH, post(stub_log_in_route))
            .with_state(state.clone());

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state,
        )
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_cookie() {
        let (server, _) = get_test_server();

        let response = server.post(TEST_LOG_IN_ROUTE_PATH).await;
        response.assert_status_ok();
        let auth_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(auth_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("1");
    }

    #[tokio::test]
    async fn get_protected_route_with_no_cookie() {
        let (server, _) = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_unauthorized();
        assert_eq!(
            response.json::<Value>(),
            json!({ "error": "Authentication credentials were not provided." })
        );
    }

    #[tokio::test]
    async fn get_protected_route_with_tampered_cookie() {
        let (server, _) = get_test_server();
        let response = server.post(TEST_LOG_IN_ROUTE_PATH).await;
        let mut auth_cookie = response.cookie(COOKIE_TOKEN);
        auth_cookie.set_value(r#"{"user_id":1,"expires_at":"2999-01-01T00:00:00Z"}"#);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(auth_cookie)
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn get_protected_route_after_user_deleted() {
        let (server, state) = get_test_server();
        let response = server.post(TEST_LOG_IN_ROUTE_PATH).await;
        let auth_cookie = response.cookie(COOKIE_TOKEN);
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DELETE FROM user", [])
            .unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(auth_cookie)
            .await;

        response.assert_status_unauthorized();
    }
}
