#![allow(missing_docs)]

use std::str::FromStr;

use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use email_address::EmailAddress;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, PaginationConfig,
    auth::{COOKIE_TOKEN, PasswordHash, User, ValidatedPassword, create_user},
    build_router,
    category::Category,
    endpoints,
    transaction::Transaction,
};

pub(crate) const TEST_PASSWORD: &str = "purple monkey dishwasher lantern 42";

/// bcrypt's minimum cost, which keeps hashing in tests fast.
const TEST_HASH_COST: u32 = 4;

pub(crate) struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    let mut state = AppState::new(connection, "foobar", "Etc/UTC", PaginationConfig::default())
        .expect("Could not create app state");
    state.password_hash_cost = TEST_HASH_COST;

    state
}

pub(crate) fn get_test_app() -> TestApp {
    let state = get_test_state();
    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server");

    TestApp { server, state }
}

#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> User {
    let password_hash =
        PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), TEST_HASH_COST)
            .expect("Could not hash test password");

    create_user(
        EmailAddress::from_str(email).expect("Invalid test email"),
        password_hash,
        connection,
    )
    .expect("Could not create test user")
}

/// Store a user with `email` and log them in, returning the auth cookie.
pub(crate) async fn log_in_test_user(app: &TestApp, email: &str) -> (User, Cookie<'static>) {
    let user = {
        let connection = app.state.db_connection.lock().unwrap();
        insert_test_user(&connection, email)
    };

    let response = app
        .server
        .post(endpoints::LOG_IN)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    (user, response.cookie(COOKIE_TOKEN))
}

pub(crate) async fn post_test_category(
    app: &TestApp,
    auth_cookie: &Cookie<'static>,
    name: &str,
) -> Category {
    let response = app
        .server
        .post(endpoints::CATEGORIES)
        .add_cookie(auth_cookie.clone())
        .json(&json!({ "name": name }))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json()
}

pub(crate) async fn post_test_transaction(
    app: &TestApp,
    auth_cookie: &Cookie<'static>,
    body: Value,
) -> Transaction {
    let response = app
        .server
        .post(endpoints::TRANSACTIONS)
        .add_cookie(auth_cookie.clone())
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json()
}
