//! Defines the route handler for ending a session.

use axum::http::StatusCode;
use axum_extra::extract::PrivateCookieJar;

use crate::auth::cookie::invalidate_auth_cookie;

/// Invalidate the auth cookie.
///
/// Always succeeds, even if the client was not logged in.
pub async fn post_log_out(jar: PrivateCookieJar) -> (StatusCode, PrivateCookieJar) {
    (StatusCode::NO_CONTENT, invalidate_auth_cookie(jar))
}

#[cfg(test)]
mod log_out_tests {
    use axum::http::StatusCode;
    use time::OffsetDateTime;

    use crate::{
        auth::COOKIE_TOKEN,
        endpoints,
        test_utils::{get_test_app, log_in_test_user},
    };

    #[tokio::test]
    async fn log_out_invalidates_auth_cookie() {
        let app = get_test_app();
        let (_, auth_cookie) = log_in_test_user(&app, "foo@bar.baz").await;

        let response = app
            .server
            .post(endpoints::LOG_OUT)
            .add_cookie(auth_cookie)
            .await;

        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
        let cookie = response.cookie(COOKIE_TOKEN);
        assert_eq!(
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH)
        );
    }

    #[tokio::test]
    async fn protected_routes_reject_logged_out_cookie() {
        let app = get_test_app();
        let (_, auth_cookie) = log_in_test_user(&app, "foo@bar.baz").await;

        let response = app
            .server
            .post(endpoints::LOG_OUT)
            .add_cookie(auth_cookie)
            .await;
        let logged_out_cookie = response.cookie(COOKIE_TOKEN);

        let response = app
            .server
            .get(endpoints::TRANSACTIONS)
            .add_cookie(logged_out_cookie)
            .await;

        response.assert_status_unauthorized();
    }
}
