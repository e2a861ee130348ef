//! User accounts and cookie based authentication.

mod cookie;
mod delete_account;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use delete_account::delete_account_endpoint;
pub use log_in::{LogInData, REMEMBER_ME_COOKIE_DURATION, post_log_in};
pub use log_out::post_log_out;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::{RegisterData, register_user};
pub(crate) use token::Token;
pub use user::{
    User, UserID, UserProfile, create_user, create_user_table, get_user_by_email, get_user_by_id,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
#[cfg(test)]
pub(crate) use user::count_users;
