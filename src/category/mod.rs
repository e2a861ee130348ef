//! Categories for grouping a user's transactions.

mod create;
mod db;
mod delete;
mod domain;
mod list;

pub use create::{CategoryData, create_category_endpoint};
pub use db::{create_category, create_category_table, get_categories, get_category};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryName, parse_category_id};
pub use list::list_categories_endpoint;
