//! Database queries for the filtered, paginated transaction list.

use rusqlite::{Connection, params_from_iter, types::Value};

use crate::{
    Error,
    auth::UserID,
    pagination::PageRequest,
    transaction::{Transaction, filter::TransactionFilter, map_transaction_row},
};

/// The columns read by [map_transaction_row], qualified for the joined query.
const JOINED_TRANSACTION_COLUMNS: &str = "t.id, t.amount, t.description, t.date, \
    t.payment_method, t.transaction_type, t.user_id, t.category_id, t.created_at, t.updated_at";

const FROM_CLAUSE: &str = "FROM \"transaction\" t LEFT JOIN category c ON c.id = t.category_id";

fn where_clause(filter: &TransactionFilter) -> String {
    match filter.where_clause() {
        Some(conditions) => format!("WHERE t.user_id = ?1 AND {conditions}"),
        None => "WHERE t.user_id = ?1".to_owned(),
    }
}

fn query_parameters(user_id: UserID, filter: &TransactionFilter) -> Vec<Value> {
    let mut parameters = Vec::with_capacity(filter.parameters().len() + 3);
    parameters.push(Value::Integer(user_id.as_i64()));
    parameters.extend_from_slice(filter.parameters());
    parameters
}

/// Count the transactions owned by `user_id` that match `filter`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn count_filtered_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let query = format!("SELECT COUNT(t.id) {FROM_CLAUSE} {}", where_clause(filter));
    let parameters = query_parameters(user_id, filter);

    connection
        .query_row(&query, params_from_iter(parameters.iter()), |row| row.get(0))
        .map_err(Error::SqlError)
}

/// Get one page of the transactions owned by `user_id` that match `filter`.
///
/// Transactions are sorted by date, newest first. Transactions on the same
/// date are sorted by when they were created, newest first, and then by ID.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_filtered_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    page: PageRequest,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut parameters = query_parameters(user_id, filter);
    let limit_placeholder = parameters.len() + 1;
    let offset_placeholder = parameters.len() + 2;
    parameters.push(Value::Integer(page.page_size.try_into().unwrap_or(i64::MAX)));
    parameters.push(Value::Integer(page.offset().try_into().unwrap_or(i64::MAX)));

    let query = format!(
        "SELECT {JOINED_TRANSACTION_COLUMNS} {FROM_CLAUSE} {} \
         ORDER BY t.date DESC, t.created_at DESC, t.id ASC \
         LIMIT ?{limit_placeholder} OFFSET ?{offset_placeholder}",
        where_clause(filter)
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(parameters.iter()), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}
