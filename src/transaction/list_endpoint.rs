//! Defines the endpoint for listing a user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    endpoints,
    pagination::{Page, PageRequest, PaginationConfig},
    transaction::{
        Transaction,
        filter::TransactionFilter,
        query::{count_filtered_transactions, get_filtered_transactions},
    },
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Controls the size of each page of transactions.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config,
        }
    }
}

/// A route handler that returns one page of the logged in user's transactions.
///
/// Query parameters other than `page` and `page_size` filter the transactions,
/// e.g. `?date__year=2025&category__name__icontains=food`.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Page<Transaction>>, Error> {
    let page_request = PageRequest::from_query(&params, &state.pagination_config)?;
    let filter = TransactionFilter::parse(&params)?;

    let connection = lock_connection(&state.db_connection)?;

    let count = count_filtered_transactions(user_id, &filter, &connection)?;
    page_request.validate(count)?;
    let transactions = get_filtered_transactions(user_id, &filter, page_request, &connection)?;

    Ok(Json(Page::new(
        transactions,
        count,
        page_request,
        endpoints::TRANSACTIONS,
        &params,
    )))
}
