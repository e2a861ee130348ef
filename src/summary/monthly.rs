//! The monthly summary of a user's income and expenses.

use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryId,
    db::lock_connection,
    summary::period::{PeriodQuery, date_range, parse_month, parse_year},
    timezone::local_today,
    transaction::{Amount, TransactionType},
};

/// The state needed by the summary endpoints.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The total spent or earned in one category during a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// `None` for transactions without a category.
    pub category_id: Option<CategoryId>,
    /// `None` for transactions without a category.
    pub category_name: Option<String>,
    /// Whether this row totals expenses or income.
    pub transaction_type: TransactionType,
    /// The sum of the transaction amounts.
    pub total_amount: Amount,
    /// The number of transactions.
    pub count: u64,
}

/// A user's income and expenses for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// The summarised year.
    pub year: i32,
    /// The summarised month, 1 for January.
    pub month: u8,
    /// The number of transactions in the month.
    pub total_transactions: u64,
    /// The sum of debit transactions.
    pub total_expense: Amount,
    /// The sum of credit transactions.
    pub total_income: Amount,
    /// Income minus expenses.
    pub net_amount: Amount,
    /// Totals per category and transaction type, largest first.
    pub transactions_by_category: Vec<CategoryBreakdown>,
}

/// A route handler that summarises the logged in user's transactions for a month.
///
/// The `month` and `year` query parameters default to the current month and
/// year in the server's local timezone.
pub async fn get_monthly_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<MonthlySummary>, Error> {
    let today = local_today(&state.local_timezone)?;
    let month = parse_month(query.month.as_deref())?.unwrap_or(today.month());
    let year = parse_year(query.year.as_deref(), today.year())?;

    let connection = lock_connection(&state.db_connection)?;

    get_monthly_summary(user_id, year, month, &connection).map(Json)
}

/// Summarise the transactions owned by `user_id` in `month` of `year`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidYear] if the year is outside the supported date range,
/// - or [Error::SqlError] if there is an SQL error.
pub fn get_monthly_summary(
    user_id: UserID,
    year: i32,
    month: Month,
    connection: &Connection,
) -> Result<MonthlySummary, Error> {
    let dates = date_range(year, Some(month))?;

    let (total_transactions, total_expense, total_income) = connection
        .prepare(
            "SELECT COUNT(id),
                COALESCE(SUM(CASE WHEN transaction_type = 'debit' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'credit' THEN amount END), 0)
             FROM \"transaction\"
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
        )?
        .query_one(
            (user_id.as_i64(), dates.start(), dates.end()),
            |row| Ok((row.get(0)?, row.get::<_, Amount>(1)?, row.get::<_, Amount>(2)?)),
        )?;

    Ok(MonthlySummary {
        year,
        month: month as u8,
        total_transactions,
        total_expense,
        total_income,
        net_amount: total_income - total_expense,
        transactions_by_category: get_category_breakdown(user_id, &dates, connection)?,
    })
}

fn get_category_breakdown(
    user_id: UserID,
    dates: &RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<CategoryBreakdown>, Error> {
    connection
        .prepare(
            "SELECT t.category_id, c.name, t.transaction_type, SUM(t.amount) AS total_amount,
                COUNT(t.id)
             FROM \"transaction\" t
             LEFT JOIN category c ON c.id = t.category_id
             WHERE t.user_id = ?1 AND t.date BETWEEN ?2 AND ?3
             GROUP BY t.category_id, c.name, t.transaction_type
             ORDER BY total_amount DESC, c.name ASC, t.transaction_type ASC",
        )?
        .query_map((user_id.as_i64(), dates.start(), dates.end()), |row| {
            Ok(CategoryBreakdown {
                category_id: row.get(0)?,
                category_name: row.get(1)?,
                transaction_type: row.get(2)?,
                total_amount: row.get(3)?,
                count: row.get(4)?,
            })
        })?
        .map(|row_result| row_result.map_err(Error::SqlError))
        .collect()
}
