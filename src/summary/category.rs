//! The summary of a user's transactions in one category.

use std::ops::RangeInclusive;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, get_category, parse_category_id},
    db::lock_connection,
    summary::{
        monthly::SummaryState,
        period::{PeriodQuery, date_range, parse_month, parse_year},
    },
    timezone::local_today,
    transaction::{Amount, TransactionId, TransactionType},
};

/// The total and number of transactions of one type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeTotal {
    /// The sum of the transaction amounts.
    pub total_amount: Amount,
    /// The number of transactions.
    pub count: u64,
}

/// Category totals split by transaction type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    /// Expenses.
    pub debit: TypeTotal,
    /// Income.
    pub credit: TypeTotal,
}

/// The fields of a transaction shown in a category summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TransactionDetail {
    pub id: TransactionId,
    pub amount: Amount,
    pub date: Date,
    pub description: String,
    pub transaction_type: TransactionType,
}

/// A user's transactions in one category over a year or a single month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// The summarised category.
    pub category_id: CategoryId,
    /// The summarised year.
    pub year: i32,
    /// The summarised month, or `None` for the whole year.
    pub month: Option<u8>,
    /// The number of transactions in the period.
    pub total_transactions: u64,
    /// The sum of all transaction amounts, regardless of type.
    pub total_amount: Amount,
    /// Totals for debit and credit transactions.
    pub transactions_by_type: TypeBreakdown,
    /// The transactions in the period, newest first.
    pub transactions_details: Vec<TransactionDetail>,
}

/// A route handler that summarises the logged in user's transactions in a category.
///
/// The `year` query parameter defaults to the current year. Without a
/// `month`, the whole year is summarised.
pub async fn get_category_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Path(raw_category_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<CategorySummary>, Error> {
    let today = local_today(&state.local_timezone)?;
    let year = parse_year(query.year.as_deref(), today.year())?;
    let month = parse_month(query.month.as_deref())?;
    let category_id = parse_category_id(&raw_category_id)?;

    let connection = lock_connection(&state.db_connection)?;
    get_category(category_id, user_id, &connection)?;

    get_category_summary(category_id, user_id, year, month, &connection).map(Json)
}

/// Summarise the transactions owned by `user_id` in the category `category_id`.
///
/// The caller should check that the category belongs to the user.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidYear] if the year is outside the supported date range,
/// - or [Error::SqlError] if there is an SQL error.
pub fn get_category_summary(
    category_id: CategoryId,
    user_id: UserID,
    year: i32,
    month: Option<Month>,
    connection: &Connection,
) -> Result<CategorySummary, Error> {
    let dates = date_range(year, month)?;
    let transactions_details = get_transaction_details(category_id, user_id, &dates, connection)?;

    let mut transactions_by_type = TypeBreakdown::default();
    for detail in &transactions_details {
        let type_total = match detail.transaction_type {
            TransactionType::Debit => &mut transactions_by_type.debit,
            TransactionType::Credit => &mut transactions_by_type.credit,
        };
        type_total.total_amount = type_total.total_amount + detail.amount;
        type_total.count += 1;
    }

    Ok(CategorySummary {
        category_id,
        year,
        month: month.map(|month| month as u8),
        total_transactions: transactions_details.len() as u64,
        total_amount: transactions_details.iter().map(|detail| detail.amount).sum(),
        transactions_by_type,
        transactions_details,
    })
}

fn get_transaction_details(
    category_id: CategoryId,
    user_id: UserID,
    dates: &RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<TransactionDetail>, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, description, transaction_type
             FROM \"transaction\"
             WHERE user_id = ?1 AND category_id = ?2 AND date BETWEEN ?3 AND ?4
             ORDER BY date DESC, created_at DESC, id ASC",
        )?
        .query_map(
            (user_id.as_i64(), category_id, dates.start(), dates.end()),
            |row| {
                Ok(TransactionDetail {
                    id: row.get(0)?,
                    amount: row.get(1)?,
                    date: row.get(2)?,
                    description: row.get(3)?,
                    transaction_type: row.get(4)?,
                })
            },
        )?
        .map(|row_result| row_result.map_err(Error::SqlError))
        .collect()
}
