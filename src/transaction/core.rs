//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, auth::UserID, category::CategoryId, transaction::Amount};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a transaction.
pub type TransactionId = Uuid;

/// Parse a transaction ID from a URL path segment.
///
/// # Errors
///
/// Returns [Error::TransactionNotFound] if `raw_id` is not a UUID, since no
/// transaction could have that ID.
pub fn parse_transaction_id(raw_id: &str) -> Result<TransactionId, Error> {
    Uuid::parse_str(raw_id).map_err(|_| Error::TransactionNotFound)
}

/// How the money changed hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card, bank transfer or any other non-cash payment.
    Online,
    /// Physical money.
    Cash,
}

impl PaymentMethod {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(PaymentMethod::Online),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(format!("\"{other}\" is not a valid choice.")),
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// Whether money was spent or earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money spent, an expense.
    Debit,
    /// Money earned, income.
    Credit,
}

impl TransactionType {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "debit",
            TransactionType::Credit => "credit",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(TransactionType::Debit),
            "credit" => Ok(TransactionType::Credit),
            other => Err(format!("\"{other}\" is not a valid choice.")),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction.
    pub amount: Amount,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// How the money changed hands.
    pub payment_method: PaymentMethod,
    /// Whether money was spent or earned.
    pub transaction_type: TransactionType,
    /// The user that owns the transaction.
    pub user: UserID,
    /// The ID of the category the transaction belongs to.
    pub category: Option<CategoryId>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: Amount,
        date: Date,
        payment_method: PaymentMethod,
        transaction_type: TransactionType,
        user: UserID,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            description: String::new(),
            date,
            payment_method,
            transaction_type,
            user,
            category: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The optional fields default to an empty description and no category.
#[derive(Debug, PartialEq, Clone)]
#[allow(missing_docs)]
pub struct TransactionBuilder {
    pub amount: Amount,
    pub description: String,
    pub date: Date,
    pub payment_method: PaymentMethod,
    pub transaction_type: TransactionType,
    pub user: UserID,
    pub category: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category: Option<CategoryId>) -> Self {
        self.category = category;
        self
    }
}

/// The fields to change in a partial update. `None` leaves a field as is.
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct TransactionChanges {
    pub amount: Option<Amount>,
    pub description: Option<String>,
    pub date: Option<Date>,
    pub payment_method: Option<PaymentMethod>,
    pub transaction_type: Option<TransactionType>,
    /// `Some(None)` removes the category.
    pub category: Option<Option<CategoryId>>,
}

impl TransactionChanges {
    fn apply(self, transaction: &mut Transaction) {
        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }
        if let Some(description) = self.description {
            transaction.description = description;
        }
        if let Some(date) = self.date {
            transaction.date = date;
        }
        if let Some(payment_method) = self.payment_method {
            transaction.payment_method = payment_method;
        }
        if let Some(transaction_type) = self.transaction_type {
            transaction.transaction_type = transaction_type;
        }
        if let Some(category) = self.category {
            transaction.category = category;
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns read by [map_transaction_row], in order.
pub(crate) const TRANSACTION_COLUMNS: &str = "id, amount, description, date, payment_method, \
    transaction_type, user_id, category_id, created_at, updated_at";

/// The current UTC time truncated to microseconds.
fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_microsecond(now.microsecond()).unwrap_or(now)
}

fn map_write_error(error: rusqlite::Error, category: Option<CategoryId>) -> Error {
    match (error, category) {
        (
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ),
            Some(category_id),
        ) => Error::InvalidCategory(category_id),
        (rusqlite::Error::QueryReturnedNoRows, _) => Error::TransactionNotFound,
        (error, _) => error.into(),
    }
}

/// Create a new transaction in the database from a builder.
///
/// The caller should check that the category, if any, belongs to the same user.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let id = Uuid::new_v4();
    let now = now_utc();
    let category = builder.category;

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (id, amount, description, date, payment_method, \
                transaction_type, user_id, category_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                id,
                builder.amount,
                builder.description,
                builder.date,
                builder.payment_method,
                builder.transaction_type,
                builder.user.as_i64(),
                builder.category,
                now,
            ),
            map_transaction_row,
        )
        .map_err(|error| map_write_error(error, category))
}

/// Retrieve the transaction with `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| map_write_error(error, None))
}

/// Apply `changes` to the transaction with `id` owned by `user_id` and refresh `updated_at`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to one of the user's transactions,
/// - [Error::InvalidCategory] if the new category ID does not refer to a real category,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    changes: TransactionChanges,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let mut transaction = get_transaction(id, user_id, connection)?;
    changes.apply(&mut transaction);

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET amount = ?1, description = ?2, date = ?3, payment_method = ?4,
                 transaction_type = ?5, category_id = ?6, updated_at = ?7
             WHERE id = ?8 AND user_id = ?9
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                transaction.amount,
                &transaction.description,
                transaction.date,
                transaction.payment_method,
                transaction.transaction_type,
                transaction.category,
                now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| map_write_error(error, transaction.category))
}

/// Delete the transaction with `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound);
    }

    Ok(())
}

/// Get the number of transactions owned by `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1;",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id BLOB PRIMARY KEY,
                amount INTEGER NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                payment_method TEXT NOT NULL CHECK (payment_method IN ('online', 'cash')),
                transaction_type TEXT NOT NULL CHECK (transaction_type IN ('debit', 'credit')),
                user_id INTEGER NOT NULL,
                category_id BLOB,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must hold the columns in [TRANSACTION_COLUMNS].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        payment_method: row.get(4)?,
        transaction_type: row.get(5)?,
        user: UserID::new(row.get(6)?),
        category: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;
    use uuid::Uuid;

    use crate::{
        Error,
        auth::User,
        category::{CategoryName, create_category},
        db::initialize,
        test_utils::insert_test_user,
        transaction::{
            Amount, PaymentMethod, Transaction, TransactionBuilder, TransactionChanges,
            TransactionType, count_transactions, create_transaction, delete_transaction,
            get_transaction, update_transaction,
        },
    };

    fn get_test_connection() -> (Connection, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = insert_test_user(&conn, "foo@bar.baz");
        (conn, user)
    }

    fn lunch(user: &User) -> TransactionBuilder {
        Transaction::build(
            Amount::from_cents(1250),
            date!(2025 - 10 - 05),
            PaymentMethod::Cash,
            TransactionType::Debit,
            user.id,
        )
        .description("Lunch")
    }

    #[test]
    fn create_succeeds() {
        let (conn, user) = get_test_connection();

        let transaction = create_transaction(lunch(&user), &conn).unwrap();

        assert_eq!(transaction.amount, Amount::from_cents(1250));
        assert_eq!(transaction.description, "Lunch");
        assert_eq!(transaction.date, date!(2025 - 10 - 05));
        assert_eq!(transaction.user, user.id);
        assert_eq!(transaction.category, None);
        assert_eq!(transaction.created_at, transaction.updated_at);
    }

    #[test]
    fn create_fails_on_invalid_category() {
        let (conn, user) = get_test_connection();
        let category_id = Uuid::new_v4();

        let result = create_transaction(lunch(&user).category(Some(category_id)), &conn);

        assert_eq!(result, Err(Error::InvalidCategory(category_id)));
    }

    #[test]
    fn get_returns_created_transaction() {
        let (conn, user) = get_test_connection();
        let created = create_transaction(lunch(&user), &conn).unwrap();

        let selected = get_transaction(created.id, user.id, &conn);

        assert_eq!(selected, Ok(created));
    }

    #[test]
    fn get_hides_other_users_transactions() {
        let (conn, user) = get_test_connection();
        let other_user = insert_test_user(&conn, "other@bar.baz");
        let created = create_transaction(lunch(&user), &conn).unwrap();

        let selected = get_transaction(created.id, other_user.id, &conn);

        assert_eq!(selected, Err(Error::TransactionNotFound));
    }

    #[test]
    fn update_changes_only_given_fields() {
        let (conn, user) = get_test_connection();
        let category =
            create_category(CategoryName::new_unchecked("Food"), user.id, &conn).unwrap();
        let created = create_transaction(lunch(&user).category(Some(category.id)), &conn).unwrap();

        let updated = update_transaction(
            created.id,
            user.id,
            TransactionChanges {
                amount: Some(Amount::from_cents(999)),
                category: Some(None),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.amount, Amount::from_cents(999));
        assert_eq!(updated.category, None);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn update_fails_for_other_user() {
        let (conn, user) = get_test_connection();
        let other_user = insert_test_user(&conn, "other@bar.baz");
        let created = create_transaction(lunch(&user), &conn).unwrap();

        let result = update_transaction(
            created.id,
            other_user.id,
            TransactionChanges::default(),
            &conn,
        );

        assert_eq!(result, Err(Error::TransactionNotFound));
    }

    #[test]
    fn delete_removes_transaction() {
        let (conn, user) = get_test_connection();
        let created = create_transaction(lunch(&user), &conn).unwrap();

        delete_transaction(created.id, user.id, &conn).unwrap();

        assert_eq!(count_transactions(user.id, &conn), Ok(0));
        assert_eq!(
            delete_transaction(created.id, user.id, &conn),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn check_constraint_rejects_unknown_payment_method() {
        let (conn, user) = get_test_connection();

        let result = conn.execute(
            "INSERT INTO \"transaction\" (id, amount, date, payment_method, transaction_type, \
                user_id, created_at, updated_at)
             VALUES (?1, 100, '2025-01-01', 'card', 'debit', ?2, '', '')",
            (Uuid::new_v4(), user.id.as_i64()),
        );

        assert!(result.is_err());
    }

    #[test]
    fn get_count() {
        let (conn, user) = get_test_connection();
        let want_count = 20;
        for _ in 0..want_count {
            create_transaction(lunch(&user), &conn).expect("Could not create transaction");
        }

        let got_count = count_transactions(user.id, &conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }
}
