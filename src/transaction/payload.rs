//! Validation of the JSON bodies sent to create and update transactions.

use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Deserializer};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use uuid::Uuid;

use crate::{
    Error, FieldErrors,
    auth::UserID,
    category::{CategoryId, get_category},
    transaction::{
        Amount, PaymentMethod, Transaction, TransactionBuilder, TransactionChanges,
        TransactionType,
    },
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

const REQUIRED: &str = "This field is required.";
const NEGATIVE_AMOUNT: &str = "Ensure this value is greater than or equal to 0.";
const INVALID_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

/// The JSON body accepted when creating or updating a transaction.
///
/// Every field is optional here so that missing fields can be reported
/// together. Unknown keys, including `user`, are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionPayload {
    /// A decimal string or JSON number.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    /// Defaults to an empty string.
    #[serde(default)]
    pub description: Option<String>,
    /// A date in the format "YYYY-MM-DD".
    #[serde(default)]
    pub date: Option<String>,
    /// Either "online" or "cash".
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Either "debit" or "credit".
    #[serde(default)]
    pub transaction_type: Option<String>,
    /// `Some(None)` when the body holds `"category": null`.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub category: Option<Option<String>>,
}

/// Distinguish a key set to `null` from a missing key.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl TransactionPayload {
    /// Validate the payload for a new transaction owned by `user_id`.
    ///
    /// `today` is used when the payload has no date.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] listing every missing or invalid field.
    pub fn into_builder(
        self,
        user_id: UserID,
        today: Date,
        connection: &Connection,
    ) -> Result<TransactionBuilder, Error> {
        let mut errors = FieldErrors::new();

        let amount = required(self.amount.as_ref(), "amount", &mut errors)
            .and_then(|raw| validate_amount(raw, &mut errors));
        let payment_method = required(self.payment_method.as_deref(), "payment_method", &mut errors)
            .and_then(|raw| validate_choice::<PaymentMethod>(raw, "payment_method", &mut errors));
        let transaction_type =
            required(self.transaction_type.as_deref(), "transaction_type", &mut errors).and_then(
                |raw| validate_choice::<TransactionType>(raw, "transaction_type", &mut errors),
            );
        let date = match self.date.as_deref() {
            Some(raw) => validate_date(raw, &mut errors),
            None => Some(today),
        };
        let category = match self.category.flatten() {
            Some(raw) => validate_category(&raw, user_id, connection, &mut errors)?,
            None => Some(None),
        };

        let (
            Some(amount),
            Some(payment_method),
            Some(transaction_type),
            Some(date),
            Some(category),
        ) = (amount, payment_method, transaction_type, date, category)
        else {
            return Err(Error::Validation(errors));
        };

        Ok(
            Transaction::build(amount, date, payment_method, transaction_type, user_id)
                .description(self.description.as_deref().unwrap_or_default())
                .category(category),
        )
    }

    /// Validate the payload as a partial update to one of `user_id`'s transactions.
    ///
    /// Only the fields present in the payload are validated and changed.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] listing every invalid field.
    pub fn into_changes(
        self,
        user_id: UserID,
        connection: &Connection,
    ) -> Result<TransactionChanges, Error> {
        let mut errors = FieldErrors::new();

        let changes = TransactionChanges {
            amount: self
                .amount
                .as_ref()
                .and_then(|raw| validate_amount(raw, &mut errors)),
            description: self.description,
            date: self
                .date
                .as_deref()
                .and_then(|raw| validate_date(raw, &mut errors)),
            payment_method: self.payment_method.as_deref().and_then(|raw| {
                validate_choice::<PaymentMethod>(raw, "payment_method", &mut errors)
            }),
            transaction_type: self.transaction_type.as_deref().and_then(|raw| {
                validate_choice::<TransactionType>(raw, "transaction_type", &mut errors)
            }),
            category: match self.category {
                Some(Some(raw)) => validate_category(&raw, user_id, connection, &mut errors)?,
                Some(None) => Some(None),
                None => None,
            },
        };

        errors.into_result()?;

        Ok(changes)
    }
}

fn required<'a, T: ?Sized>(
    value: Option<&'a T>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<&'a T> {
    if value.is_none() {
        errors.add(field, REQUIRED);
    }

    value
}

fn validate_amount(raw: &serde_json::Value, errors: &mut FieldErrors) -> Option<Amount> {
    match Amount::from_json(raw) {
        Ok(amount) if amount.is_negative() => {
            errors.add("amount", NEGATIVE_AMOUNT);
            None
        }
        Ok(amount) => Some(amount),
        Err(error) => {
            errors.add("amount", error.to_string());
            None
        }
    }
}

fn validate_choice<T>(raw: &str, field: &str, errors: &mut FieldErrors) -> Option<T>
where
    T: FromStr<Err = String>,
{
    raw.parse()
        .map_err(|message: String| errors.add(field, message))
        .ok()
}

fn validate_date(raw: &str, errors: &mut FieldErrors) -> Option<Date> {
    Date::parse(raw.trim(), DATE_FORMAT)
        .map_err(|_| errors.add("date", INVALID_DATE))
        .ok()
}

/// Check that `raw` is the ID of one of `user_id`'s categories.
///
/// Returns `Some(Some(id))` for a valid category and `None` after recording
/// an error. Database errors other than a missing category are returned.
fn validate_category(
    raw: &str,
    user_id: UserID,
    connection: &Connection,
    errors: &mut FieldErrors,
) -> Result<Option<Option<CategoryId>>, Error> {
    let Ok(category_id) = Uuid::parse_str(raw.trim()) else {
        errors.add("category", format!("\"{raw}\" is not a valid UUID."));
        return Ok(None);
    };

    match get_category(category_id, user_id, connection) {
        Ok(category) => Ok(Some(Some(category.id))),
        Err(Error::CategoryNotFound) => {
            errors.add(
                "category",
                format!("Invalid pk \"{category_id}\" - object does not exist."),
            );
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;
    use uuid::Uuid;

    use crate::{
        Error,
        auth::User,
        category::{CategoryName, create_category},
        db::initialize,
        test_utils::insert_test_user,
        transaction::{Amount, PaymentMethod, TransactionType},
    };

    use super::TransactionPayload;

    fn get_test_connection() -> (Connection, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = insert_test_user(&conn, "foo@bar.baz");
        (conn, user)
    }

    fn parse(body: serde_json::Value) -> TransactionPayload {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn builder_uses_defaults() {
        let (conn, user) = get_test_connection();
        let today = date!(2025 - 10 - 05);

        let builder = parse(json!({
            "amount": "12.50",
            "payment_method": "cash",
            "transaction_type": "debit",
            "user": 42,
        }))
        .into_builder(user.id, today, &conn)
        .unwrap();

        assert_eq!(builder.amount, Amount::from_cents(1250));
        assert_eq!(builder.date, today);
        assert_eq!(builder.description, "");
        assert_eq!(builder.payment_method, PaymentMethod::Cash);
        assert_eq!(builder.transaction_type, TransactionType::Debit);
        assert_eq!(builder.user, user.id);
        assert_eq!(builder.category, None);
    }

    #[test]
    fn builder_reports_all_missing_fields() {
        let (conn, user) = get_test_connection();

        let result = parse(json!({})).into_builder(user.id, date!(2025 - 10 - 05), &conn);

        let Err(Error::Validation(errors)) = result else {
            panic!("want validation error, got {result:?}");
        };
        for field in ["amount", "payment_method", "transaction_type"] {
            assert_eq!(
                errors.get(field),
                Some(["This field is required.".to_owned()].as_slice())
            );
        }
        assert_eq!(errors.get("date"), None);
    }

    #[test]
    fn builder_rejects_bad_values() {
        let (conn, user) = get_test_connection();

        let result = parse(json!({
            "amount": "1.234",
            "payment_method": "card",
            "transaction_type": "debit",
            "date": "05/10/2025",
        }))
        .into_builder(user.id, date!(2025 - 10 - 05), &conn);

        let Err(Error::Validation(errors)) = result else {
            panic!("want validation error, got {result:?}");
        };
        assert_eq!(
            errors.get("amount"),
            Some(["Ensure that there are no more than 2 decimal places.".to_owned()].as_slice())
        );
        assert_eq!(
            errors.get("payment_method"),
            Some(["\"card\" is not a valid choice.".to_owned()].as_slice())
        );
        assert!(errors.get("date").is_some());
        assert_eq!(errors.get("transaction_type"), None);
    }

    #[test]
    fn builder_rejects_negative_amount() {
        let (conn, user) = get_test_connection();

        let result = parse(json!({
            "amount": -5,
            "payment_method": "cash",
            "transaction_type": "debit",
        }))
        .into_builder(user.id, date!(2025 - 10 - 05), &conn);

        assert!(matches!(result, Err(Error::Validation(errors)) if errors.get("amount").is_some()));
    }

    #[test]
    fn builder_rejects_other_users_category() {
        let (conn, user) = get_test_connection();
        let other_user = insert_test_user(&conn, "other@bar.baz");
        let category =
            create_category(CategoryName::new_unchecked("Food"), other_user.id, &conn).unwrap();

        let result = parse(json!({
            "amount": "1",
            "payment_method": "cash",
            "transaction_type": "debit",
            "category": category.id,
        }))
        .into_builder(user.id, date!(2025 - 10 - 05), &conn);

        let Err(Error::Validation(errors)) = result else {
            panic!("want validation error, got {result:?}");
        };
        assert_eq!(
            errors.get("category"),
            Some([format!("Invalid pk \"{}\" - object does not exist.", category.id)].as_slice())
        );
    }

    #[test]
    fn builder_accepts_own_category() {
        let (conn, user) = get_test_connection();
        let category =
            create_category(CategoryName::new_unchecked("Food"), user.id, &conn).unwrap();

        let builder = parse(json!({
            "amount": 1,
            "payment_method": "online",
            "transaction_type": "credit",
            "category": category.id,
            "description": "Refund",
            "date": "2024-02-29",
        }))
        .into_builder(user.id, date!(2025 - 10 - 05), &conn)
        .unwrap();

        assert_eq!(builder.category, Some(category.id));
        assert_eq!(builder.description, "Refund");
        assert_eq!(builder.date, date!(2024 - 02 - 29));
    }

    #[test]
    fn changes_only_hold_present_fields() {
        let (conn, user) = get_test_connection();

        let changes = parse(json!({ "description": "Dinner" }))
            .into_changes(user.id, &conn)
            .unwrap();

        assert_eq!(changes.description.as_deref(), Some("Dinner"));
        assert_eq!(changes.amount, None);
        assert_eq!(changes.category, None);
    }

    #[test]
    fn changes_distinguish_null_category() {
        let (conn, user) = get_test_connection();

        let changes = parse(json!({ "category": null }))
            .into_changes(user.id, &conn)
            .unwrap();

        assert_eq!(changes.category, Some(None));
    }

    #[test]
    fn changes_reject_unknown_category() {
        let (conn, user) = get_test_connection();

        let result = parse(json!({ "category": Uuid::new_v4() })).into_changes(user.id, &conn);

        assert!(matches!(result, Err(Error::Validation(errors)) if errors.get("category").is_some()));
    }
}
