//! Parses `field__lookup=value` query parameters into SQL conditions for
//! the transaction list.

use std::str::FromStr;

use rusqlite::types::Value;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use uuid::Uuid;

use crate::{
    Error,
    pagination::{PAGE_QUERY_PARAM, PAGE_SIZE_QUERY_PARAM},
    transaction::{Amount, PaymentMethod, TransactionType},
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Separates a field name from its lookup, e.g. `date__gte`.
const LOOKUP_SEPARATOR: &str = "__";

/// The transaction fields that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Amount,
    Description,
    Date,
    PaymentMethod,
    TransactionType,
    Category,
    CategoryName,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Field::Id),
            "amount" => Some(Field::Amount),
            "description" => Some(Field::Description),
            "date" => Some(Field::Date),
            "payment_method" => Some(Field::PaymentMethod),
            "transaction_type" => Some(Field::TransactionType),
            "category" => Some(Field::Category),
            "category__name" => Some(Field::CategoryName),
            _ => None,
        }
    }

    /// The column in the transaction list query, which joins `"transaction" t`
    /// with `category c`.
    fn column(&self) -> &'static str {
        match self {
            Field::Id => "t.id",
            Field::Amount => "t.amount",
            Field::Description => "t.description",
            Field::Date => "t.date",
            Field::PaymentMethod => "t.payment_method",
            Field::TransactionType => "t.transaction_type",
            Field::Category => "t.category_id",
            Field::CategoryName => "c.name",
        }
    }

    fn supports(&self, lookup: Lookup) -> bool {
        use Lookup::*;

        match self {
            Field::Id | Field::PaymentMethod | Field::TransactionType => lookup == Exact,
            Field::Amount => matches!(lookup, Exact | Gt | Gte | Lt | Lte),
            Field::Description | Field::CategoryName => {
                matches!(lookup, Exact | IExact | Contains | IContains)
            }
            Field::Date => matches!(lookup, Exact | Gt | Gte | Lt | Lte | Year | Month | Day),
            Field::Category => matches!(lookup, Exact | IsNull),
        }
    }

    /// Convert the raw query value into an SQL value for this field.
    fn parse_value(&self, raw: &str) -> Option<Value> {
        match self {
            Field::Id | Field::Category => Uuid::parse_str(raw)
                .ok()
                .map(|id| Value::Blob(id.as_bytes().to_vec())),
            Field::Amount => Amount::from_str(raw)
                .ok()
                .map(|amount| Value::Integer(amount.cents())),
            Field::Description | Field::CategoryName => Some(Value::Text(raw.to_owned())),
            Field::Date => Date::parse(raw, DATE_FORMAT)
                .ok()
                .map(|date| Value::Text(date.to_string())),
            Field::PaymentMethod => PaymentMethod::from_str(raw)
                .ok()
                .map(|method| Value::Text(method.as_str().to_owned())),
            Field::TransactionType => TransactionType::from_str(raw)
                .ok()
                .map(|kind| Value::Text(kind.as_str().to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    Gt,
    Gte,
    Lt,
    Lte,
    Year,
    Month,
    Day,
    IsNull,
}

impl Lookup {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "exact" => Some(Lookup::Exact),
            "iexact" => Some(Lookup::IExact),
            "contains" => Some(Lookup::Contains),
            "icontains" => Some(Lookup::IContains),
            "gt" => Some(Lookup::Gt),
            "gte" => Some(Lookup::Gte),
            "lt" => Some(Lookup::Lt),
            "lte" => Some(Lookup::Lte),
            "year" => Some(Lookup::Year),
            "month" => Some(Lookup::Month),
            "day" => Some(Lookup::Day),
            "isnull" => Some(Lookup::IsNull),
            _ => None,
        }
    }
}

/// SQL conditions and their parameters for filtering a user's transactions.
///
/// The conditions use numbered placeholders starting at `?2`, since `?1`
/// is reserved for the user ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    conditions: Vec<String>,
    parameters: Vec<Value>,
}

impl TransactionFilter {
    /// The first placeholder number available to filter parameters.
    const FIRST_PLACEHOLDER: usize = 2;

    /// Build a filter from the query parameters of a list request.
    ///
    /// The pagination parameters are skipped, as are parameters with an
    /// empty value.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidFilter] for an unknown field, a lookup the field
    /// does not support, or a value that cannot be parsed.
    pub fn parse(params: &[(String, String)]) -> Result<Self, Error> {
        let mut filter = Self::default();

        for (key, raw_value) in params {
            if key == PAGE_QUERY_PARAM || key == PAGE_SIZE_QUERY_PARAM {
                continue;
            }

            let raw_value = raw_value.trim();

            if raw_value.is_empty() {
                continue;
            }

            let (field, lookup) = parse_key(key)?;
            filter.push(field, lookup, key, raw_value)?;
        }

        Ok(filter)
    }

    /// The conditions joined with `AND`, or `None` if there are no conditions.
    pub fn where_clause(&self) -> Option<String> {
        (!self.conditions.is_empty()).then(|| self.conditions.join(" AND "))
    }

    /// The parameter values in placeholder order.
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    fn next_placeholder(&self) -> usize {
        self.parameters.len() + Self::FIRST_PLACEHOLDER
    }

    fn push(&mut self, field: Field, lookup: Lookup, key: &str, raw: &str) -> Result<(), Error> {
        let column = field.column();
        let invalid_value =
            || Error::InvalidFilter(format!("Invalid value \"{raw}\" for filter \"{key}\""));

        if lookup == Lookup::IsNull {
            let condition = match raw.to_lowercase().as_str() {
                "true" | "1" => format!("{column} IS NULL"),
                "false" | "0" => format!("{column} IS NOT NULL"),
                _ => return Err(invalid_value()),
            };
            self.conditions.push(condition);
            return Ok(());
        }

        let placeholder = self.next_placeholder();

        let (condition, value) = match lookup {
            Lookup::Year | Lookup::Month | Lookup::Day => {
                let part = match lookup {
                    Lookup::Year => "%Y",
                    Lookup::Month => "%m",
                    _ => "%d",
                };
                let number: i64 = raw.parse().map_err(|_| invalid_value())?;

                (
                    format!("CAST(strftime('{part}', {column}) AS INTEGER) = ?{placeholder}"),
                    Value::Integer(number),
                )
            }
            Lookup::IExact => (
                format!("{column} = ?{placeholder} COLLATE NOCASE"),
                Value::Text(raw.to_owned()),
            ),
            Lookup::Contains => (
                format!("instr({column}, ?{placeholder}) > 0"),
                Value::Text(raw.to_owned()),
            ),
            Lookup::IContains => (
                format!("{column} LIKE ?{placeholder} ESCAPE '\\'"),
                Value::Text(format!("%{}%", escape_like(raw))),
            ),
            _ => {
                let operator = match lookup {
                    Lookup::Gt => ">",
                    Lookup::Gte => ">=",
                    Lookup::Lt => "<",
                    Lookup::Lte => "<=",
                    _ => "=",
                };
                let value = field.parse_value(raw).ok_or_else(invalid_value)?;

                (format!("{column} {operator} ?{placeholder}"), value)
            }
        };

        self.conditions.push(condition);
        self.parameters.push(value);

        Ok(())
    }
}

/// Split a query key into its field and lookup.
///
/// A key without a known lookup suffix is an exact match on the whole key,
/// which lets `category__name` name a field.
fn parse_key(key: &str) -> Result<(Field, Lookup), Error> {
    let (field_name, lookup) = match key.rsplit_once(LOOKUP_SEPARATOR) {
        Some((field_name, lookup_name)) => match Lookup::from_name(lookup_name) {
            Some(lookup) => (field_name, lookup),
            None => (key, Lookup::Exact),
        },
        None => (key, Lookup::Exact),
    };

    let field = Field::from_name(field_name)
        .ok_or_else(|| Error::InvalidFilter(format!("Unknown filter \"{key}\"")))?;

    if !field.supports(lookup) {
        return Err(Error::InvalidFilter(format!(
            "Unsupported lookup in filter \"{key}\""
        )));
    }

    Ok((field, lookup))
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());

    for character in raw.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }

    escaped
}
