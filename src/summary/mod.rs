//! Aggregate totals over a user's transactions for a month, a year or a category.

mod category;
mod monthly;
mod period;

pub use category::{
    CategorySummary, TransactionDetail, TypeBreakdown, TypeTotal, get_category_summary,
    get_category_summary_endpoint,
};
pub use monthly::{
    CategoryBreakdown, MonthlySummary, SummaryState, get_monthly_summary,
    get_monthly_summary_endpoint,
};
pub use period::{MAX_YEAR, MIN_YEAR, PeriodQuery, date_range, parse_month, parse_year};
