//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, `TransactionBuilder` and money `Amount` type
//! - Database functions for storing, querying, and managing transactions
//! - Validation of request bodies and list filters
//! - The JSON endpoints for listing, creating, retrieving, editing and deleting transactions

mod amount;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod filter;
mod get_endpoint;
mod list_endpoint;
mod payload;
mod query;

pub use amount::{Amount, AmountError};
pub use core::{
    PaymentMethod, Transaction, TransactionBuilder, TransactionChanges, TransactionId,
    TransactionType, count_transactions, create_transaction, create_transaction_table,
    delete_transaction, get_transaction, map_transaction_row, parse_transaction_id,
    update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use filter::TransactionFilter;
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use payload::TransactionPayload;
pub use query::{count_filtered_transactions, get_filtered_transactions};
