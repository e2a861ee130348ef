use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use tally_rs::{
    Amount, CategoryName, PasswordHash, PaymentMethod, Transaction, TransactionType,
    ValidatedPassword, create_category, create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server of tally_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test";

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {TEST_EMAIL} with the password \"{TEST_PASSWORD}\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(EmailAddress::from_str(TEST_EMAIL)?, password_hash, &conn)?;

    println!("Creating categories...");

    let mut categories = Vec::new();
    for name in ["Groceries", "Rent", "Salary", "Transport"] {
        categories.push(create_category(CategoryName::new(name)?, user.id, &conn)?);
    }

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for week in 0..12 {
        let date = today - Duration::weeks(week);

        let weekly_transactions = [
            (4250 + week * 115, TransactionType::Debit, PaymentMethod::Online, 0, "Supermarket"),
            (550, TransactionType::Debit, PaymentMethod::Cash, 3, "Bus fare"),
            (120_000, TransactionType::Credit, PaymentMethod::Online, 2, "Pay day"),
        ];

        for (cents, transaction_type, payment_method, category_index, description) in
            weekly_transactions
        {
            let builder = Transaction::build(
                Amount::from_cents(cents),
                date,
                payment_method,
                transaction_type,
                user.id,
            )
            .description(description)
            .category(Some(categories[category_index].id));

            create_transaction(builder, &conn)?;
            count += 1;
        }

        if week % 4 == 0 {
            let rent = Transaction::build(
                Amount::from_cents(180_000),
                date,
                PaymentMethod::Online,
                TransactionType::Debit,
                user.id,
            )
            .description("Rent")
            .category(Some(categories[1].id));

            create_transaction(rent, &conn)?;
            count += 1;
        }
    }

    let uncategorised = Transaction::build(
        Amount::from_cents(1999),
        today,
        PaymentMethod::Cash,
        TransactionType::Debit,
        user.id,
    )
    .description("Miscellaneous");
    create_transaction(uncategorised, &conn)?;
    count += 1;

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}
