//! Database operations for categories.

use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryName},
};

/// Create a category owned by `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if the user already has a category called `name`.
pub fn create_category(
    name: CategoryName,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let id = Uuid::new_v4();

    connection.execute(
        "INSERT INTO category (id, name, user_id) VALUES (?1, ?2, ?3);",
        (id, name.as_ref(), user_id.as_i64()),
    )?;

    Ok(Category {
        id,
        name,
        user: user_id,
    })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::CategoryNotFound] if the category does not exist or
/// belongs to another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, user_id FROM category WHERE id = ?1 AND user_id = ?2;")?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::CategoryNotFound,
            error => error,
        })
}

/// Retrieve all of a user's categories ordered alphabetically by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, user_id FROM category WHERE user_id = ?1 ORDER BY name ASC;")?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Delete a category owned by `user_id`.
///
/// Transactions in the category are kept and lose their category.
///
/// # Errors
///
/// Returns [Error::CategoryNotFound] if the category does not exist or
/// belongs to another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::CategoryNotFound);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_user_id = row.get(2)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        user: UserID::new(raw_user_id),
    })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;
    use uuid::Uuid;

    use crate::{
        Error,
        auth::User,
        category::{CategoryName, create_category, get_categories, get_category},
        db::initialize,
        test_utils::insert_test_user,
    };

    use super::delete_category;

    fn get_test_db_connection() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = insert_test_user(&connection, "foo@bar.baz");

        (connection, user)
    }

    #[test]
    fn create_category_succeeds() {
        let (connection, user) = get_test_db_connection();
        let name = CategoryName::new("Groceries").unwrap();

        let category = create_category(name.clone(), user.id, &connection).unwrap();

        assert_eq!(category.name, name);
        assert_eq!(category.user, user.id);
    }

    #[test]
    fn create_duplicate_category_fails() {
        let (connection, user) = get_test_db_connection();
        let name = CategoryName::new_unchecked("Groceries");
        create_category(name.clone(), user.id, &connection).unwrap();

        let result = create_category(name, user.id, &connection);

        assert_eq!(result, Err(Error::DuplicateCategoryName));
    }

    #[test]
    fn different_users_can_share_category_names() {
        let (connection, user) = get_test_db_connection();
        let other_user = insert_test_user(&connection, "other@bar.baz");
        let name = CategoryName::new_unchecked("Groceries");
        create_category(name.clone(), user.id, &connection).unwrap();

        let result = create_category(name, other_user.id, &connection);

        assert!(result.is_ok());
    }

    #[test]
    fn get_category_succeeds() {
        let (connection, user) = get_test_db_connection();
        let inserted = create_category(CategoryName::new_unchecked("Foo"), user.id, &connection)
            .expect("Could not create test category");

        let selected = get_category(inserted.id, user.id, &connection);

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_category_of_other_user_fails() {
        let (connection, user) = get_test_db_connection();
        let other_user = insert_test_user(&connection, "other@bar.baz");
        let inserted =
            create_category(CategoryName::new_unchecked("Foo"), user.id, &connection).unwrap();

        let selected = get_category(inserted.id, other_user.id, &connection);

        assert_eq!(selected, Err(Error::CategoryNotFound));
    }

    #[test]
    fn get_categories_sorts_by_name() {
        let (connection, user) = get_test_db_connection();
        let other_user = insert_test_user(&connection, "other@bar.baz");
        for name in ["Rent", "Fun", "Groceries"] {
            create_category(CategoryName::new_unchecked(name), user.id, &connection).unwrap();
        }
        create_category(CategoryName::new_unchecked("Hidden"), other_user.id, &connection)
            .unwrap();

        let names: Vec<String> = get_categories(user.id, &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name.to_string())
            .collect();

        assert_eq!(names, ["Fun", "Groceries", "Rent"]);
    }

    #[test]
    fn delete_category_succeeds() {
        let (connection, user) = get_test_db_connection();
        let category =
            create_category(CategoryName::new_unchecked("Foo"), user.id, &connection).unwrap();

        delete_category(category.id, user.id, &connection).unwrap();

        assert_eq!(
            get_category(category.id, user.id, &connection),
            Err(Error::CategoryNotFound)
        );
    }

    #[test]
    fn delete_missing_category_fails() {
        let (connection, user) = get_test_db_connection();

        let result = delete_category(Uuid::new_v4(), user.id, &connection);

        assert_eq!(result, Err(Error::CategoryNotFound));
    }
}
