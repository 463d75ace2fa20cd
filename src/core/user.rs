//! Identity repository - Account management.
//!
//! Password hashes are read only by [`find_user_by_username`], which exists
//! for the authentication service. Every other read returns a
//! [`UserSummary`], which has no hash field at all.

use crate::{
    config::users::SeedUserConfig,
    core::password,
    entities::{Role, User, user},
    errors::{Error, Result},
};
use sea_orm::{FromQueryResult, QueryOrder, QuerySelect, Set, SqlErr, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// An account without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct UserSummary {
    /// Store-assigned identifier
    pub id: i64,
    /// Login name
    pub username: String,
    /// Access level
    pub role: Role,
}

impl From<user::Model> for UserSummary {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
        }
    }
}

/// Input for [`create_user`].
#[derive(Clone)]
pub struct NewUser {
    /// Login name
    pub username: String,
    /// Plaintext password
    pub password: String,
    /// Access level
    pub role: Role,
}

/// Input for [`update_user`].
#[derive(Clone)]
pub struct UserUpdate {
    /// Account to edit; must be present
    pub id: Option<i64>,
    /// New login name
    pub username: String,
    /// New access level
    pub role: Role,
    /// New plaintext password, or `None` to keep the current one
    pub password: Option<String>,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserUpdate")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("password_changed", &self.password.is_some())
            .finish()
    }
}

/// Finds an account by exact username, including its password hash.
pub async fn find_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an account by id, without its password hash.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<UserSummary>> {
    User::find_by_id(user_id)
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .column(user::Column::Role)
        .into_model::<UserSummary>()
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every account ordered by id. Hashes are never selected.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<UserSummary>> {
    User::find()
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .column(user::Column::Role)
        .order_by_asc(user::Column::Id)
        .into_model::<UserSummary>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates an account, hashing the password with a fresh salt.
///
/// # Errors
/// Returns an error if:
/// - The username is empty or whitespace-only
/// - The password is empty or longer than bcrypt's 72-byte limit
/// - Another account already has this username
/// - Hashing or the database insert fails
#[instrument(skip(db))]
pub async fn create_user(
    db: &DatabaseConnection,
    new_user: NewUser,
    bcrypt_cost: Option<u32>,
) -> Result<UserSummary> {
    let username = validate_username(&new_user.username)?;
    password::validate_password(&new_user.password)?;

    let password_hash = password::hash_password(&new_user.password, bcrypt_cost).await?;
    let account = user::ActiveModel {
        username: Set(username.clone()),
        password_hash: Set(password_hash),
        role: Set(new_user.role),
        ..Default::default()
    };
    let created = account
        .insert(db)
        .await
        .map_err(|e| classify_username_error(e, &username))?;

    info!(user_id = created.id, role = ?created.role, "Created user '{}'", created.username);
    Ok(created.into())
}

/// Edits username and role, and replaces the password hash when a new
/// password is given.
///
/// # Errors
/// Returns an error if:
/// - The update has no id
/// - The username is empty, or a new password is empty or too long
/// - No account has this id
/// - Another account already has the new username
/// - Hashing or the database update fails
#[instrument(skip(db))]
pub async fn update_user(
    db: &DatabaseConnection,
    update: UserUpdate,
    bcrypt_cost: Option<u32>,
) -> Result<UserSummary> {
    let user_id = update
        .id
        .ok_or_else(|| Error::validation("User id is required for update"))?;
    let username = validate_username(&update.username)?;

    let mut account: user::ActiveModel = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?
        .into();

    if let Some(new_password) = update.password.as_deref() {
        password::validate_password(new_password)?;
        account.password_hash = Set(password::hash_password(new_password, bcrypt_cost).await?);
    }
    account.username = Set(username.clone());
    account.role = Set(update.role);

    let updated = account
        .update(db)
        .await
        .map_err(|e| classify_username_error(e, &username))?;

    debug!(user_id, "Updated user");
    Ok(updated.into())
}

/// Deletes an account.
///
/// Sale lines keep a reference to the seller, so an account that has sold
/// anything cannot be removed.
///
/// # Errors
/// Returns `Error::UserNotFound`, `Error::UserHasSales`, or a database error.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let result = User::delete_by_id(user_id)
        .exec(db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => Error::UserHasSales { id: user_id },
            _ => e.into(),
        })?;

    if result.rows_affected == 0 {
        return Err(Error::UserNotFound { id: user_id });
    }
    info!(user_id, "Deleted user");
    Ok(())
}

/// Creates each configured account whose username does not exist yet.
///
/// Returns how many accounts were created. Existing accounts are left as they
/// are, including their passwords.
pub async fn seed_users(
    db: &DatabaseConnection,
    seeds: &[SeedUserConfig],
    bcrypt_cost: Option<u32>,
) -> Result<usize> {
    let mut created = 0;
    for seed in seeds {
        if find_user_by_username(db, seed.username.trim()).await?.is_some() {
            debug!("Seed user '{}' already exists, skipping", seed.username);
            continue;
        }
        create_user(
            db,
            NewUser {
                username: seed.username.clone(),
                password: seed.password.clone(),
                role: seed.role,
            },
            bcrypt_cost,
        )
        .await?;
        created += 1;
    }
    Ok(created)
}

/// Rejects `actor` unless they are an administrator.
///
/// # Errors
/// Returns `Error::Forbidden` naming `action`.
pub fn require_admin(actor: &UserSummary, action: &str) -> Result<()> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden {
            action: action.to_string(),
        })
    }
}

fn validate_username(username: &str) -> Result<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Username cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn classify_username_error(err: DbErr, username: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateUsername {
            username: username.to_string(),
        },
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::password::verify_password;
    use crate::test_utils::*;

    fn new_user(username: &str, password: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_user_stores_hash_not_plaintext() -> Result<()> {
        let db = setup_test_db().await?;

        let summary = create_user(
            &db,
            new_user(" maria ", "segredo", Role::Employee),
            Some(TEST_BCRYPT_COST),
        )
        .await?;
        assert_eq!(summary.username, "maria");
        assert_eq!(summary.role, Role::Employee);

        let stored = find_user_by_username(&db, "maria").await?.unwrap();
        assert_ne!(stored.password_hash, "segredo");
        assert!(verify_password("segredo", &stored.password_hash).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_user(&db, new_user("  ", "pw", Role::Employee), Some(TEST_BCRYPT_COST)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_user(&db, new_user("ana", "", Role::Employee), Some(TEST_BCRYPT_COST)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let too_long = "x".repeat(73);
        let result = create_user(&db, new_user("ana", &too_long, Role::Employee), Some(TEST_BCRYPT_COST)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        assert!(list_users(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_duplicate_username() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "ana", Role::Employee).await?;

        let result = create_user(&db, new_user("ana", "other", Role::Admin), Some(TEST_BCRYPT_COST)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateUsername { username } if username == "ana"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_users_ordered_without_hashes() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_user(&db, "admin", Role::Admin).await?;
        let joao = create_test_user(&db, "joao", Role::Employee).await?;

        assert_eq!(list_users(&db).await?, vec![admin.clone(), joao]);
        assert_eq!(get_user_by_id(&db, admin.id).await?, Some(admin));
        assert!(get_user_by_id(&db, 999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_user_without_password_keeps_hash() -> Result<()> {
        let db = setup_test_db().await?;
        let joao = create_test_user(&db, "joao", Role::Employee).await?;
        let before = find_user_by_username(&db, "joao").await?.unwrap();

        let updated = update_user(
            &db,
            UserUpdate {
                id: Some(joao.id),
                username: "joao.silva".to_string(),
                role: Role::Admin,
                password: None,
            },
            Some(TEST_BCRYPT_COST),
        )
        .await?;
        assert_eq!(updated.username, "joao.silva");
        assert_eq!(updated.role, Role::Admin);

        let after = find_user_by_username(&db, "joao.silva").await?.unwrap();
        assert_eq!(after.password_hash, before.password_hash);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_user_replaces_password() -> Result<()> {
        let db = setup_test_db().await?;
        let joao = create_test_user(&db, "joao", Role::Employee).await?;

        update_user(
            &db,
            UserUpdate {
                id: Some(joao.id),
                username: "joao".to_string(),
                role: Role::Employee,
                password: Some("nova-senha".to_string()),
            },
            Some(TEST_BCRYPT_COST),
        )
        .await?;

        let stored = find_user_by_username(&db, "joao").await?.unwrap();
        assert!(verify_password("nova-senha", &stored.password_hash).await?);
        assert!(!verify_password("joao", &stored.password_hash).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_user_errors() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "ana", Role::Employee).await?;
        let joao = create_test_user(&db, "joao", Role::Employee).await?;

        let update = |id: Option<i64>, username: &str| UserUpdate {
            id,
            username: username.to_string(),
            role: Role::Employee,
            password: None,
        };

        let result = update_user(&db, update(None, "joao"), Some(TEST_BCRYPT_COST)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = update_user(&db, update(Some(999), "joao"), Some(TEST_BCRYPT_COST)).await;
        assert!(matches!(result.unwrap_err(), Error::UserNotFound { id: 999 }));

        let result = update_user(&db, update(Some(joao.id), "ana"), Some(TEST_BCRYPT_COST)).await;
        assert!(matches!(result.unwrap_err(), Error::DuplicateUsername { .. }));

        let before = find_user_by_username(&db, "joao").await?.unwrap();
        let long_password = UserUpdate {
            password: Some("x".repeat(73)),
            ..update(Some(joao.id), "joao")
        };
        let result = update_user(&db, long_password, Some(TEST_BCRYPT_COST)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        let after = find_user_by_username(&db, "joao").await?.unwrap();
        assert_eq!(after.password_hash, before.password_hash);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_user(&db, "ana", Role::Employee).await?;

        delete_user(&db, ana.id).await?;
        assert!(list_users(&db).await?.is_empty());

        let result = delete_user(&db, ana.id).await;
        assert!(matches!(result.unwrap_err(), Error::UserNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_with_sales_is_rejected() -> Result<()> {
        let (db, product, seller) = setup_with_product_and_user().await?;
        record_test_sale(&db, product.id, seller.id, 1, product.price).await?;

        let result = delete_user(&db, seller.id).await;
        assert!(matches!(result.unwrap_err(), Error::UserHasSales { id } if id == seller.id));
        assert!(get_user_by_id(&db, seller.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_users_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let seeds = vec![
            SeedUserConfig {
                username: "admin".to_string(),
                password: "admin".to_string(),
                role: Role::Admin,
            },
            SeedUserConfig {
                username: "maria".to_string(),
                password: "maria".to_string(),
                role: Role::Employee,
            },
        ];

        assert_eq!(seed_users(&db, &seeds, Some(TEST_BCRYPT_COST)).await?, 2);
        assert_eq!(seed_users(&db, &seeds, Some(TEST_BCRYPT_COST)).await?, 0);

        let users = list_users(&db).await?;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].role, Role::Admin);
        Ok(())
    }

    #[test]
    fn test_require_admin() {
        let admin = UserSummary {
            id: 1,
            username: "admin".to_string(),
            role: Role::Admin,
        };
        let employee = UserSummary {
            id: 2,
            username: "ana".to_string(),
            role: Role::Employee,
        };

        assert!(require_admin(&admin, "delete users").is_ok());
        assert!(matches!(
            require_admin(&employee, "delete users"),
            Err(Error::Forbidden { .. })
        ));
    }

    #[test]
    fn test_debug_hides_passwords() {
        let rendered = format!("{:?}", new_user("ana", "segredo", Role::Employee));
        assert!(!rendered.contains("segredo"));
    }
}
