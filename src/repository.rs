use crate::models::{NewUser, UserAccount, UserListFilter, UserSummary};
use crate::session::Role;
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A unique constraint (username or email) rejected the write.
    #[error("duplicate account")]
    Duplicate,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    /// Lifts unique-constraint violations out of the generic database error.
    fn from_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            return RepositoryError::Duplicate;
        }
        RepositoryError::Database(e)
    }
}

/// UserRepository
///
/// The persistence contract for portal accounts. Handlers only ever see this
/// trait, so tests swap in hand-written mocks and production uses Postgres.
///
/// **Send + Sync + async_trait** make `Arc<dyn UserRepository>` shareable
/// across Axum's task boundaries.
#[async_trait]
pub trait UserRepository: Send + Sync {
    // --- Authentication ---
    // Looks an account up by username OR email.
    async fn find_by_login(&self, login: &str) -> Result<Option<UserAccount>, RepositoryError>;
    // True when either the username or the email is already taken.
    async fn exists(&self, username: &str, email: &str) -> Result<bool, RepositoryError>;
    // Fails with `Duplicate` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<UserAccount, RepositoryError>;
    async fn touch_last_login(&self, id: i32) -> Result<(), RepositoryError>;

    // --- User management ---
    // Newest first.
    async fn list_users(&self, filter: &UserListFilter) -> Result<Vec<UserSummary>, RepositoryError>;
    // Returns the stored role, or None when no such user exists.
    async fn update_role(&self, id: i32, role: Role) -> Result<Option<Role>, RepositoryError>;
    // Returns false when no such user exists.
    async fn delete_user(&self, id: i32) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the app state.
pub type RepositoryState = Arc<dyn UserRepository>;

const ACCOUNT_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, role, is_active";

/// PostgresRepository
///
/// `UserRepository` backed by the `superadmin_users` table.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM superadmin_users \
             WHERE username = $1 OR email = $1 LIMIT 1"
        );
        let account = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn exists(&self, username: &str, email: &str) -> Result<bool, RepositoryError> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM superadmin_users WHERE username = $1 OR email = $2 LIMIT 1",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// create_user
    ///
    /// Inserts a new account. `is_active`, `created_at` and `updated_at` take
    /// their column defaults.
    async fn create_user(&self, user: NewUser) -> Result<UserAccount, RepositoryError> {
        let sql = format!(
            "INSERT INTO superadmin_users \
               (username, email, first_name, last_name, password_hash, role, phone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let account = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(&user.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from_write)?;
        Ok(account)
    }

    async fn touch_last_login(&self, id: i32) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE superadmin_users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// list_users
    ///
    /// Builds the listing with QueryBuilder so every user-supplied value is a
    /// bound parameter. The search term is an ILIKE substring match across
    /// the four name fields.
    async fn list_users(&self, filter: &UserListFilter) -> Result<Vec<UserSummary>, RepositoryError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            r#"
            SELECT
                id, username, first_name, last_name, email, phone,
                role, is_active, last_login_at, created_at
            FROM superadmin_users
            WHERE 1 = 1
            "#,
        );

        if let Some(role) = filter.role {
            builder.push(" AND role = ");
            builder.push_bind(role);
        }

        if let Some(term) = &filter.search {
            let pattern = format!("%{}%", escape_like(term));
            builder.push(" AND (first_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR last_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR email ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR username ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        let users = builder
            .build_query_as::<UserSummary>()
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// update_role
    ///
    /// `updated_at` is maintained by a table trigger.
    async fn update_role(&self, id: i32, role: Role) -> Result<Option<Role>, RepositoryError> {
        let stored: Option<Role> = sqlx::query_scalar(
            "UPDATE superadmin_users SET role = $1 WHERE id = $2 RETURNING role",
        )
        .bind(role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn delete_user(&self, id: i32) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM superadmin_users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escapes LIKE metacharacters so a search for `50%` means the literal text.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
