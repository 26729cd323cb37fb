//! User repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use super::{write_error, DuplicateKey};
use crate::models::{User, UserRole};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// Lookup by normalized (lowercase) email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self) -> Result<Vec<User>>;
    /// Replace a stored user; `None` when the id is unknown
    async fn update(&self, user: &User) -> Result<Option<User>>;
    /// Hard delete; `false` when the id is unknown
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count(&self) -> Result<usize>;
    async fn count_admins(&self) -> Result<usize>;
}

pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_USER: &str =
    "SELECT id, email, password_hash, role, is_active, created_at, updated_at FROM users";

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                DuplicateKey::new("email", &user.email),
                "Failed to create user",
            )
        })?;

        Ok(user.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user")?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_USER))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by email")?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at ASC", SELECT_USER))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;
        rows.iter().map(row_to_user).collect()
    }

    async fn update(&self, user: &User) -> Result<Option<User>> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, password_hash = ?, role = ?, is_active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.is_active)
        .bind(user.updated_at)
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                DuplicateKey::new("email", &user.email),
                "Failed to update user",
            )
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(user.id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;
        Ok(row.get::<i64, _>("count") as usize)
    }

    async fn count_admins(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users WHERE role = ?")
            .bind(UserRole::Admin.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count admins")?;
        Ok(row.get::<i64, _>("count") as usize)
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    Ok(User {
        id: Uuid::parse_str(&id).context("Invalid user id in database")?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: role.parse()?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
