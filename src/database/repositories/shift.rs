use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{RepositoryBinding, RepositoryHandle, RepositoryKind, TenantRepository};
use crate::database::connection::TenantConnection;
use crate::database::models::{Shift, ShiftInput, ShiftUpdate};
use crate::database::schema::SHIFT_SCHEMA;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct ShiftRepository {
    binding: RepositoryBinding,
}

impl TenantRepository for ShiftRepository {
    const KIND: RepositoryKind = RepositoryKind::Shift;

    fn bind(connection: Arc<TenantConnection>) -> Self {
        Self {
            binding: RepositoryBinding::new(connection, &SHIFT_SCHEMA),
        }
    }

    fn into_handle(self) -> RepositoryHandle {
        RepositoryHandle::Shift(self)
    }

    fn from_handle(handle: &RepositoryHandle) -> Option<Self> {
        match handle {
            RepositoryHandle::Shift(repository) => Some(repository.clone()),
            _ => None,
        }
    }
}

impl ShiftRepository {
    pub fn binding(&self) -> &RepositoryBinding {
        &self.binding
    }

    pub fn is_same_handle(&self, other: &Self) -> bool {
        self.binding.same_binding(&other.binding)
    }

    pub async fn create_shift(&self, input: ShiftInput, created_by: Uuid) -> Result<Shift, AppError> {
        let pool = self.binding.pool().await?;

        let shift = self.binding.observe(
            sqlx::query_as::<_, Shift>(
                r#"
                INSERT INTO shifts (id, date, start_time, end_time, employee_name, role, notes, created_by, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING id, date, start_time, end_time, employee_name, role, notes, created_by, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(input.date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.employee_name)
            .bind(input.role)
            .bind(input.notes.unwrap_or_default())
            .bind(created_by)
            .bind(Utc::now())
            .fetch_one(pool)
            .await,
        )?;

        Ok(shift)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>, AppError> {
        let pool = self.binding.pool().await?;

        let shift = self.binding.observe(
            sqlx::query_as::<_, Shift>(
                "SELECT id, date, start_time, end_time, employee_name, role, notes, created_by, created_at FROM shifts WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(pool)
            .await,
        )?;

        Ok(shift)
    }

    /// Shifts dated within `[start_date, end_date]`, ordered by date then start time.
    pub async fn find_by_date_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, AppError> {
        let pool = self.binding.pool().await?;

        let shifts = self.binding.observe(
            sqlx::query_as::<_, Shift>(
                r#"
                SELECT id, date, start_time, end_time, employee_name, role, notes, created_by, created_at
                FROM shifts
                WHERE date >= ? AND date <= ?
                ORDER BY date ASC, start_time ASC
                "#,
            )
            .bind(start_date)
            .bind(end_date)
            .fetch_all(pool)
            .await,
        )?;

        Ok(shifts)
    }

    /// Shifts on a single day, ordered by start time.
    pub async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Shift>, AppError> {
        self.find_by_date_range(date, date).await
    }

    pub async fn update_shift(&self, id: Uuid, update: ShiftUpdate) -> Result<Shift, AppError> {
        let pool = self.binding.pool().await?;
        let update = update.normalized();

        self.binding
            .observe(
                sqlx::query_as::<_, Shift>(
                    r#"
                    UPDATE shifts
                    SET date = COALESCE(?, date),
                        start_time = COALESCE(?, start_time),
                        end_time = COALESCE(?, end_time),
                        employee_name = COALESCE(?, employee_name),
                        role = COALESCE(?, role),
                        notes = COALESCE(?, notes)
                    WHERE id = ?
                    RETURNING id, date, start_time, end_time, employee_name, role, notes, created_by, created_at
                    "#,
                )
                .bind(update.date)
                .bind(update.start_time)
                .bind(update.end_time)
                .bind(update.employee_name)
                .bind(update.role)
                .bind(update.notes)
                .bind(id)
                .fetch_optional(pool)
                .await,
            )?
            .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))
    }

    pub async fn delete_shift(&self, id: Uuid) -> Result<(), AppError> {
        let pool = self.binding.pool().await?;

        let result = self.binding.observe(
            sqlx::query("DELETE FROM shifts WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await,
        )?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Shift not found".to_string()));
        }

        Ok(())
    }
}
