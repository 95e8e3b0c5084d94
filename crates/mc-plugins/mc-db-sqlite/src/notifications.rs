use async_trait::async_trait;
use chrono::Utc;
use mc_core::error::Result;
use mc_core::models::Notification;
use mc_core::traits::NotificationStore;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{db_err, write_err, SqliteCatalog};

fn notification_from_row(row: &SqliteRow) -> sqlx::Result<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        recipient_id: row.try_get("recipient_id")?,
        message: row.try_get("message")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl NotificationStore for SqliteCatalog {
    async fn create_notification(&self, recipient_id: Uuid, message: String) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, message, is_read, created_at) \
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(id)
        .bind(recipient_id)
        .bind(message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(write_err("notification"))?;
        Ok(id)
    }

    async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        sqlx::query(
            "SELECT id, recipient_id, message, is_read, created_at FROM notifications \
             WHERE recipient_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(notification_from_row)
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(db_err)
    }

    async fn mark_notification_read(&self, id: Uuid, recipient_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?")
                .bind(id)
                .bind(recipient_id)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
