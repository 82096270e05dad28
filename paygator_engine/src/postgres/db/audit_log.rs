use sqlx::PgConnection;

use crate::db_types::{AuditAction, AuditLogEntry, PaymentId};

pub async fn insert_entry(
    payment_id: Option<&PaymentId>,
    action: AuditAction,
    message: &str,
    conn: &mut PgConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO audit_log (payment_id, action, message) VALUES ($1, $2, $3)")
        .bind(payment_id.map(PaymentId::as_str))
        .bind(action.to_string())
        .bind(message)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_entries(limit: i64, conn: &mut PgConnection) -> Result<Vec<AuditLogEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM audit_log ORDER BY id DESC LIMIT $1").bind(limit).fetch_all(conn).await
}
