use log::trace;
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewPayment, Payment, PaymentId, PaymentMetadata, PaymentStatus},
    payment_objects::PaymentQueryFilter,
    traits::StoreError,
};

/// Inserts a new payment in `pending` status. Fails with `PaymentAlreadyExists` if the payment id is taken.
pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, StoreError> {
    let payment_id = payment.payment_id.clone();
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (payment_id, amount, currency, vendor_id, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payment.payment_id)
    .bind(payment.amount)
    .bind(payment.currency)
    .bind(payment.vendor_id)
    .bind(Json(payment.metadata))
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => StoreError::PaymentAlreadyExists(payment_id),
        _ => StoreError::from(e),
    })?;
    Ok(payment)
}

pub async fn fetch_payment(payment_id: &PaymentId, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE payment_id = $1").bind(payment_id.as_str()).fetch_optional(conn).await
}

/// Fetches payments according to the criteria in the `PaymentQueryFilter`, oldest first.
pub async fn search_payments(
    query: PaymentQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM payments ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(vendor_id) = query.vendor_id {
        where_clause.push("vendor_id = ");
        where_clause.push_bind_unseparated(vendor_id);
    }
    if let Some(currency) = query.currency {
        where_clause.push("currency = ");
        where_clause.push_bind_unseparated(currency);
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Payment>().fetch_all(conn).await
}

/// Sets the status of the payment, provided it currently has status `from`. Returns `None` if the payment does not
/// exist or has a different status.
pub async fn update_status(
    payment_id: &PaymentId,
    from: PaymentStatus,
    to: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE payment_id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(to.to_string())
    .bind(payment_id.as_str())
    .bind(from.to_string())
    .fetch_optional(conn)
    .await
}

pub async fn update_metadata(
    payment_id: &PaymentId,
    metadata: &PaymentMetadata,
    conn: &mut SqliteConnection,
) -> Result<Payment, StoreError> {
    let payment: Option<Payment> = sqlx::query_as(
        "UPDATE payments SET metadata = $1, updated_at = CURRENT_TIMESTAMP WHERE payment_id = $2 RETURNING *",
    )
    .bind(Json(metadata))
    .bind(payment_id.as_str())
    .fetch_optional(conn)
    .await?;
    payment.ok_or_else(|| StoreError::PaymentNotFound(payment_id.clone()))
}

/// Completed or approved payments whose vendor has not been paid, oldest first.
pub async fn fetch_payable_payments(conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM payments
            WHERE status IN ('completed', 'approved')
            AND COALESCE(json_extract(metadata, '$.vendorB2CPayment.status'), '') <> 'completed'
            ORDER BY id ASC;
        "#,
    )
    .fetch_all(conn)
    .await
}
