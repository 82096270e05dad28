use log::trace;
use sqlx::{types::Json, PgConnection, QueryBuilder};

use crate::{
    db_types::{NewPayment, Payment, PaymentId, PaymentMetadata, PaymentStatus},
    payment_objects::PaymentQueryFilter,
    traits::StoreError,
};

pub async fn insert_payment(payment: NewPayment, conn: &mut PgConnection) -> Result<Payment, StoreError> {
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

pub async fn fetch_payment(payment_id: &PaymentId, conn: &mut PgConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE payment_id = $1").bind(payment_id.as_str()).fetch_optional(conn).await
}

/// Fetches the payment and locks its row until the end of the transaction.
pub async fn fetch_payment_for_update(
    payment_id: &PaymentId,
    conn: &mut PgConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE payment_id = $1 FOR UPDATE")
        .bind(payment_id.as_str())
        .fetch_optional(conn)
        .await
}

pub async fn search_payments(query: PaymentQueryFilter, conn: &mut PgConnection) -> Result<Vec<Payment>, sqlx::Error> {
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
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
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

pub async fn update_status(
    payment_id: &PaymentId,
    from: PaymentStatus,
    to: PaymentStatus,
    conn: &mut PgConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments SET status = $1, updated_at = NOW()
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
    conn: &mut PgConnection,
) -> Result<Payment, StoreError> {
    let payment: Option<Payment> =
        sqlx::query_as("UPDATE payments SET metadata = $1, updated_at = NOW() WHERE payment_id = $2 RETURNING *")
            .bind(Json(metadata))
            .bind(payment_id.as_str())
            .fetch_optional(conn)
            .await?;
    payment.ok_or_else(|| StoreError::PaymentNotFound(payment_id.clone()))
}

pub async fn fetch_payable_payments(conn: &mut PgConnection) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM payments
            WHERE status IN ('completed', 'approved')
            AND COALESCE(metadata->'vendorB2CPayment'->>'status', '') <> 'completed'
            ORDER BY id ASC;
        "#,
    )
    .fetch_all(conn)
    .await
}
