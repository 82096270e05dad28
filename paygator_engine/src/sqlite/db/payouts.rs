use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewVendorPayout, PaymentId, PayoutStatus, VendorPayout},
    payment_objects::PayoutQueryFilter,
    traits::StoreError,
};

/// Takes the payout claim for the payment. There can be at most one claim per payment; an existing claim is only
/// taken over if its attempt failed.
///
/// This should be the first statement of the claiming transaction, so that the write lock is held from the start.
pub async fn take_claim(payment_id: &PaymentId, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let claimed: Option<String> = sqlx::query_scalar(
        r#"
            INSERT INTO payout_claims (payment_id, status) VALUES ($1, 'processing')
            ON CONFLICT (payment_id) DO UPDATE SET status = 'processing', payout_id = NULL, updated_at = CURRENT_TIMESTAMP
            WHERE payout_claims.status = 'failed'
            RETURNING payment_id;
        "#,
    )
    .bind(payment_id.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    if claimed.is_some() {
        trace!("🗃️ Payout claim for {payment_id} taken");
        return Ok(());
    }
    let status: String = sqlx::query_scalar("SELECT status FROM payout_claims WHERE payment_id = $1")
        .bind(payment_id.as_str())
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Payout claim for {payment_id} refused. The current claim is {status}");
    match status.parse::<PayoutStatus>() {
        Ok(PayoutStatus::Completed) => Err(StoreError::PayoutAlreadyCompleted(payment_id.clone())),
        _ => Err(StoreError::PayoutInProgress(payment_id.clone())),
    }
}

/// Links the claim to the payout row that holds it.
pub async fn attach_claim(payment_id: &PaymentId, payout_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payout_claims SET payout_id = $1 WHERE payment_id = $2")
        .bind(payout_id)
        .bind(payment_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn release_claim(
    payment_id: &PaymentId,
    status: PayoutStatus,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payout_claims SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE payment_id = $2")
        .bind(status.to_string())
        .bind(payment_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn insert_payout(payout: &NewVendorPayout, conn: &mut SqliteConnection) -> Result<VendorPayout, sqlx::Error> {
    let split = &payout.split;
    sqlx::query_as(
        r#"
            INSERT INTO vendor_payouts (
                payment_id,
                vendor_id,
                total_amount,
                vendor_share_pct,
                system_commission_pct,
                system_commission_amount,
                vendor_amount,
                vendor_phone,
                reference,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *;
        "#,
    )
    .bind(payout.payment_id.as_str())
    .bind(payout.vendor_id.as_deref())
    .bind(split.total_amount)
    .bind(split.vendor_share.to_string())
    .bind(split.system_commission.to_string())
    .bind(split.system_commission_amount)
    .bind(split.vendor_amount)
    .bind(payout.vendor_phone.as_str())
    .bind(payout.reference.as_str())
    .bind(payout.initiated_at)
    .fetch_one(conn)
    .await
}

/// Moves a `processing` payout to its final status. Returns `None` if the payout does not exist or is already final.
pub async fn finalize_payout(
    payout_id: i64,
    status: PayoutStatus,
    transaction_id: Option<&str>,
    error_message: Option<&str>,
    paid_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Option<VendorPayout>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE vendor_payouts SET
                status = $1,
                b2c_transaction_id = $2,
                error_message = $3,
                paid_at = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5 AND status = 'processing'
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(transaction_id)
    .bind(error_message)
    .bind(paid_at)
    .bind(payout_id)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_payout(payout_id: i64, conn: &mut SqliteConnection) -> Result<Option<VendorPayout>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM vendor_payouts WHERE id = $1").bind(payout_id).fetch_optional(conn).await
}

pub async fn search_payouts(
    query: PayoutQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<VendorPayout>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM vendor_payouts ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(payment_id) = query.payment_id {
        where_clause.push("payment_id = ");
        where_clause.push_bind_unseparated(payment_id.0);
    }
    if let Some(vendor_id) = query.vendor_id {
        where_clause.push("vendor_id = ");
        where_clause.push_bind_unseparated(vendor_id);
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
    builder.build_query_as::<VendorPayout>().fetch_all(conn).await
}
