//! Appointment queries and bulk rewrites.
//!
//! The barber lifecycle coordinator counts pending appointments before it
//! opens its transaction and rewrites them inside it. Both sides go through
//! [`pending_for_barber`] so they always select the same rows.

use crate::{
    core::catalog,
    entities::{
        Appointment, AppointmentService, appointment, appointment_service, client,
        sea_orm_active_enums::AppointmentStatus,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Serialize;

/// An appointment with its client, for display and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentDetails {
    /// The appointment row
    #[serde(flatten)]
    pub appointment: appointment::Model,
    /// Client booked in it
    pub client: Option<client::Model>,
}

/// Appointments of `barber_id` still needing a barber: SCHEDULED or
/// IN_PROGRESS and dated at or after `now`.
#[must_use]
pub fn pending_for_barber(barber_id: i64, now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(appointment::Column::BarberId.eq(barber_id))
        .add(appointment::Column::Status.is_in(AppointmentStatus::PENDING))
        .add(appointment::Column::Date.gte(now))
}

/// Books a single-service appointment and records the service link.
///
/// # Errors
/// Returns [`Error::NotFound`] if the client, the (active) barber or the service
/// does not exist, or a database error.
pub async fn book_appointment(
    db: &DatabaseConnection,
    client_id: i64,
    barber_id: i64,
    service_id: i64,
    date: DateTime<Utc>,
) -> Result<appointment::Model> {
    let txn = db.begin().await?;

    catalog::get_client_by_id(&txn, client_id)
        .await?
        .ok_or_else(|| Error::not_found("Client", client_id))?;
    catalog::require_active_barber(&txn, barber_id).await?;
    catalog::get_service_by_id(&txn, service_id)
        .await?
        .filter(|service| service.is_active)
        .ok_or_else(|| Error::not_found("Service", service_id))?;

    let now = Utc::now();
    let appointment = appointment::ActiveModel {
        client_id: Set(client_id),
        barber_id: Set(barber_id),
        service_id: Set(Some(service_id)),
        date: Set(date),
        status: Set(AppointmentStatus::Scheduled),
        is_subscription_based: Set(false),
        subscription_id: Set(None),
        subscription_slot_index: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    appointment_service::ActiveModel {
        appointment_id: Set(appointment.id),
        service_id: Set(service_id),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(appointment)
}

/// Retrieves the pending appointments of a barber with their clients, soonest first.
pub async fn find_pending_by_barber<C>(
    db: &C,
    barber_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<AppointmentDetails>>
where
    C: ConnectionTrait,
{
    let rows = Appointment::find()
        .filter(pending_for_barber(barber_id, now))
        .find_also_related(client::Entity)
        .order_by_asc(appointment::Column::Date)
        .order_by_asc(appointment::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(appointment, client)| AppointmentDetails {
            appointment,
            client,
        })
        .collect())
}

/// Moves every pending appointment of `barber_id` to `target_barber_id`.
/// Returns the number of rows rewritten.
pub async fn transfer_pending<C>(
    db: &C,
    barber_id: i64,
    target_barber_id: i64,
    now: DateTime<Utc>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Appointment::update_many()
        .col_expr(appointment::Column::BarberId, Expr::value(target_barber_id))
        .col_expr(appointment::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(pending_for_barber(barber_id, now))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Cancels every pending appointment of `barber_id`. Returns the number of rows rewritten.
pub async fn cancel_pending<C>(db: &C, barber_id: i64, now: DateTime<Utc>) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Appointment::update_many()
        .col_expr(
            appointment::Column::Status,
            Expr::value(AppointmentStatus::Cancelled),
        )
        .col_expr(appointment::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(pending_for_barber(barber_id, now))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Cancels the still-scheduled future slots of a subscription.
pub async fn cancel_future_slots<C>(
    db: &C,
    subscription_id: i64,
    now: DateTime<Utc>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Appointment::update_many()
        .col_expr(
            appointment::Column::Status,
            Expr::value(AppointmentStatus::Cancelled),
        )
        .col_expr(appointment::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(appointment::Column::SubscriptionId.eq(subscription_id))
        .filter(appointment::Column::Status.eq(AppointmentStatus::Scheduled))
        .filter(appointment::Column::Date.gte(now))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Lists the services rendered in an appointment.
pub async fn get_appointment_service_ids<C>(db: &C, appointment_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Ok(AppointmentService::find()
        .filter(appointment_service::Column::AppointmentId.eq(appointment_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.service_id)
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_book_appointment_records_service_link() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "João").await?;
        let barber = create_test_barber(&db, "Carlos").await?;
        let corte = create_test_service(&db, "Corte", 45).await?;

        let appointment = book_appointment(
            &db,
            client.id,
            barber.id,
            corte.id,
            Utc::now() + Duration::days(1),
        )
        .await?;

        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert!(!appointment.is_subscription_based);
        assert_eq!(
            get_appointment_service_ids(&db, appointment.id).await?,
            vec![corte.id]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_book_appointment_unknown_client() -> Result<()> {
        let db = setup_test_db().await?;
        let barber = create_test_barber(&db, "Carlos").await?;
        let corte = create_test_service(&db, "Corte", 45).await?;

        let result = book_appointment(&db, 999, barber.id, corte.id, Utc::now()).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "Client",
                id: 999
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_pending_selection_excludes_past_and_terminal() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "João").await?;
        let barber = create_test_barber(&db, "Carlos").await?;
        let other = create_test_barber(&db, "Pedro").await?;
        let now = Utc::now();

        let future = insert_test_appointment(
            &db,
            client.id,
            barber.id,
            now + Duration::days(2),
            AppointmentStatus::Scheduled,
        )
        .await?;
        let in_progress = insert_test_appointment(
            &db,
            client.id,
            barber.id,
            now + Duration::hours(1),
            AppointmentStatus::InProgress,
        )
        .await?;
        insert_test_appointment(
            &db,
            client.id,
            barber.id,
            now - Duration::days(2),
            AppointmentStatus::Scheduled,
        )
        .await?;
        insert_test_appointment(
            &db,
            client.id,
            barber.id,
            now + Duration::days(3),
            AppointmentStatus::Completed,
        )
        .await?;
        insert_test_appointment(
            &db,
            client.id,
            other.id,
            now + Duration::days(3),
            AppointmentStatus::Scheduled,
        )
        .await?;

        let pending = find_pending_by_barber(&db, barber.id, now).await?;
        let ids: Vec<i64> = pending.iter().map(|d| d.appointment.id).collect();
        assert_eq!(ids, vec![in_progress.id, future.id]);
        assert_eq!(pending[0].client.as_ref().unwrap().name, "João");

        // The bulk rewrite selects exactly the same rows
        assert_eq!(cancel_pending(&db, barber.id, now).await?, 2);
        assert!(find_pending_by_barber(&db, barber.id, now).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_pending_moves_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "João").await?;
        let barber = create_test_barber(&db, "Carlos").await?;
        let target = create_test_barber(&db, "Pedro").await?;
        let now = Utc::now();

        insert_test_appointment(
            &db,
            client.id,
            barber.id,
            now + Duration::days(1),
            AppointmentStatus::Scheduled,
        )
        .await?;

        assert_eq!(transfer_pending(&db, barber.id, target.id, now).await?, 1);
        assert_eq!(find_pending_by_barber(&db, target.id, now).await?.len(), 1);

        Ok(())
    }
}
