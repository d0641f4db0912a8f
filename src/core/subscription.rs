//! Subscription ledger - client enrollment in a package over a cadence.
//!
//! Enrollment generates one SCHEDULED appointment per slot. Status moves
//! ACTIVE <-> PAUSED freely; CANCELLED and COMPLETED are terminal and nothing
//! in this crate revives them. The bulk operations used by the barber
//! lifecycle coordinator only ever touch ACTIVE or PAUSED rows.

use crate::{
    core::{appointment as appointments, catalog},
    entities::{
        Appointment, Package, Service, Subscription, appointment, client, package,
        sea_orm_active_enums::{AppointmentStatus, PlanType, SubscriptionStatus},
        service, subscription,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Months, Utc};
use sea_orm::{
    Condition, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Longest enrollment accepted, in months
pub const MAX_DURATION_MONTHS: i32 = 12;

/// Input for [`enroll`].
#[derive(Debug, Clone)]
pub struct NewSubscription {
    /// Enrolled client
    pub client_id: i64,
    /// Barber attending every slot, must be active
    pub barber_id: i64,
    /// Package enrolled in, must be active
    pub package_id: i64,
    /// Date of the first slot
    pub start_date: DateTime<Utc>,
    /// Length of the enrollment, 1 to [`MAX_DURATION_MONTHS`]
    pub duration_months: i32,
}

/// A new subscription and its generated slots, in slot order.
#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    /// The ACTIVE subscription
    pub subscription: subscription::Model,
    /// One SCHEDULED appointment per slot
    pub slots: Vec<appointment::Model>,
}

/// A subscription with what the dashboard shows next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionDetails {
    /// The subscription row
    #[serde(flatten)]
    pub subscription: subscription::Model,
    /// Owning client
    pub client: Option<client::Model>,
    /// Linked package, absent on legacy rows
    pub package: Option<package::Model>,
    /// Legacy single service, for rows not yet linked to a package
    pub service: Option<service::Model>,
}

/// Subscriptions of `barber_id` that are ACTIVE or PAUSED.
#[must_use]
pub fn live_for_barber(barber_id: i64) -> Condition {
    Condition::all()
        .add(subscription::Column::BarberId.eq(barber_id))
        .add(subscription::Column::Status.is_in(SubscriptionStatus::LIVE))
}

/// Dates of every slot of an enrollment, first slot on `start_date`.
#[must_use]
pub fn slot_dates(
    start_date: DateTime<Utc>,
    plan_type: PlanType,
    total_slots: i32,
) -> Vec<DateTime<Utc>> {
    (0..i64::from(total_slots))
        .map(|index| start_date + Duration::days(index * plan_type.interval_days()))
        .collect()
}

/// Enrolls a client in a package and generates the slot appointments.
///
/// The cadence comes from the package. `total_slots` is the duration in
/// months times 4 (weekly) or 2 (biweekly). The subscription and all slots
/// are written in one transaction.
///
/// # Errors
/// Returns:
/// - [`Error::Validation`] if the duration is outside `1..=12` months
/// - [`Error::NotFound`] if the client, the active barber or the active
///   package does not exist
pub async fn enroll(db: &DatabaseConnection, new: NewSubscription) -> Result<Enrollment> {
    if !(1..=MAX_DURATION_MONTHS).contains(&new.duration_months) {
        return Err(Error::validation(format!(
            "Subscription duration must be between 1 and {MAX_DURATION_MONTHS} months, got {}",
            new.duration_months
        )));
    }

    let end_date = u32::try_from(new.duration_months)
        .ok()
        .and_then(|months| new.start_date.checked_add_months(Months::new(months)))
        .ok_or_else(|| Error::validation("Subscription end date is out of range"))?;

    let txn = db.begin().await?;

    catalog::get_client_by_id(&txn, new.client_id)
        .await?
        .ok_or_else(|| Error::not_found("Client", new.client_id))?;
    catalog::require_active_barber(&txn, new.barber_id).await?;
    let package = Package::find_by_id(new.package_id)
        .one(&txn)
        .await?
        .filter(|package| package.is_active)
        .ok_or_else(|| Error::not_found("Package", new.package_id))?;

    let total_slots = new.duration_months * package.plan_type.slots_per_month();
    let now = Utc::now();

    let subscription = subscription::ActiveModel {
        client_id: Set(new.client_id),
        barber_id: Set(new.barber_id),
        package_id: Set(Some(package.id)),
        service_id: Set(None),
        plan_type: Set(package.plan_type),
        status: Set(SubscriptionStatus::Active),
        start_date: Set(new.start_date),
        end_date: Set(end_date),
        duration_months: Set(new.duration_months),
        total_slots: Set(total_slots),
        completed_slots: Set(0),
        paused_at: Set(None),
        cancelled_at: Set(None),
        cancellation_reason: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let slots = slot_dates(new.start_date, package.plan_type, total_slots)
        .into_iter()
        .zip(0..)
        .map(|(date, index)| appointment::ActiveModel {
            client_id: Set(new.client_id),
            barber_id: Set(new.barber_id),
            service_id: Set(None),
            date: Set(date),
            status: Set(AppointmentStatus::Scheduled),
            is_subscription_based: Set(true),
            subscription_id: Set(Some(subscription.id)),
            subscription_slot_index: Set(Some(index)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
    Appointment::insert_many(slots).exec(&txn).await?;

    let slots = Appointment::find()
        .filter(appointment::Column::SubscriptionId.eq(subscription.id))
        .order_by_asc(appointment::Column::SubscriptionSlotIndex)
        .all(&txn)
        .await?;

    txn.commit().await?;

    info!(
        subscription_id = subscription.id,
        package_id = package.id,
        total_slots,
        "Client enrolled"
    );

    Ok(Enrollment {
        subscription,
        slots,
    })
}

/// Retrieves a subscription by its ID.
pub async fn get_subscription_by_id<C>(
    db: &C,
    subscription_id: i64,
) -> Result<Option<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find_by_id(subscription_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the ACTIVE or PAUSED subscriptions of a barber with client,
/// package and legacy service attached.
pub async fn find_active_or_paused_by_barber<C>(
    db: &C,
    barber_id: i64,
) -> Result<Vec<SubscriptionDetails>>
where
    C: ConnectionTrait,
{
    let rows = Subscription::find()
        .filter(live_for_barber(barber_id))
        .find_also_related(client::Entity)
        .order_by_asc(subscription::Column::Id)
        .all(db)
        .await?;

    let package_ids: Vec<i64> = rows.iter().filter_map(|(s, _)| s.package_id).collect();
    let service_ids: Vec<i64> = rows.iter().filter_map(|(s, _)| s.service_id).collect();

    let mut packages: HashMap<i64, package::Model> = HashMap::new();
    if !package_ids.is_empty() {
        packages = Package::find()
            .filter(package::Column::Id.is_in(package_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
    }

    let mut services: HashMap<i64, service::Model> = HashMap::new();
    if !service_ids.is_empty() {
        services = Service::find()
            .filter(service::Column::Id.is_in(service_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
    }

    Ok(rows
        .into_iter()
        .map(|(subscription, client)| SubscriptionDetails {
            package: subscription
                .package_id
                .and_then(|id| packages.get(&id).cloned()),
            service: subscription
                .service_id
                .and_then(|id| services.get(&id).cloned()),
            subscription,
            client,
        })
        .collect())
}

/// Ids of the ACTIVE or PAUSED subscriptions of a barber.
pub async fn live_subscription_ids<C>(db: &C, barber_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .select_only()
        .column(subscription::Column::Id)
        .filter(live_for_barber(barber_id))
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves subscriptions to another barber. Rows that are no longer ACTIVE or
/// PAUSED are left alone. Returns the number of rows rewritten.
pub async fn reassign_barber<C>(db: &C, subscription_ids: &[i64], new_barber_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    if subscription_ids.is_empty() {
        return Ok(0);
    }

    let result = Subscription::update_many()
        .col_expr(subscription::Column::BarberId, Expr::value(new_barber_id))
        .col_expr(subscription::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(subscription::Column::Id.is_in(subscription_ids.iter().copied()))
        .filter(subscription::Column::Status.is_in(SubscriptionStatus::LIVE))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Cancels subscriptions, recording when and why. Rows that are no longer
/// ACTIVE or PAUSED are left alone. Returns the number of rows rewritten.
pub async fn cancel_all<C>(db: &C, subscription_ids: &[i64], reason: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    if subscription_ids.is_empty() {
        return Ok(0);
    }

    let now = Utc::now();
    let result = Subscription::update_many()
        .col_expr(
            subscription::Column::Status,
            Expr::value(SubscriptionStatus::Cancelled),
        )
        .col_expr(subscription::Column::CancelledAt, Expr::value(now))
        .col_expr(
            subscription::Column::CancellationReason,
            Expr::value(reason.to_string()),
        )
        .col_expr(subscription::Column::UpdatedAt, Expr::value(now))
        .filter(subscription::Column::Id.is_in(subscription_ids.iter().copied()))
        .filter(subscription::Column::Status.is_in(SubscriptionStatus::LIVE))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn load_for_transition<C>(db: &C, subscription_id: i64) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    get_subscription_by_id(db, subscription_id)
        .await?
        .ok_or_else(|| Error::not_found("Subscription", subscription_id))
}

fn invalid_transition(subscription: &subscription::Model, action: &str) -> Error {
    Error::conflict(format!(
        "Cannot {action} subscription {} in status {:?}",
        subscription.id, subscription.status
    ))
}

/// Pauses an ACTIVE subscription.
///
/// # Errors
/// Returns [`Error::NotFound`] for an unknown id and [`Error::Conflict`] if the
/// subscription is not ACTIVE.
pub async fn pause(db: &DatabaseConnection, subscription_id: i64) -> Result<subscription::Model> {
    let subscription = load_for_transition(db, subscription_id).await?;
    if subscription.status != SubscriptionStatus::Active {
        return Err(invalid_transition(&subscription, "pause"));
    }

    let now = Utc::now();
    let mut subscription: subscription::ActiveModel = subscription.into();
    subscription.status = Set(SubscriptionStatus::Paused);
    subscription.paused_at = Set(Some(now));
    subscription.updated_at = Set(now);
    subscription.update(db).await.map_err(Into::into)
}

/// Resumes a PAUSED subscription.
///
/// # Errors
/// Returns [`Error::NotFound`] for an unknown id and [`Error::Conflict`] if the
/// subscription is not PAUSED.
pub async fn resume(db: &DatabaseConnection, subscription_id: i64) -> Result<subscription::Model> {
    let subscription = load_for_transition(db, subscription_id).await?;
    if subscription.status != SubscriptionStatus::Paused {
        return Err(invalid_transition(&subscription, "resume"));
    }

    let mut subscription: subscription::ActiveModel = subscription.into();
    subscription.status = Set(SubscriptionStatus::Active);
    subscription.updated_at = Set(Utc::now());
    subscription.update(db).await.map_err(Into::into)
}

/// Cancels an ACTIVE or PAUSED subscription together with its future
/// scheduled slots.
///
/// # Errors
/// Returns [`Error::NotFound`] for an unknown id and [`Error::Conflict`] if the
/// subscription is already CANCELLED or COMPLETED.
pub async fn cancel(
    db: &DatabaseConnection,
    subscription_id: i64,
    reason: &str,
) -> Result<subscription::Model> {
    let txn = db.begin().await?;

    let subscription = load_for_transition(&txn, subscription_id).await?;
    if !subscription.status.is_live() {
        return Err(invalid_transition(&subscription, "cancel"));
    }

    let now = Utc::now();
    let slots_cancelled = appointments::cancel_future_slots(&txn, subscription_id, now).await?;

    let mut subscription: subscription::ActiveModel = subscription.into();
    subscription.status = Set(SubscriptionStatus::Cancelled);
    subscription.cancelled_at = Set(Some(now));
    subscription.cancellation_reason = Set(Some(reason.to_string()));
    subscription.updated_at = Set(now);
    let subscription = subscription.update(&txn).await?;

    txn.commit().await?;

    info!(subscription_id, slots_cancelled, "Subscription cancelled");
    Ok(subscription)
}

/// Marks a slot appointment as attended and advances its subscription.
///
/// The subscription becomes COMPLETED once every slot was attended.
///
/// # Errors
/// Returns:
/// - [`Error::NotFound`] for an unknown appointment
/// - [`Error::Validation`] if the appointment is not a subscription slot
/// - [`Error::Conflict`] if the appointment is already terminal or the
///   subscription is no longer ACTIVE or PAUSED
pub async fn record_slot_completion(
    db: &DatabaseConnection,
    appointment_id: i64,
) -> Result<subscription::Model> {
    let txn = db.begin().await?;

    let slot = Appointment::find_by_id(appointment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Appointment", appointment_id))?;

    let subscription_id = slot.subscription_id.ok_or_else(|| {
        Error::validation(format!(
            "Appointment {appointment_id} is not a subscription slot"
        ))
    })?;

    if slot.status.is_terminal() {
        return Err(Error::conflict(format!(
            "Appointment {appointment_id} is already {:?}",
            slot.status
        )));
    }

    let subscription = load_for_transition(&txn, subscription_id).await?;
    if !subscription.status.is_live() {
        return Err(invalid_transition(&subscription, "complete a slot of"));
    }

    let now = Utc::now();
    let mut slot: appointment::ActiveModel = slot.into();
    slot.status = Set(AppointmentStatus::Completed);
    slot.updated_at = Set(now);
    slot.update(&txn).await?;

    let completed_slots = subscription.completed_slots + 1;
    let finished = completed_slots >= subscription.total_slots;

    let mut subscription: subscription::ActiveModel = subscription.into();
    subscription.completed_slots = Set(completed_slots);
    if finished {
        subscription.status = Set(SubscriptionStatus::Completed);
    }
    subscription.updated_at = Set(now);
    let subscription = subscription.update(&txn).await?;

    txn.commit().await?;

    if finished {
        info!(subscription_id, "Subscription completed");
    }
    Ok(subscription)
}
