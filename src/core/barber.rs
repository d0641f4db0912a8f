//! Barber lifecycle coordinator.
//!
//! Deactivating a barber must also resolve the work still assigned to them:
//! pending appointments (SCHEDULED or IN_PROGRESS, dated now or later) and
//! live subscriptions (ACTIVE or PAUSED). The caller picks one policy for all
//! of it, transfer to another active barber or cancel, and the rewrite plus
//! the deactivation itself commit as one transaction.

use crate::{
    core::{
        appointment::{self as appointments, AppointmentDetails},
        catalog,
        subscription::{self as subscriptions, SubscriptionDetails},
    },
    entities::barber,
    errors::{Error, Result},
    notify::{Notification, NotificationDispatcher},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info};

const CANCELLATION_REASON: &str = "Barbeiro desativado";

/// How the pending work of a deactivated barber is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeactivationAction {
    /// Move everything to another active barber
    Transfer {
        /// Barber receiving the work
        target_barber_id: i64,
    },
    /// Cancel everything
    Cancel,
}

impl DeactivationAction {
    /// Builds an action from its loose form (`"transfer"` / `"cancel"` plus an
    /// optional target), as received from forms and command lines.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for an unknown action or a transfer without target.
    pub fn parse(action: &str, target_barber_id: Option<i64>) -> Result<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "transfer" => target_barber_id
                .map(|target_barber_id| Self::Transfer { target_barber_id })
                .ok_or_else(|| Error::validation("A target barber is required to transfer")),
            "cancel" => Ok(Self::Cancel),
            other => Err(Error::validation(format!(
                "Unknown deactivation action: {other}"
            ))),
        }
    }

    /// Lower-case name of the action.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::Cancel => "cancel",
        }
    }

    /// Target barber of a transfer.
    #[must_use]
    pub const fn target_barber_id(self) -> Option<i64> {
        match self {
            Self::Transfer { target_barber_id } => Some(target_barber_id),
            Self::Cancel => None,
        }
    }
}

/// Work still assigned to a barber.
#[derive(Debug, Clone, Serialize)]
pub struct PendingWork {
    /// SCHEDULED or IN_PROGRESS appointments dated now or later, soonest first
    pub appointments: Vec<AppointmentDetails>,
    /// ACTIVE or PAUSED subscriptions
    pub subscriptions: Vec<SubscriptionDetails>,
}

/// Result of [`deactivate_with_action`].
#[derive(Debug, Clone, Serialize)]
pub struct DeactivationOutcome {
    /// The barber, now inactive
    pub barber: barber::Model,
    /// Pending appointments counted before the transaction
    pub appointments_affected: u64,
    /// Subscriptions rewritten inside the transaction
    pub subscriptions_affected: u64,
    /// Policy applied
    pub action: DeactivationAction,
    /// Receiving barber, for transfers
    pub target_barber_id: Option<i64>,
}

/// Lists the pending appointments and live subscriptions of a barber.
///
/// # Errors
/// Returns [`Error::NotFound`] if the barber does not exist.
pub async fn get_pending_work(db: &DatabaseConnection, barber_id: i64) -> Result<PendingWork> {
    catalog::get_barber_by_id(db, barber_id)
        .await?
        .ok_or_else(|| Error::not_found("Barber", barber_id))?;

    let appointments = appointments::find_pending_by_barber(db, barber_id, Utc::now()).await?;
    let subscriptions = subscriptions::find_active_or_paused_by_barber(db, barber_id).await?;

    Ok(PendingWork {
        appointments,
        subscriptions,
    })
}

/// Deactivates a barber and resolves their pending work with `action`.
///
/// The affected appointments are counted first; the rewrite then selects
/// rows with the same predicate inside the transaction, together with the
/// subscription rewrite and the deactivation. The target of a transfer is
/// checked again inside the transaction so a target deactivated in between
/// aborts the whole operation. Clients are notified after the commit.
///
/// # Errors
/// Returns:
/// - [`Error::Validation`] when transferring to the barber being deactivated
/// - [`Error::NotFound`] if the barber is missing, or the transfer target is
///   missing or inactive
/// - any database error, in which case nothing was changed
pub async fn deactivate_with_action(
    db: &DatabaseConnection,
    barber_id: i64,
    action: DeactivationAction,
    notifier: &dyn NotificationDispatcher,
) -> Result<DeactivationOutcome> {
    if action.target_barber_id() == Some(barber_id) {
        return Err(Error::validation(
            "Cannot transfer work to the barber being deactivated",
        ));
    }

    let barber = catalog::get_barber_by_id(db, barber_id)
        .await?
        .ok_or_else(|| Error::not_found("Barber", barber_id))?;

    let target = match action {
        DeactivationAction::Transfer { target_barber_id } => {
            Some(catalog::require_active_barber(db, target_barber_id).await?)
        }
        DeactivationAction::Cancel => None,
    };

    let now = Utc::now();
    let pending_appointments = appointments::find_pending_by_barber(db, barber_id, now).await?;
    let live_subscriptions = subscriptions::find_active_or_paused_by_barber(db, barber_id).await?;
    let appointments_affected = pending_appointments.len() as u64;
    debug!(
        barber_id,
        appointments = appointments_affected,
        subscriptions = live_subscriptions.len(),
        "Pending work selected for deactivation"
    );

    let txn = db.begin().await?;
    let (barber, subscriptions_affected) = apply_deactivation(&txn, barber, action, now).await?;
    txn.commit().await?;

    info!(
        barber_id,
        action = action.name(),
        target_barber_id = action.target_barber_id(),
        appointments_affected,
        subscriptions_affected,
        "Barber deactivated"
    );

    notify_clients(
        notifier,
        target.as_ref(),
        &pending_appointments,
        &live_subscriptions,
    );

    Ok(DeactivationOutcome {
        barber,
        appointments_affected,
        subscriptions_affected,
        action,
        target_barber_id: action.target_barber_id(),
    })
}

/// Transactional part of [`deactivate_with_action`]. Returns the deactivated
/// barber and the number of subscriptions rewritten.
pub(crate) async fn apply_deactivation(
    txn: &DatabaseTransaction,
    barber: barber::Model,
    action: DeactivationAction,
    now: DateTime<Utc>,
) -> Result<(barber::Model, u64)> {
    let barber_id = barber.id;
    let subscription_ids = subscriptions::live_subscription_ids(txn, barber_id).await?;

    let subscriptions_affected = match action {
        DeactivationAction::Transfer { target_barber_id } => {
            catalog::require_active_barber(txn, target_barber_id).await?;
            appointments::transfer_pending(txn, barber_id, target_barber_id, now).await?;
            subscriptions::reassign_barber(txn, &subscription_ids, target_barber_id).await?
        }
        DeactivationAction::Cancel => {
            appointments::cancel_pending(txn, barber_id, now).await?;
            subscriptions::cancel_all(txn, &subscription_ids, CANCELLATION_REASON).await?
        }
    };

    let mut barber: barber::ActiveModel = barber.into();
    barber.is_active = Set(false);
    barber.updated_at = Set(Utc::now());
    let barber = barber.update(txn).await?;

    Ok((barber, subscriptions_affected))
}

fn notify_clients(
    notifier: &dyn NotificationDispatcher,
    target: Option<&barber::Model>,
    pending_appointments: &[AppointmentDetails],
    live_subscriptions: &[SubscriptionDetails],
) {
    // Subscription slots are covered by the subscription notice
    for details in pending_appointments
        .iter()
        .filter(|d| !d.appointment.is_subscription_based)
    {
        let Some(client) = &details.client else {
            continue;
        };
        let notification = match target {
            Some(target) => Notification::BarberReassigned {
                phone: client.phone.clone(),
                client_name: client.name.clone(),
                date: details.appointment.date,
                new_barber_name: target.name.clone(),
            },
            None => Notification::AppointmentCancelled {
                phone: client.phone.clone(),
                client_name: client.name.clone(),
                date: details.appointment.date,
            },
        };
        notifier.dispatch(notification);
    }

    for details in live_subscriptions {
        let Some(client) = &details.client else {
            continue;
        };
        let package_name = details.package.as_ref().map(|p| p.name.clone());
        let notification = match target {
            Some(target) => Notification::SubscriptionReassigned {
                phone: client.phone.clone(),
                client_name: client.name.clone(),
                package_name,
                new_barber_name: target.name.clone(),
            },
            None => Notification::SubscriptionCancelled {
                phone: client.phone.clone(),
                client_name: client.name.clone(),
                package_name,
            },
        };
        notifier.dispatch(notification);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{
        Appointment, AppointmentStatus, Subscription, SubscriptionStatus, appointment,
        subscription,
    };
    use crate::notify::{NoopDispatcher, testing::RecordingDispatcher};
    use crate::test_utils::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    struct Fixture {
        db: DatabaseConnection,
        barber: barber::Model,
        target: barber::Model,
        appointment_ids: Vec<i64>,
        past_appointment_id: i64,
        subscription_id: i64,
    }

    /// Barber X with two future SCHEDULED appointments, one past appointment
    /// and one ACTIVE subscription; barber Y active.
    async fn setup_fixture() -> Result<Fixture> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "João").await?;
        let barber = create_test_barber(&db, "Xavier").await?;
        let target = create_test_barber(&db, "Yuri").await?;
        let now = Utc::now();

        let mut appointment_ids = Vec::new();
        for days in [1, 5] {
            let appointment = insert_test_appointment(
                &db,
                client.id,
                barber.id,
                now + Duration::days(days),
                AppointmentStatus::Scheduled,
            )
            .await?;
            appointment_ids.push(appointment.id);
        }
        let past = insert_test_appointment(
            &db,
            client.id,
            barber.id,
            now - Duration::days(3),
            AppointmentStatus::Completed,
        )
        .await?;

        let package =
            create_test_package(&db, "Combo", crate::entities::PlanType::Weekly).await?;
        let subscription = insert_test_subscription(
            &db,
            client.id,
            barber.id,
            Some(package.package.id),
            None,
            SubscriptionStatus::Active,
        )
        .await?;

        Ok(Fixture {
            db,
            barber,
            target,
            appointment_ids,
            past_appointment_id: past.id,
            subscription_id: subscription.id,
        })
    }

    async fn load_appointment(db: &DatabaseConnection, id: i64) -> Result<appointment::Model> {
        Ok(Appointment::find_by_id(id).one(db).await?.unwrap())
    }

    async fn load_subscription(db: &DatabaseConnection, id: i64) -> Result<subscription::Model> {
        Ok(Subscription::find_by_id(id).one(db).await?.unwrap())
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            DeactivationAction::parse("transfer", Some(4)).unwrap(),
            DeactivationAction::Transfer {
                target_barber_id: 4
            }
        );
        assert_eq!(
            DeactivationAction::parse(" CANCEL ", None).unwrap(),
            DeactivationAction::Cancel
        );
        assert!(matches!(
            DeactivationAction::parse("transfer", None),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            DeactivationAction::parse("archive", None),
            Err(Error::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_self_transfer_is_always_rejected() -> Result<()> {
        // No query results configured: the check must happen before any lookup
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = deactivate_with_action(
            &db,
            5,
            DeactivationAction::Transfer {
                target_barber_id: 5,
            },
            &NoopDispatcher,
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_policy() -> Result<()> {
        let fx = setup_fixture().await?;
        let notifier = RecordingDispatcher::default();

        let outcome =
            deactivate_with_action(&fx.db, fx.barber.id, DeactivationAction::Cancel, &notifier)
                .await?;

        assert_eq!(outcome.appointments_affected, 2);
        assert_eq!(outcome.subscriptions_affected, 1);
        assert_eq!(outcome.target_barber_id, None);
        assert!(!outcome.barber.is_active);

        for id in &fx.appointment_ids {
            let appointment = load_appointment(&fx.db, *id).await?;
            assert_eq!(appointment.status, AppointmentStatus::Cancelled);
        }
        let past = load_appointment(&fx.db, fx.past_appointment_id).await?;
        assert_eq!(past.status, AppointmentStatus::Completed);

        let subscription = load_subscription(&fx.db, fx.subscription_id).await?;
        assert_eq!(subscription.status, SubscriptionStatus::Cancelled);
        assert!(subscription.cancelled_at.is_some());
        assert_eq!(
            subscription.cancellation_reason.as_deref(),
            Some(CANCELLATION_REASON)
        );

        // Two appointment notices and one subscription notice
        let sent = notifier.sent();
        assert_eq!(sent.len(), 3);
        assert!(matches!(sent[2], Notification::SubscriptionCancelled { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_policy() -> Result<()> {
        let fx = setup_fixture().await?;
        let notifier = RecordingDispatcher::default();

        let outcome = deactivate_with_action(
            &fx.db,
            fx.barber.id,
            DeactivationAction::Transfer {
                target_barber_id: fx.target.id,
            },
            &notifier,
        )
        .await?;

        assert_eq!(outcome.appointments_affected, 2);
        assert_eq!(outcome.subscriptions_affected, 1);
        assert_eq!(outcome.target_barber_id, Some(fx.target.id));
        assert!(!outcome.barber.is_active);

        for id in &fx.appointment_ids {
            let appointment = load_appointment(&fx.db, *id).await?;
            assert_eq!(appointment.barber_id, fx.target.id);
            assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        }
        // History stays with the original barber
        let past = load_appointment(&fx.db, fx.past_appointment_id).await?;
        assert_eq!(past.barber_id, fx.barber.id);

        let subscription = load_subscription(&fx.db, fx.subscription_id).await?;
        assert_eq!(subscription.barber_id, fx.target.id);
        assert_eq!(subscription.status, SubscriptionStatus::Active);

        assert!(notifier.sent().iter().all(|n| matches!(
            n,
            Notification::BarberReassigned { .. } | Notification::SubscriptionReassigned { .. }
        )));

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_to_inactive_target_changes_nothing() -> Result<()> {
        let fx = setup_fixture().await?;
        let mut target: barber::ActiveModel = fx.target.clone().into();
        target.is_active = Set(false);
        target.update(&fx.db).await?;

        let result = deactivate_with_action(
            &fx.db,
            fx.barber.id,
            DeactivationAction::Transfer {
                target_barber_id: fx.target.id,
            },
            &NoopDispatcher,
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let barber = catalog::get_barber_by_id(&fx.db, fx.barber.id).await?.unwrap();
        assert!(barber.is_active);
        let appointment = load_appointment(&fx.db, fx.appointment_ids[0]).await?;
        assert_eq!(appointment.barber_id, fx.barber.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_barbers() -> Result<()> {
        let fx = setup_fixture().await?;

        let result =
            deactivate_with_action(&fx.db, 999, DeactivationAction::Cancel, &NoopDispatcher).await;
        assert!(matches!(result, Err(Error::NotFound { id: 999, .. })));

        let result = deactivate_with_action(
            &fx.db,
            fx.barber.id,
            DeactivationAction::Transfer {
                target_barber_id: 998,
            },
            &NoopDispatcher,
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { id: 998, .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_uncommitted_deactivation_leaves_no_trace() -> Result<()> {
        let fx = setup_fixture().await?;

        let txn = fx.db.begin().await?;
        let (barber, subscriptions_affected) = apply_deactivation(
            &txn,
            fx.barber.clone(),
            DeactivationAction::Cancel,
            Utc::now(),
        )
        .await?;
        assert!(!barber.is_active);
        assert_eq!(subscriptions_affected, 1);
        // Abandon the unit of work as an error would
        txn.rollback().await?;

        let barber = catalog::get_barber_by_id(&fx.db, fx.barber.id).await?.unwrap();
        assert!(barber.is_active);
        for id in &fx.appointment_ids {
            let appointment = load_appointment(&fx.db, *id).await?;
            assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        }
        let subscription = load_subscription(&fx.db, fx.subscription_id).await?;
        assert_eq!(subscription.status, SubscriptionStatus::Active);

        Ok(())
    }

    #[tokio::test]
    async fn test_in_transaction_target_check_aborts_all_writes() -> Result<()> {
        let fx = setup_fixture().await?;

        // Target deactivated after the outer checks: the in-transaction check catches it
        let mut target: barber::ActiveModel = fx.target.clone().into();
        target.is_active = Set(false);
        target.update(&fx.db).await?;

        let txn = fx.db.begin().await?;
        let result = apply_deactivation(
            &txn,
            fx.barber.clone(),
            DeactivationAction::Transfer {
                target_barber_id: fx.target.id,
            },
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        drop(txn);

        let barber = catalog::get_barber_by_id(&fx.db, fx.barber.id).await?.unwrap();
        assert!(barber.is_active);
        let subscription = load_subscription(&fx.db, fx.subscription_id).await?;
        assert_eq!(subscription.barber_id, fx.barber.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_second_deactivation_finds_nothing_left() -> Result<()> {
        let fx = setup_fixture().await?;
        deactivate_with_action(&fx.db, fx.barber.id, DeactivationAction::Cancel, &NoopDispatcher)
            .await?;

        let outcome =
            deactivate_with_action(&fx.db, fx.barber.id, DeactivationAction::Cancel, &NoopDispatcher)
                .await?;
        assert_eq!(outcome.appointments_affected, 0);
        assert_eq!(outcome.subscriptions_affected, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_pending_work() -> Result<()> {
        let fx = setup_fixture().await?;

        let work = get_pending_work(&fx.db, fx.barber.id).await?;
        assert_eq!(work.appointments.len(), 2);
        assert_eq!(work.subscriptions.len(), 1);
        assert_eq!(work.subscriptions[0].subscription.id, fx.subscription_id);

        let result = get_pending_work(&fx.db, 999).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }
}
