//! Legacy migration reconciler.
//!
//! Before packages existed a subscription pointed at a single service and an
//! appointment carried a single `service_id`. This one-shot batch job moves
//! that data into the package shape: every legacy (service, plan type) pair
//! gets a single-service package, its subscriptions are linked to it, and every
//! appointment gets its `appointment_services` row. Each step commits on its
//! own, so re-running after a failure picks up where the last run stopped.

use crate::{
    core::{
        catalog,
        package::{Pricing, insert_package},
    },
    entities::{
        Appointment, AppointmentService, Package, Subscription, appointment, appointment_service,
        package, package_service, sea_orm_active_enums::PlanType, service, subscription,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    Condition, PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Description stamped on every package this job creates. Reuse lookups match on it.
pub const MIGRATION_DESCRIPTION: &str = "Pacote gerado automaticamente na migração de assinaturas";

/// Counts reported by [`run_legacy_migration`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    /// Packages generated in this run
    pub packages_created: u64,
    /// Pairs matched to a package generated by an earlier run
    pub packages_reused: u64,
    /// Legacy subscriptions linked to a package
    pub subscriptions_migrated: u64,
    /// Legacy subscriptions still without a package, zero on success
    pub subscriptions_pending: u64,
    /// Appointment service links backfilled
    pub appointment_services_created: u64,
}

/// Name given to the package generated for a service and cadence.
#[must_use]
pub fn legacy_package_name(service_name: &str, plan_type: PlanType) -> String {
    format!("Pacote {service_name} - {}", plan_type.label())
}

/// Runs every migration step and returns what it did.
///
/// # Errors
/// Returns the first error met. Steps finished before it stay committed.
pub async fn run_legacy_migration(db: &DatabaseConnection) -> Result<MigrationSummary> {
    let mut summary = MigrationSummary::default();

    let pairs = find_legacy_pairs(db).await?;
    info!(pairs = pairs.len(), "Legacy service/plan combinations found");

    for (service_id, plan_type) in pairs {
        let (package, created) = migrate_pair(db, service_id, plan_type).await?;
        if created {
            summary.packages_created += 1;
        } else {
            summary.packages_reused += 1;
        }
        summary.subscriptions_migrated += link_subscriptions(db, service_id, plan_type, package.id)
            .await?;
    }

    summary.appointment_services_created = backfill_appointment_services(db).await?;
    summary.subscriptions_pending = count_pending_subscriptions(db).await?;

    if summary.subscriptions_pending > 0 {
        warn!(
            pending = summary.subscriptions_pending,
            "Legacy subscriptions left without a package"
        );
    }
    info!(
        packages_created = summary.packages_created,
        packages_reused = summary.packages_reused,
        subscriptions_migrated = summary.subscriptions_migrated,
        subscriptions_pending = summary.subscriptions_pending,
        appointment_services_created = summary.appointment_services_created,
        "Legacy migration finished"
    );

    Ok(summary)
}

fn legacy_condition() -> Condition {
    Condition::all()
        .add(subscription::Column::ServiceId.is_not_null())
        .add(subscription::Column::PackageId.is_null())
}

/// Distinct (service, plan type) pairs among subscriptions not yet linked to a package.
async fn find_legacy_pairs<C>(db: &C) -> Result<Vec<(i64, PlanType)>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .select_only()
        .column(subscription::Column::ServiceId)
        .column(subscription::Column::PlanType)
        .filter(legacy_condition())
        .distinct()
        .order_by_asc(subscription::Column::ServiceId)
        .order_by_asc(subscription::Column::PlanType)
        .into_tuple::<(i64, PlanType)>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds or creates the package for one pair. The flag is `true` when created.
async fn migrate_pair(
    db: &DatabaseConnection,
    service_id: i64,
    plan_type: PlanType,
) -> Result<(package::Model, bool)> {
    let txn = db.begin().await?;

    // Retired services still back their legacy subscriptions
    let service: service::Model = catalog::get_service_by_id(&txn, service_id)
        .await?
        .ok_or_else(|| Error::not_found("Service", service_id))?;
    let name = legacy_package_name(&service.name, plan_type);

    // Service names are not unique, so match on the linked service too
    let existing = Package::find()
        .inner_join(package_service::Entity)
        .filter(package_service::Column::ServiceId.eq(service_id))
        .filter(package::Column::Name.eq(name.as_str()))
        .filter(package::Column::PlanType.eq(plan_type))
        .filter(package::Column::Description.eq(MIGRATION_DESCRIPTION))
        .order_by_asc(package::Column::Id)
        .one(&txn)
        .await?;

    if let Some(package) = existing {
        debug!(package_id = package.id, %name, "Reusing migrated package");
        return Ok((package, false));
    }

    let pricing = Pricing::new(service.price, Decimal::ZERO)?;
    let package = insert_package(
        &txn,
        &name,
        Some(MIGRATION_DESCRIPTION.to_string()),
        plan_type,
        pricing,
        std::slice::from_ref(&service),
    )
    .await?;
    txn.commit().await?;

    info!(package_id = package.id, %name, "Migrated package created");
    Ok((package, true))
}

async fn link_subscriptions<C>(
    db: &C,
    service_id: i64,
    plan_type: PlanType,
    package_id: i64,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Subscription::update_many()
        .col_expr(subscription::Column::PackageId, Expr::value(package_id))
        .col_expr(subscription::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(legacy_condition())
        .filter(subscription::Column::ServiceId.eq(service_id))
        .filter(subscription::Column::PlanType.eq(plan_type))
        .exec(db)
        .await?;

    debug!(
        service_id,
        package_id,
        migrated = result.rows_affected,
        "Legacy subscriptions linked"
    );
    Ok(result.rows_affected)
}

/// Gives every appointment with a `service_id` its link row, skipping those
/// already present.
async fn backfill_appointment_services(db: &DatabaseConnection) -> Result<u64> {
    let txn = db.begin().await?;

    let candidates: Vec<(i64, i64)> = Appointment::find()
        .select_only()
        .column(appointment::Column::Id)
        .column(appointment::Column::ServiceId)
        .filter(appointment::Column::ServiceId.is_not_null())
        .order_by_asc(appointment::Column::Id)
        .into_tuple()
        .all(&txn)
        .await?;

    let existing: HashSet<(i64, i64)> = AppointmentService::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|link| (link.appointment_id, link.service_id))
        .collect();

    let missing: Vec<appointment_service::ActiveModel> = candidates
        .into_iter()
        .filter(|pair| !existing.contains(pair))
        .map(|(appointment_id, service_id)| appointment_service::ActiveModel {
            appointment_id: Set(appointment_id),
            service_id: Set(service_id),
        })
        .collect();

    let created = missing.len() as u64;
    if !missing.is_empty() {
        AppointmentService::insert_many(missing).exec(&txn).await?;
    }
    txn.commit().await?;

    debug!(created, "Appointment service links backfilled");
    Ok(created)
}

async fn count_pending_subscriptions<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(legacy_condition())
        .count(db)
        .await
        .map_err(Into::into)
}
