//! Package engine - bundled service offerings with snapshot pricing.
//!
//! A package stores the prices of its services at the time they were bundled:
//! `base_price` is their sum, `final_price` is `base_price - discount_amount`
//! and must not be negative. The service set is replaced as a whole, never
//! edited link by link, and every write touching the package row and its
//! links runs in one transaction.
//!
//! Changes to a package are not propagated to subscriptions already enrolled
//! in it.

use crate::{
    core::catalog,
    entities::{
        Package, PackageService, Service, Subscription, package, package_service, service,
        sea_orm_active_enums::{PlanType, SubscriptionStatus},
        subscription,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Input for [`create_package`].
#[derive(Debug, Clone)]
pub struct NewPackage {
    /// Name shown to clients
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Cadence of subscriptions sold with the package
    pub plan_type: PlanType,
    /// Services to bundle, in display order. At least one, no duplicates.
    pub service_ids: Vec<i64>,
    /// Discount subtracted from the summed service prices
    pub discount_amount: Decimal,
}

/// Partial update for [`update_package`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PackageUpdate {
    /// New name
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    /// New cadence
    pub plan_type: Option<PlanType>,
    /// Replaces the whole service set and recomputes the base price
    pub service_ids: Option<Vec<i64>>,
    /// New discount, applied to the current or recomputed base price
    pub discount_amount: Option<Decimal>,
    /// `Some(false)` deactivates, subject to the live-subscription guard
    pub is_active: Option<bool>,
}

/// Service as shown inside a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageServiceDetail {
    /// Service id
    pub id: i64,
    /// Service name
    pub name: String,
    /// Current catalog price
    pub price: Decimal,
    /// Duration in minutes
    pub duration: i32,
}

impl From<&service::Model> for PackageServiceDetail {
    fn from(service: &service::Model) -> Self {
        Self {
            id: service.id,
            name: service.name.clone(),
            price: service.price,
            duration: service.duration,
        }
    }
}

/// A package together with its services in link order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageWithServices {
    /// The package row
    #[serde(flatten)]
    pub package: package::Model,
    /// Linked services, in link order
    pub services: Vec<PackageServiceDetail>,
}

/// The three pricing columns of a package, always consistent with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    /// Sum of the service prices
    pub base_price: Decimal,
    /// Non-negative discount
    pub discount_amount: Decimal,
    /// Base minus discount, never negative
    pub final_price: Decimal,
}

impl Pricing {
    /// Derives the final price from a base price and a discount.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if the discount is negative or exceeds the base price.
    pub fn new(base_price: Decimal, discount_amount: Decimal) -> Result<Self> {
        if discount_amount < Decimal::ZERO {
            return Err(Error::validation(format!(
                "Discount cannot be negative: {discount_amount}"
            )));
        }

        let final_price = base_price - discount_amount;
        if final_price < Decimal::ZERO {
            return Err(Error::validation(format!(
                "Discount exceeds base price: discount {discount_amount} > base {base_price}"
            )));
        }

        Ok(Self {
            base_price,
            discount_amount,
            final_price,
        })
    }

    /// Sums the service prices into the base price, then applies the discount.
    pub fn from_services(services: &[service::Model], discount_amount: Decimal) -> Result<Self> {
        let base_price = services.iter().map(|s| s.price).sum();
        Self::new(base_price, discount_amount)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Package name cannot be empty"));
    }
    Ok(())
}

fn validate_service_ids(service_ids: &[i64]) -> Result<()> {
    if service_ids.is_empty() {
        return Err(Error::validation("A package needs at least one service"));
    }

    let mut seen = HashSet::with_capacity(service_ids.len());
    let duplicates: Vec<String> = service_ids
        .iter()
        .filter(|id| !seen.insert(**id))
        .map(ToString::to_string)
        .collect();
    if !duplicates.is_empty() {
        return Err(Error::validation(format!(
            "Duplicate services in package: {}",
            duplicates.join(", ")
        )));
    }

    Ok(())
}

fn validate_discount(discount_amount: Decimal) -> Result<()> {
    if discount_amount < Decimal::ZERO {
        return Err(Error::validation(format!(
            "Discount cannot be negative: {discount_amount}"
        )));
    }
    Ok(())
}

/// Loads the services for `service_ids` in the requested order.
///
/// # Errors
/// Returns [`Error::Validation`] listing every id that is unknown or inactive.
async fn resolve_active_services<C>(db: &C, service_ids: &[i64]) -> Result<Vec<service::Model>>
where
    C: ConnectionTrait,
{
    let mut found: HashMap<i64, service::Model> = catalog::find_active_services(db, service_ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    if found.len() != service_ids.len() {
        let missing: Vec<String> = service_ids
            .iter()
            .filter(|id| !found.contains_key(id))
            .map(ToString::to_string)
            .collect();
        return Err(Error::validation(format!(
            "Services not found or inactive: {}",
            missing.join(", ")
        )));
    }

    Ok(service_ids
        .iter()
        .filter_map(|id| found.remove(id))
        .collect())
}

async fn insert_links<C>(db: &C, package_id: i64, services: &[service::Model]) -> Result<()>
where
    C: ConnectionTrait,
{
    let links = services
        .iter()
        .zip(0..)
        .map(|(service, position)| package_service::ActiveModel {
            package_id: Set(package_id),
            service_id: Set(service.id),
            position: Set(position),
        });

    PackageService::insert_many(links).exec(db).await?;
    Ok(())
}

/// Inserts a package row and its links. Callers own the transaction and the
/// validation of `services`.
pub(crate) async fn insert_package<C>(
    db: &C,
    name: &str,
    description: Option<String>,
    plan_type: PlanType,
    pricing: Pricing,
    services: &[service::Model],
) -> Result<package::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let package = package::ActiveModel {
        name: Set(name.trim().to_string()),
        description: Set(description),
        plan_type: Set(plan_type),
        base_price: Set(pricing.base_price),
        discount_amount: Set(pricing.discount_amount),
        final_price: Set(pricing.final_price),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    insert_links(db, package.id, services).await?;
    Ok(package)
}

/// Loads the service details of several packages, keyed by package id, each
/// list in link order.
async fn load_service_details<C>(
    db: &C,
    package_ids: &[i64],
) -> Result<HashMap<i64, Vec<PackageServiceDetail>>>
where
    C: ConnectionTrait,
{
    if package_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = PackageService::find()
        .filter(package_service::Column::PackageId.is_in(package_ids.iter().copied()))
        .order_by_asc(package_service::Column::PackageId)
        .order_by_asc(package_service::Column::Position)
        .all(db)
        .await?;

    let service_ids: HashSet<i64> = links.iter().map(|l| l.service_id).collect();
    let services: HashMap<i64, service::Model> = Service::find()
        .filter(service::Column::Id.is_in(service_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let mut details: HashMap<i64, Vec<PackageServiceDetail>> = HashMap::new();
    for link in links {
        if let Some(service) = services.get(&link.service_id) {
            details
                .entry(link.package_id)
                .or_default()
                .push(PackageServiceDetail::from(service));
        }
    }
    Ok(details)
}

async fn hydrate<C>(db: &C, package: package::Model) -> Result<PackageWithServices>
where
    C: ConnectionTrait,
{
    let services = load_service_details(db, &[package.id])
        .await?
        .remove(&package.id)
        .unwrap_or_default();
    Ok(PackageWithServices { package, services })
}

/// Counts the subscriptions of a package that are ACTIVE or PAUSED.
pub async fn count_active_subscriptions<C>(db: &C, package_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(subscription::Column::PackageId.eq(package_id))
        .filter(subscription::Column::Status.is_in(SubscriptionStatus::LIVE))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Creates a package from a list of active services.
///
/// The base price is the sum of the current service prices and the final
/// price is the base minus the discount. The package and its links are
/// written in one transaction.
///
/// # Errors
/// Returns [`Error::Validation`] if:
/// - The name is blank
/// - `service_ids` is empty or contains duplicates
/// - Any service is unknown or inactive (all offending ids are listed)
/// - The discount is negative or exceeds the base price
pub async fn create_package(
    db: &DatabaseConnection,
    new_package: NewPackage,
) -> Result<PackageWithServices> {
    validate_name(&new_package.name)?;
    validate_service_ids(&new_package.service_ids)?;
    validate_discount(new_package.discount_amount)?;

    let txn = db.begin().await?;

    let services = resolve_active_services(&txn, &new_package.service_ids).await?;
    let pricing = Pricing::from_services(&services, new_package.discount_amount)?;

    let package = insert_package(
        &txn,
        &new_package.name,
        new_package.description,
        new_package.plan_type,
        pricing,
        &services,
    )
    .await?;

    txn.commit().await?;

    info!(
        package_id = package.id,
        base_price = %package.base_price,
        final_price = %package.final_price,
        "Package created"
    );

    Ok(PackageWithServices {
        package,
        services: services.iter().map(PackageServiceDetail::from).collect(),
    })
}

/// Lists packages newest first, optionally filtered by their active flag.
pub async fn list_packages(
    db: &DatabaseConnection,
    is_active: Option<bool>,
) -> Result<Vec<PackageWithServices>> {
    let mut query = Package::find();
    if let Some(is_active) = is_active {
        query = query.filter(package::Column::IsActive.eq(is_active));
    }

    let packages = query
        .order_by_desc(package::Column::CreatedAt)
        .order_by_desc(package::Column::Id)
        .all(db)
        .await?;

    let ids: Vec<i64> = packages.iter().map(|p| p.id).collect();
    let mut details = load_service_details(db, &ids).await?;

    Ok(packages
        .into_iter()
        .map(|package| {
            let services = details.remove(&package.id).unwrap_or_default();
            PackageWithServices { package, services }
        })
        .collect())
}

/// Retrieves one package with its services.
///
/// # Errors
/// Returns [`Error::NotFound`] if the package does not exist.
pub async fn get_package_by_id(db: &DatabaseConnection, package_id: i64) -> Result<PackageWithServices> {
    let package = Package::find_by_id(package_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Package", package_id))?;
    hydrate(db, package).await
}

/// Applies a partial update to a package.
///
/// When `service_ids` is given the link set is deleted and recreated and the
/// base price is recomputed from the current service prices; otherwise the
/// stored base price is kept. The final price is always recomputed. Turning
/// an active package inactive obeys the same guard as [`deactivate_package`].
///
/// # Errors
/// Returns:
/// - [`Error::NotFound`] if the package does not exist
/// - [`Error::Validation`] for a blank name, an invalid service set or a
///   discount that would make the final price negative
/// - [`Error::Conflict`] when deactivating a package with live subscriptions
pub async fn update_package(
    db: &DatabaseConnection,
    package_id: i64,
    update: PackageUpdate,
) -> Result<PackageWithServices> {
    if let Some(name) = &update.name {
        validate_name(name)?;
    }
    if let Some(service_ids) = &update.service_ids {
        validate_service_ids(service_ids)?;
    }
    if let Some(discount_amount) = update.discount_amount {
        validate_discount(discount_amount)?;
    }

    let txn = db.begin().await?;

    let existing = Package::find_by_id(package_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Package", package_id))?;

    let new_services = match &update.service_ids {
        Some(service_ids) => Some(resolve_active_services(&txn, service_ids).await?),
        None => None,
    };

    let discount_amount = update.discount_amount.unwrap_or(existing.discount_amount);
    let pricing = match &new_services {
        Some(services) => Pricing::from_services(services, discount_amount)?,
        None => Pricing::new(existing.base_price, discount_amount)?,
    };

    if update.is_active == Some(false) && existing.is_active {
        ensure_no_live_subscriptions(&txn, package_id).await?;
    }

    if let Some(services) = &new_services {
        PackageService::delete_many()
            .filter(package_service::Column::PackageId.eq(package_id))
            .exec(&txn)
            .await?;
        insert_links(&txn, package_id, services).await?;
    }

    let mut package: package::ActiveModel = existing.into();
    if let Some(name) = update.name {
        package.name = Set(name.trim().to_string());
    }
    if let Some(description) = update.description {
        package.description = Set(description);
    }
    if let Some(plan_type) = update.plan_type {
        package.plan_type = Set(plan_type);
    }
    if let Some(is_active) = update.is_active {
        package.is_active = Set(is_active);
    }
    package.base_price = Set(pricing.base_price);
    package.discount_amount = Set(pricing.discount_amount);
    package.final_price = Set(pricing.final_price);
    package.updated_at = Set(Utc::now());

    let package = package.update(&txn).await?;
    let hydrated = hydrate(&txn, package).await?;

    txn.commit().await?;

    info!(
        package_id,
        services_replaced = new_services.is_some(),
        final_price = %hydrated.package.final_price,
        "Package updated"
    );

    Ok(hydrated)
}

async fn ensure_no_live_subscriptions<C>(db: &C, package_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let live = count_active_subscriptions(db, package_id).await?;
    if live > 0 {
        warn!(package_id, live, "Refusing to deactivate package with live subscriptions");
        return Err(Error::conflict(format!(
            "Package {package_id} has {live} active or paused subscription(s)"
        )));
    }
    Ok(())
}

/// Soft-deactivates a package.
///
/// # Errors
/// Returns:
/// - [`Error::NotFound`] if the package does not exist
/// - [`Error::Conflict`] carrying the count when the package still has ACTIVE
///   or PAUSED subscriptions; the package is left untouched
pub async fn deactivate_package(db: &DatabaseConnection, package_id: i64) -> Result<package::Model> {
    let txn = db.begin().await?;

    let package = Package::find_by_id(package_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Package", package_id))?;

    ensure_no_live_subscriptions(&txn, package_id).await?;

    let mut package: package::ActiveModel = package.into();
    package.is_active = Set(false);
    package.updated_at = Set(Utc::now());
    let package = package.update(&txn).await?;

    txn.commit().await?;

    info!(package_id, "Package deactivated");
    Ok(package)
}
