//! Catalog business logic - clients, barbers and services.
//!
//! These are plain records the package engine, the subscription ledger and the
//! barber lifecycle coordinator look up. Only the operations those modules
//! and the admin tooling need are provided here.

use crate::{
    entities::{Barber, Client, Service, barber, client, service},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Registers a new client.
///
/// # Errors
/// Returns an error if the name or phone is blank, or the insert fails.
pub async fn create_client(
    db: &DatabaseConnection,
    name: String,
    phone: String,
    email: Option<String>,
) -> Result<client::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("Client name cannot be empty"));
    }
    if phone.trim().is_empty() {
        return Err(Error::validation("Client phone cannot be empty"));
    }

    let client = client::ActiveModel {
        name: Set(name.trim().to_string()),
        phone: Set(phone.trim().to_string()),
        email: Set(email),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    client.insert(db).await.map_err(Into::into)
}

/// Retrieves a client by its ID.
pub async fn get_client_by_id<C>(db: &C, client_id: i64) -> Result<Option<client::Model>>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id).one(db).await.map_err(Into::into)
}

/// Registers a new, active barber.
///
/// # Errors
/// Returns an error if the name is blank or the insert fails.
pub async fn create_barber(
    db: &DatabaseConnection,
    name: String,
    phone: Option<String>,
) -> Result<barber::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("Barber name cannot be empty"));
    }

    let now = Utc::now();
    let barber = barber::ActiveModel {
        name: Set(name.trim().to_string()),
        phone: Set(phone),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    barber.insert(db).await.map_err(Into::into)
}

/// Retrieves a barber by its ID, active or not.
pub async fn get_barber_by_id<C>(db: &C, barber_id: i64) -> Result<Option<barber::Model>>
where
    C: ConnectionTrait,
{
    Barber::find_by_id(barber_id).one(db).await.map_err(Into::into)
}

/// Loads a barber that must exist and be active.
///
/// # Errors
/// Returns [`Error::NotFound`] when the barber is missing or inactive.
pub async fn require_active_barber<C>(db: &C, barber_id: i64) -> Result<barber::Model>
where
    C: ConnectionTrait,
{
    get_barber_by_id(db, barber_id)
        .await?
        .filter(|barber| barber.is_active)
        .ok_or_else(|| Error::not_found("Barber", barber_id))
}

/// Retrieves every active barber, ordered by name.
pub async fn get_active_barbers(db: &DatabaseConnection) -> Result<Vec<barber::Model>> {
    Barber::find()
        .filter(barber::Column::IsActive.eq(true))
        .order_by_asc(barber::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a new, active service.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is negative
/// - The duration is not positive
/// - The database insert operation fails
pub async fn create_service(
    db: &DatabaseConnection,
    name: String,
    price: Decimal,
    duration: i32,
) -> Result<service::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("Service name cannot be empty"));
    }
    if price < Decimal::ZERO {
        return Err(Error::validation(format!(
            "Service price cannot be negative: {price}"
        )));
    }
    if duration <= 0 {
        return Err(Error::validation(format!(
            "Service duration must be positive: {duration}"
        )));
    }

    let now = Utc::now();
    let service = service::ActiveModel {
        name: Set(name.trim().to_string()),
        price: Set(price),
        duration: Set(duration),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    service.insert(db).await.map_err(Into::into)
}

/// Retrieves a service by its ID.
pub async fn get_service_by_id<C>(db: &C, service_id: i64) -> Result<Option<service::Model>>
where
    C: ConnectionTrait,
{
    Service::find_by_id(service_id).one(db).await.map_err(Into::into)
}

/// Changes the price of a service. Existing packages keep the price they were computed with.
///
/// # Errors
/// Returns an error if the price is negative, the service does not exist, or the update fails.
pub async fn update_service_price(
    db: &DatabaseConnection,
    service_id: i64,
    new_price: Decimal,
) -> Result<service::Model> {
    if new_price < Decimal::ZERO {
        return Err(Error::validation(format!(
            "Service price cannot be negative: {new_price}"
        )));
    }

    let mut service: service::ActiveModel = get_service_by_id(db, service_id)
        .await?
        .ok_or_else(|| Error::not_found("Service", service_id))?
        .into();

    service.price = Set(new_price);
    service.updated_at = Set(Utc::now());
    service.update(db).await.map_err(Into::into)
}

/// Marks a service inactive so it can no longer be bundled.
///
/// # Errors
/// Returns an error if the service does not exist or the update fails.
pub async fn deactivate_service(db: &DatabaseConnection, service_id: i64) -> Result<service::Model> {
    let mut service: service::ActiveModel = get_service_by_id(db, service_id)
        .await?
        .ok_or_else(|| Error::not_found("Service", service_id))?
        .into();

    service.is_active = Set(false);
    service.updated_at = Set(Utc::now());
    service.update(db).await.map_err(Into::into)
}

/// Retrieves the active services among `service_ids`, in no particular order.
/// Ids that are unknown or inactive are simply absent from the result.
pub async fn find_active_services<C>(db: &C, service_ids: &[i64]) -> Result<Vec<service::Model>>
where
    C: ConnectionTrait,
{
    Service::find()
        .filter(service::Column::Id.is_in(service_ids.iter().copied()))
        .filter(service::Column::IsActive.eq(true))
        .all(db)
        .await
        .map_err(Into::into)
}
