//! Shared test utilities for the barbershop admin core.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        catalog,
        package::{self, NewPackage, PackageWithServices},
    },
    entities::{
        appointment, barber, client, service, subscription,
        sea_orm_active_enums::{AppointmentStatus, PlanType, SubscriptionStatus},
    },
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test client with a placeholder phone number.
pub async fn create_test_client(db: &DatabaseConnection, name: &str) -> Result<client::Model> {
    catalog::create_client(db, name.to_string(), "+5511900000000".to_string(), None).await
}

/// Creates an active test barber without phone.
pub async fn create_test_barber(db: &DatabaseConnection, name: &str) -> Result<barber::Model> {
    catalog::create_barber(db, name.to_string(), None).await
}

/// Creates an active test service.
///
/// # Defaults
/// * `duration`: 30 minutes
pub async fn create_test_service(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
) -> Result<service::Model> {
    catalog::create_service(db, name.to_string(), Decimal::from(price), 30).await
}

/// Creates a test package of two fresh services, Corte (45) then Barba (35),
/// with a discount of 10: base 80, final 70.
pub async fn create_test_package(
    db: &DatabaseConnection,
    name: &str,
    plan_type: PlanType,
) -> Result<PackageWithServices> {
    let corte = create_test_service(db, "Corte", 45).await?;
    let barba = create_test_service(db, "Barba", 35).await?;

    package::create_package(
        db,
        NewPackage {
            name: name.to_string(),
            description: None,
            plan_type,
            service_ids: vec![corte.id, barba.id],
            discount_amount: Decimal::from(10),
        },
    )
    .await
}

/// Sets up a complete test environment with a weekly combo package.
/// Returns (db, package) for common package scenarios.
pub async fn setup_with_combo_package() -> Result<(DatabaseConnection, PackageWithServices)> {
    let db = setup_test_db().await?;
    let package = create_test_package(&db, "Combo Corte + Barba", PlanType::Weekly).await?;
    Ok((db, package))
}

/// Inserts a subscription row directly, bypassing enrollment, so tests can
/// start from any status. No slot appointments are generated.
///
/// # Defaults
/// * `plan_type`: weekly
/// * one month from now, 4 slots, none completed
pub async fn insert_test_subscription(
    db: &DatabaseConnection,
    client_id: i64,
    barber_id: i64,
    package_id: Option<i64>,
    service_id: Option<i64>,
    status: SubscriptionStatus,
) -> Result<subscription::Model> {
    let now = Utc::now();
    let subscription = subscription::ActiveModel {
        client_id: Set(client_id),
        barber_id: Set(barber_id),
        package_id: Set(package_id),
        service_id: Set(service_id),
        plan_type: Set(PlanType::Weekly),
        status: Set(status),
        start_date: Set(now),
        end_date: Set(now + Duration::days(30)),
        duration_months: Set(1),
        total_slots: Set(4),
        completed_slots: Set(0),
        paused_at: Set((status == SubscriptionStatus::Paused).then_some(now)),
        cancelled_at: Set((status == SubscriptionStatus::Cancelled).then_some(now)),
        cancellation_reason: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(subscription.insert(db).await?)
}

/// Inserts a plain (not subscription-based) appointment without service.
pub async fn insert_test_appointment(
    db: &DatabaseConnection,
    client_id: i64,
    barber_id: i64,
    date: DateTime<Utc>,
    status: AppointmentStatus,
) -> Result<appointment::Model> {
    let now = Utc::now();
    let appointment = appointment::ActiveModel {
        client_id: Set(client_id),
        barber_id: Set(barber_id),
        service_id: Set(None),
        date: Set(date),
        status: Set(status),
        is_subscription_based: Set(false),
        subscription_id: Set(None),
        subscription_slot_index: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(appointment.insert(db).await?)
}
