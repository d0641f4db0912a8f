//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::config::settings::Settings;
use crate::entities::{
    Appointment, AppointmentService, Barber, Client, Package, PackageService, Service,
    Subscription,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/barbershop.sqlite?mode=rwc";

/// Resolves the database URL.
///
/// `DATABASE_URL` in the environment wins, then `[database].url` from the
/// settings file, then a local `SQLite` file.
#[must_use]
pub fn get_database_url(settings: &Settings) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| settings.database.url.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database resolved by [`get_database_url`].
pub async fn create_connection(settings: &Settings) -> Result<DatabaseConnection> {
    let database_url = get_database_url(settings);
    info!("Connecting to database at {}", database_url);

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions, skipping those that already exist.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Referenced tables first so foreign keys resolve on strict backends
    let mut statements = vec![
        schema.create_table_from_entity(Client),
        schema.create_table_from_entity(Barber),
        schema.create_table_from_entity(Service),
        schema.create_table_from_entity(Package),
        schema.create_table_from_entity(PackageService),
        schema.create_table_from_entity(Subscription),
        schema.create_table_from_entity(Appointment),
        schema.create_table_from_entity(AppointmentService),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        AppointmentModel, AppointmentServiceModel, BarberModel, ClientModel, PackageModel,
        PackageServiceModel, ServiceModel, SubscriptionModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ClientModel> = Client::find().limit(1).all(&db).await?;
        let _: Vec<BarberModel> = Barber::find().limit(1).all(&db).await?;
        let _: Vec<ServiceModel> = Service::find().limit(1).all(&db).await?;
        let _: Vec<PackageModel> = Package::find().limit(1).all(&db).await?;
        let _: Vec<PackageServiceModel> = PackageService::find().limit(1).all(&db).await?;
        let _: Vec<SubscriptionModel> = Subscription::find().limit(1).all(&db).await?;
        let _: Vec<AppointmentModel> = Appointment::find().limit(1).all(&db).await?;
        let _: Vec<AppointmentServiceModel> =
            AppointmentService::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_get_database_url_prefers_settings_over_default() {
        let settings: Settings = toml::from_str(
            r#"
            [database]
            url = "sqlite://custom.sqlite"
            "#,
        )
        .unwrap_or_default();

        let url = get_database_url(&settings);
        // DATABASE_URL may be exported in the environment running the tests
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(url, "sqlite://custom.sqlite");
        }
    }
}
