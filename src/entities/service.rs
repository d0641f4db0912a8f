//! Service entity - A priced, timed unit of work (haircut, beard trim...).
//!
//! Packages snapshot the price of their services when they are computed, so
//! later price edits here do not touch existing packages.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Service database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    /// Unique identifier for the service
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the service (e.g., "Corte", "Barba")
    pub name: String,
    /// Current price, never negative
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Duration in minutes, always positive
    pub duration: i32,
    /// Inactive services cannot be added to packages
    pub is_active: bool,
    /// When the service was created
    pub created_at: DateTimeUtc,
    /// When the service was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Service and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Links to the packages bundling this service
    #[sea_orm(has_many = "super::package_service::Entity")]
    PackageServices,
    /// Links to the appointments that rendered this service
    #[sea_orm(has_many = "super::appointment_service::Entity")]
    AppointmentServices,
}

impl Related<super::package_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackageServices.def()
    }
}

impl Related<super::appointment_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppointmentServices.def()
    }
}

impl Related<super::package::Entity> for Entity {
    fn to() -> RelationDef {
        super::package_service::Relation::Package.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::package_service::Relation::Service.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
