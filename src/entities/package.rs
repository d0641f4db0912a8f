//! Package entity - A named bundle of services sold under one recurring price.
//!
//! `final_price` is always `base_price - discount_amount` and never negative.
//! The pricing columns are written together by the package engine only.

use super::sea_orm_active_enums::PlanType;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Package database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "packages")]
pub struct Model {
    /// Unique identifier for the package
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown to clients
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Cadence of the subscriptions sold with this package
    pub plan_type: PlanType,
    /// Sum of the bundled service prices at computation time
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub base_price: Decimal,
    /// Discount subtracted from the base price
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub discount_amount: Decimal,
    /// Price charged per cycle
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub final_price: Decimal,
    /// Soft-delete flag; packages are never removed
    pub is_active: bool,
    /// When the package was created
    pub created_at: DateTimeUtc,
    /// When the package was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Package and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Ordered links to the bundled services
    #[sea_orm(has_many = "super::package_service::Entity")]
    PackageServices,
    /// Subscriptions enrolled in this package
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscriptions,
}

impl Related<super::package_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackageServices.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        super::package_service::Relation::Service.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::package_service::Relation::Package.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
