//! Barber entity - A professional who attends appointments.
//!
//! Barbers are never deleted. Deactivation flips `is_active` and keeps every
//! past record pointing at the barber.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Barber database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "barbers")]
pub struct Model {
    /// Unique identifier for the barber
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional contact phone
    pub phone: Option<String>,
    /// Lifecycle flag - inactive barbers receive no new work
    pub is_active: bool,
    /// When the barber was created
    pub created_at: DateTimeUtc,
    /// When the barber was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Barber and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One barber attends many appointments
    #[sea_orm(has_many = "super::appointment::Entity")]
    Appointments,
    /// One barber serves many subscriptions
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscriptions,
}

impl Related<super::appointment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointments.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
