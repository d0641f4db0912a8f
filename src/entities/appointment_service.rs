//! Appointment/service link - the services actually rendered in a
//! non-subscription appointment. Backfilled by the legacy migration.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Appointment-service link model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointment_services")]
pub struct Model {
    /// Appointment side of the link
    #[sea_orm(primary_key, auto_increment = false)]
    pub appointment_id: i64,
    /// Service rendered in the appointment
    #[sea_orm(primary_key, auto_increment = false)]
    pub service_id: i64,
}

/// Defines relationships between the link and its two sides
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one appointment
    #[sea_orm(
        belongs_to = "super::appointment::Entity",
        from = "Column::AppointmentId",
        to = "super::appointment::Column::Id"
    )]
    Appointment,
    /// Each link belongs to one service
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id"
    )]
    Service,
}

impl Related<super::appointment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointment.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
