//! Appointment entity - One visit of a client to a barber.
//!
//! Subscription slots have `is_subscription_based = true`, no `service_id`
//! (their services come from the subscription's package) and a slot index.

use super::sea_orm_active_enums::AppointmentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Appointment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    /// Unique identifier for the appointment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Client being attended
    pub client_id: i64,
    /// Barber attending
    pub barber_id: i64,
    /// Single booked service, `None` for subscription slots
    pub service_id: Option<i64>,
    /// Scheduled date and time
    pub date: DateTimeUtc,
    /// Current lifecycle status
    pub status: AppointmentStatus,
    /// Whether this appointment was generated from a subscription
    pub is_subscription_based: bool,
    /// Generating subscription, if any
    pub subscription_id: Option<i64>,
    /// Zero-based slot index inside the generating subscription
    pub subscription_slot_index: Option<i32>,
    /// When the appointment was created
    pub created_at: DateTimeUtc,
    /// When the appointment was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Appointment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each appointment belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// Each appointment is attended by one barber
    #[sea_orm(
        belongs_to = "super::barber::Entity",
        from = "Column::BarberId",
        to = "super::barber::Column::Id"
    )]
    Barber,
    /// Slot appointments belong to their subscription
    #[sea_orm(
        belongs_to = "super::subscription::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription::Column::Id"
    )]
    Subscription,
    /// Services rendered (non-subscription appointments)
    #[sea_orm(has_many = "super::appointment_service::Entity")]
    AppointmentServices,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::barber::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Barber.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl Related<super::appointment_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppointmentServices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
