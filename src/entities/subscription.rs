//! Subscription entity - A client's enrollment in a package with one barber.
//!
//! Legacy rows (created before packages existed) carry `service_id` and no
//! `package_id` until the legacy migration links them to a package.

use super::sea_orm_active_enums::{PlanType, SubscriptionStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Unique identifier for the subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning client
    pub client_id: i64,
    /// Barber serving every slot
    pub barber_id: i64,
    /// Package enrolled in; `None` only for unmigrated legacy rows
    pub package_id: Option<i64>,
    /// Legacy single-service reference
    pub service_id: Option<i64>,
    /// Slot cadence
    pub plan_type: PlanType,
    /// Current lifecycle status
    pub status: SubscriptionStatus,
    /// First slot date
    pub start_date: DateTimeUtc,
    /// Date after which no slot is generated
    pub end_date: DateTimeUtc,
    /// Length of the enrollment in months
    pub duration_months: i32,
    /// Number of slots generated for the whole enrollment
    pub total_slots: i32,
    /// Number of slots already attended
    pub completed_slots: i32,
    /// When the subscription was last paused
    pub paused_at: Option<DateTimeUtc>,
    /// When the subscription was cancelled
    pub cancelled_at: Option<DateTimeUtc>,
    /// Why the subscription was cancelled
    pub cancellation_reason: Option<String>,
    /// When the subscription was created
    pub created_at: DateTimeUtc,
    /// When the subscription was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Subscription and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subscription belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// Each subscription is served by one barber
    #[sea_orm(
        belongs_to = "super::barber::Entity",
        from = "Column::BarberId",
        to = "super::barber::Column::Id"
    )]
    Barber,
    /// Lookup only, the subscription does not own the package
    #[sea_orm(
        belongs_to = "super::package::Entity",
        from = "Column::PackageId",
        to = "super::package::Column::Id"
    )]
    Package,
    /// Legacy single service, before packages
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id"
    )]
    Service,
    /// Generated slots
    #[sea_orm(has_many = "super::appointment::Entity")]
    Appointments,
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

impl Related<super::package::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Package.def()
    }
}

impl Related<super::appointment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
