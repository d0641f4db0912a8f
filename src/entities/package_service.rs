//! Package/service link. The composite key makes a duplicate service inside
//! one package impossible; `position` keeps the order chosen by the user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Package-service link model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_services")]
pub struct Model {
    /// Package side of the link
    #[sea_orm(primary_key, auto_increment = false)]
    pub package_id: i64,
    /// Service side of the link
    #[sea_orm(primary_key, auto_increment = false)]
    pub service_id: i64,
    /// Zero-based position of the service inside the package
    pub position: i32,
}

/// Defines relationships between the link and its two sides
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one package
    #[sea_orm(
        belongs_to = "super::package::Entity",
        from = "Column::PackageId",
        to = "super::package::Column::Id"
    )]
    Package,
    /// Each link belongs to one service
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id"
    )]
    Service,
}

impl Related<super::package::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Package.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
