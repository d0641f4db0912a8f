//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod appointment;
pub mod appointment_service;
pub mod barber;
pub mod client;
pub mod package;
pub mod package_service;
pub mod sea_orm_active_enums;
pub mod service;
pub mod subscription;

// Re-export specific types to avoid conflicts
pub use appointment::{
    Column as AppointmentColumn, Entity as Appointment, Model as AppointmentModel,
};
pub use appointment_service::{
    Column as AppointmentServiceColumn, Entity as AppointmentService,
    Model as AppointmentServiceModel,
};
pub use barber::{Column as BarberColumn, Entity as Barber, Model as BarberModel};
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use package::{Column as PackageColumn, Entity as Package, Model as PackageModel};
pub use package_service::{
    Column as PackageServiceColumn, Entity as PackageService, Model as PackageServiceModel,
};
pub use sea_orm_active_enums::{AppointmentStatus, PlanType, SubscriptionStatus};
pub use service::{Column as ServiceColumn, Entity as Service, Model as ServiceModel};
pub use subscription::{
    Column as SubscriptionColumn, Entity as Subscription, Model as SubscriptionModel,
};
