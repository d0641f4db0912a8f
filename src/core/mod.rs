/// Appointment queries and bulk rewrites
pub mod appointment;

/// Barber deactivation with transfer or cancellation of pending work
pub mod barber;

/// Clients, barbers and services
pub mod catalog;

/// One-shot conversion of legacy single-service subscriptions into packages
pub mod migration;

/// Bundled services priced as one plan
pub mod package;

/// Client enrollment in packages and its lifecycle
pub mod subscription;
