//! Status and cadence enums shared by several entities.
//!
//! Values are stored as upper-case strings so rows stay readable from any
//! SQL client and match the labels used by the dashboard.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurrence interval of a package and of the subscriptions enrolled in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    /// One slot every 7 days
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    /// One slot every 14 days
    #[sea_orm(string_value = "BIWEEKLY")]
    Biweekly,
}

impl PlanType {
    /// Days between two consecutive slots.
    #[must_use]
    pub const fn interval_days(self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Biweekly => 14,
        }
    }

    /// Number of slots generated per month of subscription.
    #[must_use]
    pub const fn slots_per_month(self) -> i32 {
        match self {
            Self::Weekly => 4,
            Self::Biweekly => 2,
        }
    }

    /// Portuguese label used in customer-facing package names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weekly => "Semanal",
            Self::Biweekly => "Quinzenal",
        }
    }
}

/// Lifecycle of a subscription. `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Slots are being consumed
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Temporarily on hold, still holds the barber
    #[sea_orm(string_value = "PAUSED")]
    Paused,
    /// Cancelled by the shop or the client
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    /// Every slot consumed
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

impl SubscriptionStatus {
    /// Statuses that still hold a barber's time and block package deactivation.
    pub const LIVE: [Self; 2] = [Self::Active, Self::Paused];

    /// Whether the subscription is ACTIVE or PAUSED.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

/// Lifecycle of an appointment. `Completed`, `Cancelled` and `NoShow` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    /// Booked, not started
    #[sea_orm(string_value = "SCHEDULED")]
    Scheduled,
    /// Client is in the chair
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    /// Service rendered
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// Called off before it happened
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    /// Client did not come
    #[sea_orm(string_value = "NO_SHOW")]
    NoShow,
}

impl AppointmentStatus {
    /// Statuses of appointments that still need a barber.
    pub const PENDING: [Self; 2] = [Self::Scheduled, Self::InProgress];

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_type_cadence() {
        assert_eq!(PlanType::Weekly.interval_days(), 7);
        assert_eq!(PlanType::Biweekly.interval_days(), 14);
        assert_eq!(PlanType::Weekly.slots_per_month(), 4);
        assert_eq!(PlanType::Biweekly.slots_per_month(), 2);
        assert_eq!(PlanType::Biweekly.label(), "Quinzenal");
    }

    #[test]
    fn test_status_groups() {
        assert!(SubscriptionStatus::Paused.is_live());
        assert!(!SubscriptionStatus::Cancelled.is_live());
        assert!(AppointmentStatus::NoShow.is_terminal());
        assert!(!AppointmentStatus::InProgress.is_terminal());
    }
}
