//! Client notifications.
//!
//! Dispatch is fire-and-forget: a dispatcher never reports failure to the
//! caller, so a broken messaging channel cannot undo or block a committed
//! business operation. The production channel is WhatsApp; this crate ships a
//! dispatcher that writes the rendered message to the log.

use crate::config::settings::NotificationSettings;
use chrono::{DateTime, Utc};
use tracing::info;

/// A message addressed to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An appointment was cancelled because its barber left
    AppointmentCancelled {
        /// Client phone number
        phone: String,
        /// Client name
        client_name: String,
        /// Original appointment date
        date: DateTime<Utc>,
    },
    /// An appointment moved to another barber
    BarberReassigned {
        /// Client phone number
        phone: String,
        /// Client name
        client_name: String,
        /// Appointment date
        date: DateTime<Utc>,
        /// Name of the barber now attending
        new_barber_name: String,
    },
    /// A subscription moved to another barber
    SubscriptionReassigned {
        /// Client phone number
        phone: String,
        /// Client name
        client_name: String,
        /// Package name, when the subscription had one
        package_name: Option<String>,
        /// Name of the barber now attending
        new_barber_name: String,
    },
    /// A subscription was cancelled
    SubscriptionCancelled {
        /// Client phone number
        phone: String,
        /// Client name
        client_name: String,
        /// Package name, when the subscription had one
        package_name: Option<String>,
    },
}

impl Notification {
    /// Phone number the message goes to.
    #[must_use]
    pub fn recipient(&self) -> &str {
        match self {
            Self::AppointmentCancelled { phone, .. }
            | Self::BarberReassigned { phone, .. }
            | Self::SubscriptionReassigned { phone, .. }
            | Self::SubscriptionCancelled { phone, .. } => phone,
        }
    }

    /// Renders the message body, signed with the shop name.
    #[must_use]
    pub fn render(&self, shop_name: &str) -> String {
        match self {
            Self::AppointmentCancelled {
                client_name, date, ..
            } => format!(
                "Olá {client_name}, seu horário de {} foi cancelado. Entre em contato para remarcar. - {shop_name}",
                date.format("%d/%m/%Y %H:%M")
            ),
            Self::BarberReassigned {
                client_name,
                date,
                new_barber_name,
                ..
            } => format!(
                "Olá {client_name}, seu horário de {} agora será com {new_barber_name}. - {shop_name}",
                date.format("%d/%m/%Y %H:%M")
            ),
            Self::SubscriptionReassigned {
                client_name,
                package_name,
                new_barber_name,
                ..
            } => format!(
                "Olá {client_name}, sua assinatura{} agora será atendida por {new_barber_name}. - {shop_name}",
                package_name
                    .as_deref()
                    .map(|package| format!(" do {package}"))
                    .unwrap_or_default()
            ),
            Self::SubscriptionCancelled {
                client_name,
                package_name,
                ..
            } => match package_name {
                Some(package) => format!(
                    "Olá {client_name}, sua assinatura do {package} foi cancelada. - {shop_name}"
                ),
                None => format!("Olá {client_name}, sua assinatura foi cancelada. - {shop_name}"),
            },
        }
    }
}

/// Sends notifications without reporting back.
pub trait NotificationDispatcher: Send + Sync {
    /// Hands the notification to the channel. Failures are logged, never returned.
    fn dispatch(&self, notification: Notification);
}

/// Writes every rendered notification to the log.
#[derive(Debug, Clone)]
pub struct LogDispatcher {
    shop_name: String,
}

impl LogDispatcher {
    /// Creates a dispatcher signing messages with `shop_name`.
    #[must_use]
    pub fn new(shop_name: impl Into<String>) -> Self {
        Self {
            shop_name: shop_name.into(),
        }
    }
}

impl NotificationDispatcher for LogDispatcher {
    fn dispatch(&self, notification: Notification) {
        info!(
            to = notification.recipient(),
            message = %notification.render(&self.shop_name),
            "Notification dispatched"
        );
    }
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl NotificationDispatcher for NoopDispatcher {
    fn dispatch(&self, _notification: Notification) {}
}

/// Builds the dispatcher described by the `[notifications]` settings.
#[must_use]
pub fn dispatcher_from_settings(settings: &NotificationSettings) -> Box<dyn NotificationDispatcher> {
    if settings.enabled {
        Box::new(LogDispatcher::new(settings.shop_name.clone()))
    } else {
        Box::new(NoopDispatcher)
    }
}


#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_cancelled_appointment() {
        let date = Utc.with_ymd_and_hms(2026, 3, 14, 15, 30, 0).unwrap();
        let message = Notification::AppointmentCancelled {
            phone: "+5511999990000".to_string(),
            client_name: "João".to_string(),
            date,
        }
        .render("Barbearia Central");

        assert!(message.contains("João"));
        assert!(message.contains("14/03/2026 15:30"));
        assert!(message.ends_with("- Barbearia Central"));
    }

    #[test]
    fn test_render_reassignment_mentions_new_barber() {
        let date = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let notification = Notification::BarberReassigned {
            phone: "+5511988887777".to_string(),
            client_name: "Ana".to_string(),
            date,
            new_barber_name: "Carlos".to_string(),
        };

        assert_eq!(notification.recipient(), "+5511988887777");
        assert!(notification.render("X").contains("com Carlos"));
    }

    #[test]
    fn test_render_subscription_without_package() {
        let message = Notification::SubscriptionCancelled {
            phone: "1".to_string(),
            client_name: "Rui".to_string(),
            package_name: None,
        }
        .render("X");
        assert_eq!(message, "Olá Rui, sua assinatura foi cancelada. - X");
    }

    #[test]
    fn test_dispatcher_from_settings_disabled_is_silent() {
        let settings = NotificationSettings {
            enabled: false,
            shop_name: "X".to_string(),
        };
        // Dispatching through a disabled dispatcher must not panic
        dispatcher_from_settings(&settings).dispatch(Notification::SubscriptionCancelled {
            phone: "1".to_string(),
            client_name: "Rui".to_string(),
            package_name: None,
        });
    }
}
