use serde::{Deserialize, Serialize};

/// Theme every user owns.
pub const DEFAULT_THEME: &str = "classic";

fn default_theme() -> String {
    DEFAULT_THEME.into()
}
fn default_notification_hour() -> u32 {
    20
}

/// User preferences stored alongside the economy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_theme")]
    pub theme_key: String,
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default = "default_notification_hour")]
    pub notification_hour: u32,
    #[serde(default)]
    pub notification_minute: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme_key: default_theme(),
            notifications_enabled: false,
            notification_hour: default_notification_hour(),
            notification_minute: 0,
        }
    }
}
