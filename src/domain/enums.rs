use serde::{Deserialize, Serialize};

/// How time or completion is recorded against a leaf task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingType {
    /// Direct numeric entry of minutes per day
    Manual,
    /// Minutes accumulated by the start/stop timer
    Automatic,
    /// Single completion checkmark; checking completes the task
    Unique,
    /// Repeatable checkmark, one per day, no auto-completion
    Habit,
}

impl TrackingType {
    /// Parse from the lowercase tag used on the wire and on the CLI
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "manual" => Some(Self::Manual),
            "automatic" => Some(Self::Automatic),
            "unique" => Some(Self::Unique),
            "habit" => Some(Self::Habit),
            _ => None,
        }
    }

    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
            Self::Unique => "unique",
            Self::Habit => "habit",
        }
    }

    /// Whether this type records check entries rather than time entries
    pub fn is_check_based(&self) -> bool {
        matches!(self, Self::Unique | Self::Habit)
    }
}

impl Default for TrackingType {
    fn default() -> Self {
        Self::Manual
    }
}

/// UI color scheme preference (persisted, not interpreted by the engine)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::System
    }
}

/// Clock display preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl TimeFormat {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "12h" => Some(Self::TwelveHour),
            "24h" => Some(Self::TwentyFourHour),
            _ => None,
        }
    }

    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::TwelveHour => "12h",
            Self::TwentyFourHour => "24h",
        }
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self::TwentyFourHour
    }
}
