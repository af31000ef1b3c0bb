use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_COLOR: &str = "#007AFF";

/// Colors offered by the activity editor.
pub const COLOR_OPTIONS: [&str; 10] = [
    "#007AFF", "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8",
    "#F7DC6F", "#BB8FCE",
];

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").expect("valid color regex"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub ratio: u32,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl Activity {
    /// Builds an activity with a freshly generated id.
    pub fn new(name: impl Into<String>, ratio: u32, color: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            ratio,
            color: color.into(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.validate_fields()?;
        self.validate_color()
    }

    /// Name and ratio checks, without the color token.
    pub fn validate_fields(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid_activity("活动名称不能为空"));
        }
        if self.ratio == 0 {
            return Err(AppError::invalid_activity("活动比例必须大于 0"));
        }
        Ok(())
    }

    pub fn validate_color(&self) -> AppResult<()> {
        if !is_valid_color(&self.color) {
            return Err(AppError::invalid_activity(format!(
                "颜色格式无效: {}",
                self.color
            )));
        }
        Ok(())
    }
}

pub fn is_valid_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    pub activity_name: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(activity_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            activity_name: activity_name.into(),
            timestamp,
        }
    }
}

/// Per-activity breakdown derived from the current log set.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCount {
    pub activity: Activity,
    pub count: usize,
    pub target_count: usize,
    pub percentage: f64,
    pub is_on_target: bool,
    pub deficit: usize,
}

impl ActivityCount {
    pub fn new(activity: Activity, count: usize, target_count: usize, percentage: f64) -> Self {
        Self {
            activity,
            count,
            target_count,
            percentage,
            is_on_target: count >= target_count,
            deficit: target_count.saturating_sub(count),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOverview {
    pub counts: Vec<ActivityCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested: Option<Activity>,
    pub total_logs: usize,
    /// True when there is at least one activity and none of them is behind.
    pub balanced: bool,
}

/// A log entry as shown in the history list, tinted with its activity color.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogRow {
    #[serde(flatten)]
    pub log: ActivityLog,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct ActivityDraft {
    pub name: String,
    pub ratio: u32,
    pub color: Option<String>,
}

impl ActivityDraft {
    pub fn into_activity(self) -> Activity {
        Activity::new(
            self.name.trim(),
            self.ratio,
            self.color.unwrap_or_else(default_color),
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct ActivityUpdateInput {
    pub name: Option<String>,
    pub ratio: Option<u32>,
    pub color: Option<String>,
}

impl ActivityUpdateInput {
    pub fn apply_to(self, activity: &Activity) -> Activity {
        let mut updated = activity.clone();
        if let Some(name) = self.name {
            updated.name = name.trim().to_string();
        }
        if let Some(ratio) = self.ratio {
            updated.ratio = ratio;
        }
        if let Some(color) = self.color {
            updated.color = color;
        }
        updated
    }
}

/// Activities installed on first launch when nothing has been stored yet.
pub fn default_activities() -> Vec<Activity> {
    vec![
        Activity::new("Gaming", 1, "#FF6B6B"),
        Activity::new("Music Making", 2, "#4ECDC4"),
        Activity::new("Quality Time", 3, "#45B7D1"),
    ]
}
