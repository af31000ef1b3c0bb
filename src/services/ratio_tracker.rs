use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::activity::{
    Activity, ActivityCount, ActivityLog, ActivityOverview, LogRow, DEFAULT_COLOR,
};

pub const DEFAULT_RECENT_LOGS_LIMIT: usize = 50;

/// In-memory model over the activity list and the log history.
///
/// Logs reference activities by name, not id: renaming an activity leaves its
/// earlier logs pointing at the old name, and they stop counting toward it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioTracker {
    activities: Vec<Activity>,
    logs: Vec<ActivityLog>,
}

impl RatioTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(activities: Vec<Activity>, logs: Vec<ActivityLog>) -> Self {
        Self { activities, logs }
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn logs(&self) -> &[ActivityLog] {
        &self.logs
    }

    pub fn add_activity(&mut self, activity: Activity) -> AppResult<()> {
        activity.validate()?;
        debug!(target: "app::tracker", activity_id = %activity.id, name = %activity.name, "activity added");
        self.activities.push(activity);
        Ok(())
    }

    /// The color token is only checked when it changes, so stored activities
    /// with a legacy color can still be renamed or reweighted.
    pub fn update_activity(&mut self, activity: Activity) -> AppResult<()> {
        activity.validate_fields()?;
        let slot = self
            .activities
            .iter_mut()
            .find(|existing| existing.id == activity.id)
            .ok_or_else(AppError::not_found)?;
        if slot.color != activity.color {
            activity.validate_color()?;
        }
        *slot = activity;
        Ok(())
    }

    /// Removes the activity and every log recorded under its name.
    pub fn remove_activity(&mut self, id: &str) -> AppResult<(Activity, usize)> {
        let index = self
            .activities
            .iter()
            .position(|activity| activity.id == id)
            .ok_or_else(AppError::not_found)?;
        let removed = self.activities.remove(index);

        let before = self.logs.len();
        self.logs.retain(|log| log.activity_name != removed.name);
        let logs_removed = before - self.logs.len();

        debug!(
            target: "app::tracker",
            activity_id = %removed.id,
            logs_removed,
            "activity removed"
        );
        Ok((removed, logs_removed))
    }

    /// Records one occurrence now. The name is not checked against the
    /// activity list; unknown names simply never show up in any count.
    pub fn log_activity(&mut self, name: &str) -> ActivityLog {
        self.log_activity_at(name, Utc::now())
    }

    pub fn log_activity_at(&mut self, name: &str, timestamp: DateTime<Utc>) -> ActivityLog {
        let log = ActivityLog::new(name, timestamp);
        self.logs.push(log.clone());
        log
    }

    pub fn remove_log(&mut self, id: &str) -> AppResult<ActivityLog> {
        let index = self
            .logs
            .iter()
            .position(|log| log.id == id)
            .ok_or_else(AppError::not_found)?;
        Ok(self.logs.remove(index))
    }

    pub fn purge_all_logs(&mut self) -> usize {
        let count = self.logs.len();
        self.logs.clear();
        count
    }

    pub fn activity_counts(&self) -> Vec<ActivityCount> {
        let total_ratio: u64 = self
            .activities
            .iter()
            .map(|activity| u64::from(activity.ratio))
            .sum();
        let total_logs = self.logs.len();

        self.activities
            .iter()
            .map(|activity| {
                let count = self
                    .logs
                    .iter()
                    .filter(|log| log.activity_name == activity.name)
                    .count();
                let target_count = target_count(total_logs, activity.ratio, total_ratio);
                let percentage = if total_logs == 0 {
                    0.0
                } else {
                    count as f64 / total_logs as f64 * 100.0
                };
                ActivityCount::new(activity.clone(), count, target_count, percentage)
            })
            .collect()
    }

    /// The activity furthest behind its target, earliest in list order on ties.
    /// `None` when there are no activities or nobody is behind.
    pub fn suggested_activity(&self) -> Option<Activity> {
        most_deficient(self.activity_counts())
    }

    pub fn overview(&self) -> ActivityOverview {
        let counts = self.activity_counts();
        let balanced = !counts.is_empty() && counts.iter().all(|count| count.deficit == 0);
        let suggested = most_deficient(counts.clone());
        ActivityOverview {
            counts,
            suggested,
            total_logs: self.logs.len(),
            balanced,
        }
    }

    /// Most recent first. Among equal timestamps the later-recorded log wins.
    pub fn recent_logs(&self, limit: usize) -> Vec<ActivityLog> {
        let mut logs: Vec<ActivityLog> = self.logs.iter().rev().cloned().collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs.truncate(limit);
        logs
    }

    pub fn search_logs(&self, query: &str, limit: usize) -> Vec<ActivityLog> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.recent_logs(limit);
        }
        self.recent_logs(self.logs.len())
            .into_iter()
            .filter(|log| log.activity_name.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    pub fn activity_for_log(&self, log: &ActivityLog) -> Option<&Activity> {
        self.activities
            .iter()
            .find(|activity| activity.name == log.activity_name)
    }

    /// Pairs each log with the color of the activity it names, or the default
    /// color when no activity carries that name anymore.
    pub fn log_rows(&self, logs: Vec<ActivityLog>) -> Vec<LogRow> {
        logs.into_iter()
            .map(|log| {
                let color = self
                    .activity_for_log(&log)
                    .map(|activity| activity.color.clone())
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string());
                LogRow { log, color }
            })
            .collect()
    }
}

/// `ceil(total_logs * ratio / total_ratio)` in integer arithmetic.
fn target_count(total_logs: usize, ratio: u32, total_ratio: u64) -> usize {
    if total_logs == 0 || total_ratio == 0 {
        return 0;
    }
    let weighted = total_logs as u64 * u64::from(ratio);
    weighted.div_ceil(total_ratio) as usize
}

fn most_deficient(counts: Vec<ActivityCount>) -> Option<Activity> {
    let mut best: Option<ActivityCount> = None;
    for count in counts {
        let better = match &best {
            Some(current) => count.deficit > current.deficit,
            None => true,
        };
        if better {
            best = Some(count);
        }
    }
    best.filter(|count| count.deficit > 0)
        .map(|count| count.activity)
}
