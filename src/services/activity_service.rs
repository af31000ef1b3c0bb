use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::db::store::TrackerStore;
use crate::error::{AppError, AppResult};
use crate::models::activity::{
    default_activities, Activity, ActivityCount, ActivityDraft, ActivityLog, ActivityOverview,
    ActivityUpdateInput, LogRow,
};
use crate::services::ratio_tracker::RatioTracker;

/// Change notifications published after a mutation has been applied and saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackerEvent {
    ActivityAdded { activity: Activity },
    ActivityUpdated { activity: Activity },
    #[serde(rename_all = "camelCase")]
    ActivityRemoved {
        activity: Activity,
        logs_removed: usize,
    },
    ActivityLogged { log: ActivityLog },
    LogRemoved { log: ActivityLog },
    LogsPurged { count: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct ActivityServiceOptions {
    pub seed_default_activities: bool,
    pub recent_logs_limit: usize,
}

impl Default for ActivityServiceOptions {
    fn default() -> Self {
        Self {
            seed_default_activities: true,
            recent_logs_limit: crate::services::ratio_tracker::DEFAULT_RECENT_LOGS_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Changed {
    Activities,
    Logs,
    Both,
}

/// Owns the tracker state, serializes mutations and keeps the store in sync.
pub struct ActivityService {
    store: Arc<dyn TrackerStore>,
    tracker: Mutex<RatioTracker>,
    subscribers: Mutex<Vec<Sender<TrackerEvent>>>,
    options: ActivityServiceOptions,
}

impl ActivityService {
    pub fn load(store: Arc<dyn TrackerStore>, options: ActivityServiceOptions) -> AppResult<Self> {
        let mut activities = store.load_activities()?;
        let logs = store.load_logs()?;

        if activities.is_empty() && options.seed_default_activities {
            activities = default_activities();
            store.save_activities(&activities)?;
            info!(
                target: "app::tracker",
                count = activities.len(),
                "seeded default activities"
            );
        }

        info!(
            target: "app::tracker",
            activities = activities.len(),
            logs = logs.len(),
            "tracker state loaded"
        );

        Ok(Self {
            store,
            tracker: Mutex::new(RatioTracker::from_parts(activities, logs)),
            subscribers: Mutex::new(Vec::new()),
            options,
        })
    }

    pub fn subscribe(&self) -> AppResult<Receiver<TrackerEvent>> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers
            .lock()
            .map_err(|_| AppError::other("订阅列表锁已损坏"))?
            .push(sender);
        Ok(receiver)
    }

    pub fn list_activities(&self) -> AppResult<Vec<Activity>> {
        Ok(self.lock()?.activities().to_vec())
    }

    pub fn create_activity(&self, draft: ActivityDraft) -> AppResult<Activity> {
        let activity = draft.into_activity();
        self.commit(Changed::Activities, |tracker| {
            tracker.add_activity(activity.clone())
        })?;
        info!(target: "app::tracker", activity_id = %activity.id, "activity created");
        self.publish(TrackerEvent::ActivityAdded {
            activity: activity.clone(),
        });
        Ok(activity)
    }

    pub fn update_activity(&self, id: &str, input: ActivityUpdateInput) -> AppResult<Activity> {
        let (existing, updated) = self.commit(Changed::Activities, |tracker| {
            let existing = tracker
                .activities()
                .iter()
                .find(|activity| activity.id == id)
                .cloned()
                .ok_or_else(AppError::not_found)?;
            let updated = input.apply_to(&existing);
            tracker.update_activity(updated.clone())?;
            Ok((existing, updated))
        })?;
        if existing.name != updated.name {
            warn!(
                target: "app::tracker",
                activity_id = %id,
                "activity renamed, earlier logs keep the previous name"
            );
        }
        info!(target: "app::tracker", activity_id = %updated.id, "activity updated");
        self.publish(TrackerEvent::ActivityUpdated {
            activity: updated.clone(),
        });
        Ok(updated)
    }

    pub fn delete_activity(&self, id: &str) -> AppResult<Activity> {
        let (activity, logs_removed) =
            self.commit(Changed::Both, |tracker| tracker.remove_activity(id))?;
        info!(
            target: "app::tracker",
            activity_id = %activity.id,
            logs_removed,
            "activity deleted"
        );
        self.publish(TrackerEvent::ActivityRemoved {
            activity: activity.clone(),
            logs_removed,
        });
        Ok(activity)
    }

    pub fn log_activity(&self, name: &str) -> AppResult<ActivityLog> {
        let log = self.commit(Changed::Logs, |tracker| {
            if !tracker
                .activities()
                .iter()
                .any(|activity| activity.name == name)
            {
                warn!(target: "app::tracker", %name, "logging a name with no matching activity");
            }
            Ok(tracker.log_activity(name))
        })?;
        debug!(target: "app::tracker", log_id = %log.id, "activity logged");
        self.publish(TrackerEvent::ActivityLogged { log: log.clone() });
        Ok(log)
    }

    pub fn delete_log(&self, id: &str) -> AppResult<ActivityLog> {
        let log = self.commit(Changed::Logs, |tracker| tracker.remove_log(id))?;
        self.publish(TrackerEvent::LogRemoved { log: log.clone() });
        Ok(log)
    }

    pub fn purge_all_logs(&self) -> AppResult<usize> {
        let count = self.commit(Changed::Logs, |tracker| Ok(tracker.purge_all_logs()))?;
        info!(target: "app::tracker", count, "all logs purged");
        self.publish(TrackerEvent::LogsPurged { count });
        Ok(count)
    }

    pub fn activity_counts(&self) -> AppResult<Vec<ActivityCount>> {
        Ok(self.lock()?.activity_counts())
    }

    pub fn suggested_activity(&self) -> AppResult<Option<Activity>> {
        Ok(self.lock()?.suggested_activity())
    }

    pub fn overview(&self) -> AppResult<ActivityOverview> {
        Ok(self.lock()?.overview())
    }

    /// Recent logs, capped at the configured limit when `limit` is not given.
    pub fn recent_logs(&self, limit: Option<usize>) -> AppResult<Vec<ActivityLog>> {
        let limit = limit.unwrap_or(self.options.recent_logs_limit);
        Ok(self.lock()?.recent_logs(limit))
    }

    pub fn search_logs(&self, query: &str, limit: Option<usize>) -> AppResult<Vec<ActivityLog>> {
        let limit = limit.unwrap_or(self.options.recent_logs_limit);
        Ok(self.lock()?.search_logs(query, limit))
    }

    /// Recent logs paired with their activity color, read under a single lock.
    pub fn recent_log_rows(&self, limit: Option<usize>) -> AppResult<Vec<LogRow>> {
        let limit = limit.unwrap_or(self.options.recent_logs_limit);
        let tracker = self.lock()?;
        Ok(tracker.log_rows(tracker.recent_logs(limit)))
    }

    pub fn search_log_rows(&self, query: &str, limit: Option<usize>) -> AppResult<Vec<LogRow>> {
        let limit = limit.unwrap_or(self.options.recent_logs_limit);
        let tracker = self.lock()?;
        Ok(tracker.log_rows(tracker.search_logs(query, limit)))
    }

    /// Applies `mutate` to a copy of the state and swaps it in only after the
    /// changed collections are saved.
    fn commit<T>(
        &self,
        changed: Changed,
        mutate: impl FnOnce(&mut RatioTracker) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut tracker = self.lock()?;
        let mut next = tracker.clone();
        let outcome = mutate(&mut next)?;
        self.persist(&tracker, &next, changed)?;
        *tracker = next;
        Ok(outcome)
    }

    fn persist(
        &self,
        current: &RatioTracker,
        next: &RatioTracker,
        changed: Changed,
    ) -> AppResult<()> {
        match changed {
            Changed::Activities => self.store.save_activities(next.activities()),
            Changed::Logs => self.store.save_logs(next.logs()),
            Changed::Both => {
                self.store.save_logs(next.logs())?;
                if let Err(err) = self.store.save_activities(next.activities()) {
                    if let Err(restore_err) = self.store.save_logs(current.logs()) {
                        error!(
                            target: "app::store",
                            error = %restore_err,
                            "failed to restore logs after activity save error"
                        );
                    }
                    return Err(err);
                }
                Ok(())
            }
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, RatioTracker>> {
        self.tracker
            .lock()
            .map_err(|_| AppError::other("活动状态锁已损坏"))
    }

    fn publish(&self, event: TrackerEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            warn!(target: "app::tracker", "subscriber list poisoned, dropping event");
            return;
        };
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }
}
