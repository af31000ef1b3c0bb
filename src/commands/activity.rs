use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::activity::{
    Activity, ActivityCount, ActivityDraft, ActivityOverview, ActivityUpdateInput, COLOR_OPTIONS,
};

use super::{AppState, CommandError, CommandResult};

pub fn activities_list(state: &AppState) -> CommandResult<Vec<Activity>> {
    state.activities().list_activities().map_err(CommandError::from)
}

pub fn activities_create(
    state: &AppState,
    payload: ActivityCreatePayload,
) -> CommandResult<Activity> {
    let draft = payload.into_draft()?;
    state
        .activities()
        .create_activity(draft)
        .map_err(CommandError::from)
}

pub fn activities_update(
    state: &AppState,
    id: String,
    payload: ActivityUpdatePayload,
) -> CommandResult<Activity> {
    let input = payload.into_input()?;
    state
        .activities()
        .update_activity(&id, input)
        .map_err(CommandError::from)
}

pub fn activities_delete(state: &AppState, id: String) -> CommandResult<Activity> {
    state
        .activities()
        .delete_activity(&id)
        .map_err(CommandError::from)
}

pub fn activity_counts(state: &AppState) -> CommandResult<Vec<ActivityCount>> {
    state.activities().activity_counts().map_err(CommandError::from)
}

pub fn activity_suggestion(state: &AppState) -> CommandResult<Option<Activity>> {
    state
        .activities()
        .suggested_activity()
        .map_err(CommandError::from)
}

pub fn activity_overview(state: &AppState) -> CommandResult<ActivityOverview> {
    state.activities().overview().map_err(CommandError::from)
}

pub fn activity_color_options() -> Vec<String> {
    COLOR_OPTIONS.iter().map(|color| color.to_string()).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCreatePayload {
    name: String,
    ratio: i64,
    #[serde(default)]
    color: Option<String>,
}

impl ActivityCreatePayload {
    fn into_draft(self) -> AppResult<ActivityDraft> {
        Ok(ActivityDraft {
            name: self.name,
            ratio: parse_ratio(self.ratio)?,
            color: self.color,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityUpdatePayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ratio: Option<i64>,
    #[serde(default)]
    color: Option<String>,
}

impl ActivityUpdatePayload {
    fn into_input(self) -> AppResult<ActivityUpdateInput> {
        Ok(ActivityUpdateInput {
            name: self.name,
            ratio: self.ratio.map(parse_ratio).transpose()?,
            color: self.color,
        })
    }
}

fn parse_ratio(value: i64) -> AppResult<u32> {
    if value <= 0 {
        return Err(AppError::invalid_activity("活动比例必须大于 0"));
    }
    u32::try_from(value).map_err(|_| AppError::invalid_activity("活动比例超出范围"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ratio_is_invalid_activity() {
        let payload: ActivityCreatePayload =
            serde_json::from_str(r#"{ "name": "Gaming", "ratio": -2 }"#).unwrap();
        let err = payload.into_draft().unwrap_err();
        assert!(matches!(err, AppError::InvalidActivity { .. }));
    }

    #[test]
    fn oversized_ratio_is_invalid_activity() {
        let payload = ActivityUpdatePayload {
            ratio: Some(i64::from(u32::MAX) + 1),
            ..Default::default()
        };
        assert!(payload.into_input().is_err());
    }

    #[test]
    fn update_payload_keeps_unset_fields() {
        let payload: ActivityUpdatePayload = serde_json::from_str(r#"{ "ratio": 4 }"#).unwrap();
        let input = payload.into_input().unwrap();
        assert_eq!(input.ratio, Some(4));
        assert!(input.name.is_none());
        assert!(input.color.is_none());
    }

    #[test]
    fn color_options_are_offered() {
        let options = activity_color_options();
        assert_eq!(options.len(), 10);
        assert_eq!(options[0], "#007AFF");
    }
}
