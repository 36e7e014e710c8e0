//! Toggl APIとやり取りするJSONの形式。
//!
//! リクエストは`{"time_entry": {...}}`、レスポンスは`{"data": {...}}`で包まれる。

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EntryError;
use crate::time_entry::{Billable, EntryDuration, TimeEntry};
use crate::timestamp::{format_timestamp, parse_timestamp};
use crate::transitions::{NewTimeEntry, TagAction};

/// Toggl APIのtime entryをシリアライズ・デシリアライズするための構造体。
///
/// 作成・更新・タグの差分更新で送る内容が異なるため、全てのフィールドを省略可能にしている。
#[derive(Debug, Default, Serialize, Deserialize)]
struct TogglTimeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duronly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    billable: Option<Billable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag_action: Option<TagAction>,
}

#[derive(Debug, Serialize)]
struct TimeEntryRequest {
    time_entry: TogglTimeEntry,
}

#[derive(Debug, Deserialize)]
struct TimeEntryResponse {
    data: Option<TogglTimeEntry>,
}

impl From<&TimeEntry> for TogglTimeEntry {
    fn from(entry: &TimeEntry) -> Self {
        Self {
            wid: entry.workspace_id,
            id: entry.id,
            pid: entry.project_id,
            tid: entry.task_id,
            description: Some(entry.description.clone()).filter(|d| !d.is_empty()),
            start: entry.start.as_ref().map(format_timestamp),
            stop: entry.stop.as_ref().map(format_timestamp),
            tags: Some(entry.tags.to_vec()),
            duration: Some(entry.duration.to_wire()),
            duronly: Some(entry.duration_only),
            billable: Some(entry.billable),
            ..Default::default()
        }
    }
}

impl TryFrom<TogglTimeEntry> for TimeEntry {
    type Error = EntryError;

    fn try_from(entry: TogglTimeEntry) -> Result<Self, Self::Error> {
        let start = match entry.start {
            Some(start) => parse_timestamp(&start)?,
            None => None,
        };
        let stop = match entry.stop {
            Some(stop) => parse_timestamp(&stop)?,
            None => None,
        };

        Ok(TimeEntry {
            id: assigned(entry.id),
            workspace_id: assigned(entry.wid),
            project_id: assigned(entry.pid),
            task_id: assigned(entry.tid),
            description: entry.description.unwrap_or_default(),
            tags: entry.tags.unwrap_or_default().into_iter().collect(),
            start,
            stop,
            duration: EntryDuration::from_wire(entry.duration.unwrap_or_default())?,
            duration_only: entry.duronly.unwrap_or_default(),
            billable: entry.billable.unwrap_or_default(),
        })
    }
}

/// APIでは0が未設定を表すため、0を`None`にする。
fn assigned(id: Option<i64>) -> Option<i64> {
    id.filter(|id| *id != 0)
}

/// time entryをAPIのJSONにする。
pub fn encode_time_entry(entry: &TimeEntry) -> Result<Vec<u8>, EntryError> {
    Ok(serde_json::to_vec(&TogglTimeEntry::from(entry))?)
}

/// APIのJSONからtime entryを読み込む。
pub fn decode_time_entry(data: &[u8]) -> Result<TimeEntry, EntryError> {
    let entry: TogglTimeEntry = serde_json::from_slice(data)?;
    entry.try_into()
}

/// time entry全体を更新するリクエストボディを作成する。
pub fn update_body(entry: &TimeEntry) -> Result<Value, EntryError> {
    request_body(TogglTimeEntry::from(entry))
}

/// time entryを開始するリクエストボディを作成する。
///
/// # Arguments
///
/// * `request` - 開始するtime entryの内容
/// * `created_with` - APIに伝えるアプリケーション名
pub fn start_body(request: &NewTimeEntry, created_with: &str) -> Result<Value, EntryError> {
    request_body(TogglTimeEntry {
        pid: request.project_id,
        tid: request.task_id,
        description: Some(request.description.clone()),
        tags: Some(request.tags.to_vec()),
        duronly: Some(request.duration_only),
        billable: Some(request.billable),
        created_with: Some(created_with.to_string()),
        ..Default::default()
    })
}

/// タグを1つだけ追加・削除するリクエストボディを作成する。
pub fn tag_body(tag: &str, action: TagAction) -> Result<Value, EntryError> {
    request_body(TogglTimeEntry {
        tags: Some(vec![tag.to_string()]),
        tag_action: Some(action),
        ..Default::default()
    })
}

fn request_body(time_entry: TogglTimeEntry) -> Result<Value, EntryError> {
    Ok(serde_json::to_value(TimeEntryRequest { time_entry })?)
}

/// `{"data": {...}}`形式のレスポンスからtime entryを読み込む。
pub fn decode_entry(data: &[u8]) -> Result<TimeEntry, EntryError> {
    decode_optional_entry(data)?.ok_or(EntryError::MissingData)
}

/// `{"data": {...}}`形式のレスポンスからtime entryを読み込む。`data`が`null`の場合は`None`を返す。
pub fn decode_optional_entry(data: &[u8]) -> Result<Option<TimeEntry>, EntryError> {
    let response: TimeEntryResponse = serde_json::from_slice(data)?;
    let entry = response.data.map(TimeEntry::try_from).transpose()?;
    debug!(
        "Decoded '{}' into {:?}",
        String::from_utf8_lossy(data),
        entry
    );

    Ok(entry)
}

/// time entryの配列のレスポンスを読み込む。
pub fn decode_entries(data: &[u8]) -> Result<Vec<TimeEntry>, EntryError> {
    let entries: Vec<TogglTimeEntry> = serde_json::from_slice(data)?;
    debug!("length of time entries: {}", entries.len());

    entries.into_iter().map(TimeEntry::try_from).collect()
}
