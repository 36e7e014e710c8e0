//! time entryの派生操作(continue, unstop, タグの追加・削除)のうち、APIと通信しない部分。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::same_local_day;
use crate::time_entry::{Billable, EntryDuration, Tags, TimeEntry};

/// 新しく開始するtime entryの内容。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewTimeEntry {
    pub description: String,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub billable: Billable,
    pub tags: Tags,
    pub duration_only: bool,
}

impl NewTimeEntry {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }
}

/// continueの方法。
#[derive(Clone, Debug, PartialEq)]
pub enum Continuation {
    /// 同じtime entryを計測中に戻す。
    Extend(TimeEntry),
    /// 同じ内容で新しいtime entryを開始する。
    Restart(NewTimeEntry),
}

/// タグの差分更新の種類。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    Add,
    Remove,
}

impl TagAction {
    pub fn from_add(add: bool) -> Self {
        if add {
            Self::Add
        } else {
            Self::Remove
        }
    }
}

/// time entryをどのようにcontinueするかを決める。
///
/// 経過時間のみ(`duration_only`)で、停止済みかつ開始日が`now`とLocalタイムゾーンで同じ日の場合は、
/// 同じtime entryを計測中に戻す。開始時刻を`now`から経過秒数だけ遡らせることで、
/// これまでの経過時間を引き継いだまま計測を再開する。
/// それ以外の場合は新しいtime entryを開始する。
///
/// # Arguments
///
/// * `entry` - continueするtime entry
/// * `duration_only` - 経過時間のみのtime entryとしてcontinueするかどうか
/// * `now` - 現在時刻
pub fn plan_continue(entry: &TimeEntry, duration_only: bool, now: DateTime<Utc>) -> Continuation {
    match (duration_only, entry.duration, entry.start) {
        (true, EntryDuration::Stopped { seconds }, Some(start)) if same_local_day(&now, &start) => {
            let mut extended = entry.clone();
            extended.duration = EntryDuration::Running {
                since: now.timestamp() - seconds,
            };
            extended.duration_only = true;
            extended.stop = None;
            Continuation::Extend(extended)
        }
        _ => Continuation::Restart(restart_request(entry, duration_only)),
    }
}

/// `entry`と同じ内容で新しいtime entryを開始するための内容を返す。
pub fn restart_request(entry: &TimeEntry, duration_only: bool) -> NewTimeEntry {
    NewTimeEntry {
        description: entry.description.clone(),
        project_id: entry.project_id,
        task_id: entry.task_id,
        billable: entry.billable,
        tags: entry.tags.clone(),
        duration_only,
    }
}

/// unstopで作成したtime entryの開始時刻を、元のtime entryの開始時刻に戻したものを返す。
pub fn reopened(created: &TimeEntry, original: &TimeEntry) -> TimeEntry {
    let mut entry = created.clone();
    entry.start = original.start;
    entry
}
