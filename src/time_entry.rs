use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EntryError;

/// 開始・終了時刻が設定されていないことを表す値。
///
/// エポック0ではなく「未設定」を意味する。
pub const UNSET_TIME: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// time entryの計測状態。
///
/// APIでは1つの符号付き整数で表現される。
/// 0以上なら停止済みで経過秒数、負なら計測中で絶対値が開始時刻のUNIX秒になる。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryDuration {
    /// 停止済み。`seconds`は`stop - start`の秒数。
    Stopped { seconds: i64 },
    /// 計測中。`since`は開始時刻のUNIX秒。
    Running { since: i64 },
}

impl Default for EntryDuration {
    fn default() -> Self {
        Self::Stopped { seconds: 0 }
    }
}

impl EntryDuration {
    /// APIの`duration`の値から変換する。
    ///
    /// 符号を反転できない値(`i64::MIN`)はエラーになる。
    pub fn from_wire(value: i64) -> Result<Self, EntryError> {
        if value < 0 {
            let since = value
                .checked_neg()
                .ok_or(EntryError::MalformedDuration(value))?;
            Ok(Self::Running { since })
        } else {
            Ok(Self::Stopped { seconds: value })
        }
    }

    /// APIの`duration`の値に変換する。
    pub fn to_wire(self) -> i64 {
        match self {
            Self::Stopped { seconds } => seconds,
            Self::Running { since } => -since,
        }
    }

    /// `start`から計測中であることを表す値を返す。
    pub fn running_since(start: &DateTime<Utc>) -> Self {
        Self::Running {
            since: start.timestamp(),
        }
    }
}

/// time entryのタグ。
///
/// 重複を持たず、追加した順序を保持する。比較は順序を無視する。
#[derive(Clone, Debug, Default)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// タグを追加する。既に含まれている場合は何もしない。
    pub fn insert(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.contains(&tag) {
            self.0.push(tag);
        }
    }

    /// タグを削除する。含まれていない場合は何もしない。
    pub fn remove(&mut self, tag: &str) {
        self.0.retain(|t| t != tag);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl PartialEq for Tags {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|tag| other.contains(tag))
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::default();
        iter.into_iter().for_each(|tag| tags.insert(tag));
        tags
    }
}

/// 請求可否。
///
/// アカウントの種類によって真偽値か小数で返ってくるため、受け取った形のまま保持する。
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Billable {
    Flag(bool),
    Rate(f64),
}

impl Default for Billable {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl From<bool> for Billable {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Togglのtime entry。
///
/// `id`がない場合はまだAPIに登録されていないことを表す。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeEntry {
    pub id: Option<i64>,
    pub workspace_id: Option<i64>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub description: String,
    pub tags: Tags,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
    pub duration: EntryDuration,
    pub duration_only: bool,
    pub billable: Billable,
}

impl TimeEntry {
    /// 計測中かどうかを返す。
    ///
    /// `stop`の有無ではなく`duration`だけで判定する。
    pub fn is_running(&self) -> bool {
        matches!(self.duration, EntryDuration::Running { .. })
    }

    /// 開始時刻を返す。未設定の場合は`UNSET_TIME`を返す。
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start.unwrap_or(UNSET_TIME)
    }

    /// 終了時刻を返す。未設定の場合は`UNSET_TIME`を返す。
    pub fn stop_time(&self) -> DateTime<Utc> {
        self.stop.unwrap_or(UNSET_TIME)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tag(&mut self, tag: &str) {
        self.tags.insert(tag);
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    /// 経過秒数を設定し、終了時刻を`start + seconds`に更新する。
    ///
    /// 計測中のtime entryには設定できない。
    ///
    /// # Arguments
    ///
    /// * `seconds` - 経過秒数
    pub fn set_duration(&mut self, seconds: i64) -> Result<(), EntryError> {
        if self.is_running() {
            return Err(EntryError::InvalidState("time entry must be stopped"));
        }
        if seconds < 0 {
            return Err(EntryError::InvalidState("duration must not be negative"));
        }
        let start = self.require_start()?;

        let stop = offset_by(&start, seconds)?;
        self.duration = EntryDuration::Stopped { seconds };
        self.stop = Some(stop);

        Ok(())
    }

    /// 開始時刻を設定する。
    ///
    /// 停止済みの場合、`update_end`が`true`なら経過秒数を保って終了時刻を動かし、
    /// `false`なら終了時刻を保って経過秒数を計算し直す。
    /// 計測中の場合は開始時刻だけを変更する。
    ///
    /// 停止済みで終了時刻を保つ場合に`start`が終了時刻より後だと、経過秒数が負になり計測中と区別できなくなるため、
    /// 開始時刻を変更せずにエラーを返す。
    /// 終了時刻が表現できる範囲を超える場合もエラーを返す。
    ///
    /// # Arguments
    ///
    /// * `start` - 新しい開始時刻
    /// * `update_end` - 終了時刻を合わせて動かすかどうか
    pub fn set_start_time(
        &mut self,
        start: DateTime<Utc>,
        update_end: bool,
    ) -> Result<(), EntryError> {
        let seconds = match (self.duration, self.stop) {
            (EntryDuration::Running { .. }, _) => {
                self.start = Some(start);
                return Ok(());
            }
            (EntryDuration::Stopped { .. }, Some(stop)) if !update_end => {
                if stop < start {
                    return Err(EntryError::InvalidState("start must not be after stop"));
                }
                self.start = Some(start);
                self.duration = EntryDuration::Stopped {
                    seconds: whole_seconds(&start, &stop),
                };
                return Ok(());
            }
            // 終了時刻がない場合は経過秒数から求める
            (EntryDuration::Stopped { seconds }, _) => seconds,
        };

        let stop = offset_by(&start, seconds)?;
        self.start = Some(start);
        self.stop = Some(stop);

        Ok(())
    }

    /// 終了時刻を設定し、経過秒数を`stop - start`に更新する。
    ///
    /// 計測中のtime entryには設定できない。
    pub fn set_stop_time(&mut self, stop: DateTime<Utc>) -> Result<(), EntryError> {
        if self.is_running() {
            return Err(EntryError::InvalidState("time entry must be stopped"));
        }
        let start = self.require_start()?;
        if stop < start {
            return Err(EntryError::InvalidState("stop must not be before start"));
        }

        self.stop = Some(stop);
        self.duration = EntryDuration::Stopped {
            seconds: whole_seconds(&start, &stop),
        };

        Ok(())
    }

    fn require_start(&self) -> Result<DateTime<Utc>, EntryError> {
        self.start
            .ok_or(EntryError::InvalidState("time entry has no start time"))
    }
}

/// `start`から`seconds`秒後の時刻。表現できない場合はエラーになる。
fn offset_by(start: &DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>, EntryError> {
    Duration::try_seconds(seconds)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or(EntryError::InvalidState("duration is out of range"))
}

/// `start`から`stop`までの秒数。秒未満は切り捨てる。
fn whole_seconds(start: &DateTime<Utc>, stop: &DateTime<Utc>) -> i64 {
    (*stop - *start).num_seconds()
}
