use thiserror::Error;

use crate::time_entry::TimeEntry;

/// Transportが返す通信レベルのエラー。
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to send {method} request to {url}: {source}")]
    Request {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned status {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },
}

/// time entryの変換や操作で発生するエラー。
#[derive(Error, Debug)]
pub enum EntryError {
    #[error("Malformed timestamp: '{0}'")]
    MalformedTimestamp(String),

    #[error("Malformed duration: {0}")]
    MalformedDuration(i64),

    #[error("Invalid time entry state: {0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to encode or decode time entry JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response did not contain a time entry")]
    MissingData,
}

/// unstopの途中で失敗した場合のエラー。
///
/// どの段階で失敗したかによって、リモートに残っているtime entryが異なる。
/// 自動での補償処理は行わないので、呼び出し側で`new_entry`と`dangling_ids`を確認して対応する。
#[derive(Error, Debug)]
pub enum UnstopError {
    /// 新しいtime entryが作成されなかった。リモートの状態は変わっていない。
    #[error("New entry not started: {0}")]
    CreateFailed(#[source] EntryError),

    /// 新しいtime entryは作成されたが、開始時刻を元に戻せなかった。
    #[error("New entry not updated: {source}")]
    UpdateFailed {
        new_entry: TimeEntry,
        #[source]
        source: EntryError,
    },

    /// 新しいtime entryは開始時刻も含めて作成されたが、元のtime entryが削除できなかった。
    #[error("Old entry {old_id} not deleted: {source}")]
    DeleteFailed {
        new_entry: TimeEntry,
        old_id: i64,
        #[source]
        source: EntryError,
    },
}

impl UnstopError {
    /// リモートに作成済みの新しいtime entryを返す。
    pub fn new_entry(&self) -> Option<&TimeEntry> {
        match self {
            Self::CreateFailed(_) => None,
            Self::UpdateFailed { new_entry, .. } | Self::DeleteFailed { new_entry, .. } => {
                Some(new_entry)
            }
        }
    }

    /// 手動で整合させる必要があるtime entryのIDを返す。
    pub fn dangling_ids(&self) -> Vec<i64> {
        match self {
            Self::CreateFailed(_) => vec![],
            Self::UpdateFailed { new_entry, .. } => new_entry.id.into_iter().collect(),
            Self::DeleteFailed { old_id, .. } => vec![*old_id],
        }
    }
}
