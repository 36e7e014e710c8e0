use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::Method;

use crate::datetime;
use crate::error::{EntryError, UnstopError};
use crate::time_entry::TimeEntry;
use crate::timestamp::format_timestamp;
use crate::transitions::{
    plan_continue, reopened, restart_request, Continuation, NewTimeEntry, TagAction,
};
use crate::transport::{ApiRequest, Transport};
use crate::wire;

/// time entryの操作をToggl APIへのリクエストに変換して実行する。
///
/// 各操作のリクエストは順番に1つずつ送信し、失敗しても再送はしない。
///
/// # Examples
///
/// ```no_run
/// use toggl_entries::gateway::EntryGateway;
/// use toggl_entries::transport::HttpTransport;
///
/// # async fn run() -> Result<(), toggl_entries::error::EntryError> {
/// let transport = HttpTransport::new("https://api.track.toggl.com/api/v8", "token");
/// let gateway = EntryGateway::new(&transport, "toggl-entries");
/// let entry = gateway.start("write report").await?;
/// gateway.stop(&entry).await?;
/// # Ok(())
/// # }
/// ```
pub struct EntryGateway<'a, T: Transport> {
    transport: &'a T,
    app_name: String,
}

impl<'a, T: Transport> EntryGateway<'a, T> {
    /// 新しい`EntryGateway`を返す。
    ///
    /// # Arguments
    ///
    /// * `transport` - Toggl APIと通信するための`Transport`
    /// * `app_name` - time entryを作成する時に`created_with`として送るアプリケーション名
    pub fn new(transport: &'a T, app_name: impl Into<String>) -> Self {
        Self {
            transport,
            app_name: app_name.into(),
        }
    }

    /// 説明だけを指定してtime entryを開始する。
    pub async fn start(&self, description: &str) -> Result<TimeEntry, EntryError> {
        self.create(&NewTimeEntry::new(description)).await
    }

    /// プロジェクトを指定してtime entryを開始する。
    ///
    /// `billable`は有料プランのアカウントでのみ意味を持つ。
    pub async fn start_for_project(
        &self,
        description: &str,
        project_id: i64,
        billable: bool,
    ) -> Result<TimeEntry, EntryError> {
        self.create(&NewTimeEntry {
            project_id: Some(project_id),
            billable: billable.into(),
            ..NewTimeEntry::new(description)
        })
        .await
    }

    /// time entryを開始する。開始時刻とIDはAPI側で決まる。
    pub async fn create(&self, request: &NewTimeEntry) -> Result<TimeEntry, EntryError> {
        info!("Starting time entry '{}'", request.description);
        let body = wire::start_body(request, &self.app_name)?;
        let data = self
            .transport
            .send(ApiRequest::new(Method::POST, "/time_entries/start").with_body(body))
            .await?;

        wire::decode_entry(&data)
    }

    /// 計測中のtime entryを返す。計測中のものがない場合は`None`を返す。
    pub async fn current(&self) -> Result<Option<TimeEntry>, EntryError> {
        let data = self
            .transport
            .send(ApiRequest::new(Method::GET, "/time_entries/current"))
            .await?;

        wire::decode_optional_entry(&data)
    }

    pub async fn get(&self, id: i64) -> Result<TimeEntry, EntryError> {
        let data = self
            .transport
            .send(ApiRequest::new(Method::GET, format!("/time_entries/{}", id)))
            .await?;

        wire::decode_entry(&data)
    }

    /// 指定された期間のtime entryを取得する。
    ///
    /// # Arguments
    ///
    /// * `start_at` - 取得するtime entryの開始日時
    /// * `end_at` - 取得するtime entryの終了日時
    pub async fn list(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, EntryError> {
        let data = self
            .transport
            .send(
                ApiRequest::new(Method::GET, "/time_entries")
                    .with_query("start_date", format_timestamp(start_at))
                    .with_query("end_date", format_timestamp(end_at)),
            )
            .await?;

        wire::decode_entries(&data)
    }

    /// time entryの内容でAPI上のtime entryを更新する。
    pub async fn update(&self, entry: &TimeEntry) -> Result<TimeEntry, EntryError> {
        let id = persisted_id(entry)?;
        debug!("Updating time entry {:?}", entry);
        let body = wire::update_body(entry)?;
        let data = self
            .transport
            .send(ApiRequest::new(Method::PUT, format!("/time_entries/{}", id)).with_body(body))
            .await?;

        wire::decode_entry(&data)
    }

    /// 計測中のtime entryを停止する。終了時刻と経過秒数はAPI側で決まる。
    pub async fn stop(&self, entry: &TimeEntry) -> Result<TimeEntry, EntryError> {
        let id = persisted_id(entry)?;
        info!("Stopping time entry {}", id);
        let data = self
            .transport
            .send(ApiRequest::new(
                Method::PUT,
                format!("/time_entries/{}/stop", id),
            ))
            .await?;

        wire::decode_entry(&data)
    }

    /// time entryをcontinueする。
    ///
    /// 同じ日の経過時間のみのcontinueは同じtime entryを計測中に戻し、
    /// それ以外は同じ内容で新しいtime entryを開始する。
    ///
    /// # Arguments
    ///
    /// * `entry` - continueするtime entry
    /// * `duration_only` - 経過時間のみのtime entryとしてcontinueするかどうか
    pub async fn continue_entry(
        &self,
        entry: &TimeEntry,
        duration_only: bool,
    ) -> Result<TimeEntry, EntryError> {
        debug!("Continuing time entry {:?}", entry);
        match plan_continue(entry, duration_only, datetime::now()) {
            Continuation::Extend(extended) => {
                info!("Extending time entry {:?} on the same day", extended.id);
                self.update(&extended).await
            }
            Continuation::Restart(request) => self.create(&request).await,
        }
    }

    /// 停止済みのtime entryを計測中に戻す。
    ///
    /// APIには再開の操作がないため、同じ内容のtime entryを開始し、開始時刻を元のtime entryに合わせてから、
    /// 元のtime entryを削除する。途中で失敗した場合は`UnstopError`にリモートに残ったtime entryが含まれる。
    /// 計測中のtime entryは何も送信せずにエラーを返す。
    pub async fn unstop(&self, entry: &TimeEntry) -> Result<TimeEntry, UnstopError> {
        debug!("Unstopping time entry {:?}", entry);
        let old_id = persisted_id(entry).map_err(UnstopError::CreateFailed)?;
        if entry.is_running() {
            return Err(UnstopError::CreateFailed(EntryError::InvalidState(
                "time entry must be stopped",
            )));
        }

        let created = self
            .create(&restart_request(entry, entry.duration_only))
            .await
            .map_err(UnstopError::CreateFailed)?;

        let new_entry = match self.update(&reopened(&created, entry)).await {
            Ok(updated) => updated,
            Err(source) => {
                warn!(
                    "Time entry {:?} was started but its start time was not restored",
                    created.id
                );
                return Err(UnstopError::UpdateFailed {
                    new_entry: created,
                    source,
                });
            }
        };

        if let Err(source) = self.delete_by_id(old_id).await {
            warn!(
                "Time entry {:?} replaces {} but {} was not deleted",
                new_entry.id, old_id, old_id
            );
            return Err(UnstopError::DeleteFailed {
                new_entry,
                old_id,
                source,
            });
        }

        info!("Time entry {} unstopped as {:?}", old_id, new_entry.id);
        Ok(new_entry)
    }

    /// 指定したIDのtime entryにタグを1つ追加または削除する。
    ///
    /// タグ全体を置き換えるのではなく、API側で差分として適用される。
    pub async fn add_remove_tag(
        &self,
        id: i64,
        tag: &str,
        action: TagAction,
    ) -> Result<TimeEntry, EntryError> {
        debug!("Applying tag action {:?} '{}' to time entry {}", action, tag, id);
        let body = wire::tag_body(tag, action)?;
        let data = self
            .transport
            .send(ApiRequest::new(Method::PUT, format!("/time_entries/{}", id)).with_body(body))
            .await?;

        wire::decode_entry(&data)
    }

    /// time entryを削除する。削除したtime entryは以降の操作に使えない。
    pub async fn delete(&self, entry: TimeEntry) -> Result<(), EntryError> {
        let id = persisted_id(&entry)?;
        self.delete_by_id(id).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), EntryError> {
        info!("Deleting time entry {}", id);
        self.transport
            .send(ApiRequest::new(Method::DELETE, format!("/time_entries/{}", id)))
            .await?;

        Ok(())
    }
}

fn persisted_id(entry: &TimeEntry) -> Result<i64, EntryError> {
    entry
        .id
        .ok_or(EntryError::InvalidState("time entry has not been created yet"))
}
