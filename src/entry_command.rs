use anyhow::{bail, Context, Result};
use log::{info, warn};
use toggl_entries::{EntryGateway, NewTimeEntry, TagAction, TimeEntry, Transport};

/// `start`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct StartArgs {
    #[clap(help = "Description of the new time entry")]
    description: String,

    #[clap(short = 'p', long = "project", help = "Project ID of the new time entry")]
    project: Option<i64>,

    #[clap(long = "billable", help = "Marks the new time entry as billable")]
    billable: bool,

    #[clap(short = 't', long = "tag", help = "Tags of the new time entry")]
    tags: Vec<String>,
}

/// time entryを1つ指定するサブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct IdArgs {
    #[clap(help = "ID of the time entry")]
    id: i64,
}

/// `continue`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct ContinueArgs {
    #[clap(help = "ID of the time entry")]
    id: i64,

    #[clap(
        long = "duration-only",
        help = "Continues as a duration only entry, extending today's entry instead of starting a new one"
    )]
    duration_only: bool,
}

/// `tag`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct TagArgs {
    #[clap(help = "ID of the time entry")]
    id: i64,

    #[clap(help = "Tag to add or remove")]
    tag: String,

    #[clap(long = "remove", help = "Removes the tag instead of adding it")]
    remove: bool,
}

/// 1つのtime entryを操作するサブコマンドの処理を行う。
///
/// どの処理も結果として表示するtime entryを返す。
pub struct EntryCommand<'a, T: Transport> {
    gateway: &'a EntryGateway<'a, T>,
}

impl<'a, T: Transport> EntryCommand<'a, T> {
    /// 新しい`EntryCommand`を返す。
    pub fn new(gateway: &'a EntryGateway<'a, T>) -> Self {
        Self { gateway }
    }

    pub async fn current(&self) -> Result<Vec<TimeEntry>> {
        let entry = self
            .gateway
            .current()
            .await
            .context("Failed to retrieve the running time entry")?;
        if entry.is_none() {
            info!("No time entry is running.");
        }

        Ok(entry.into_iter().collect())
    }

    pub async fn start(&self, args: StartArgs) -> Result<Vec<TimeEntry>> {
        let request = NewTimeEntry {
            project_id: args.project,
            billable: args.billable.into(),
            tags: args.tags.into_iter().collect(),
            ..NewTimeEntry::new(args.description)
        };
        let entry = self
            .gateway
            .create(&request)
            .await
            .context("Failed to start time entry")?;

        Ok(vec![entry])
    }

    pub async fn stop(&self, args: IdArgs) -> Result<Vec<TimeEntry>> {
        let entry = self.fetch(args.id).await?;
        if !entry.is_running() {
            bail!("Time entry {} is not running", args.id);
        }
        let stopped = self
            .gateway
            .stop(&entry)
            .await
            .with_context(|| format!("Failed to stop time entry {}", args.id))?;

        Ok(vec![stopped])
    }

    pub async fn continue_entry(&self, args: ContinueArgs) -> Result<Vec<TimeEntry>> {
        let entry = self.fetch(args.id).await?;
        let continued = self
            .gateway
            .continue_entry(&entry, args.duration_only)
            .await
            .with_context(|| format!("Failed to continue time entry {}", args.id))?;

        Ok(vec![continued])
    }

    /// 停止済みのtime entryを計測中に戻す。
    ///
    /// 途中で失敗した場合は、手動で整合させる必要があるtime entryをログに出してからエラーを返す。
    pub async fn unstop(&self, args: IdArgs) -> Result<Vec<TimeEntry>> {
        let entry = self.fetch(args.id).await?;
        if entry.is_running() {
            bail!("Time entry {} is already running", args.id);
        }

        match self.gateway.unstop(&entry).await {
            Ok(new_entry) => Ok(vec![new_entry]),
            Err(error) => {
                if let Some(new_entry) = error.new_entry() {
                    warn!("Time entry {:?} was created: {:?}", new_entry.id, new_entry);
                }
                let dangling_ids = error.dangling_ids();
                Err(error).with_context(|| {
                    format!(
                        "Failed to unstop time entry {}, check time entries {:?}",
                        args.id, dangling_ids
                    )
                })
            }
        }
    }

    pub async fn tag(&self, args: TagArgs) -> Result<Vec<TimeEntry>> {
        let entry = self
            .gateway
            .add_remove_tag(args.id, &args.tag, TagAction::from_add(!args.remove))
            .await
            .with_context(|| format!("Failed to update tags of time entry {}", args.id))?;

        Ok(vec![entry])
    }

    pub async fn delete(&self, args: IdArgs) -> Result<Vec<TimeEntry>> {
        let entry = self.fetch(args.id).await?;
        self.gateway
            .delete(entry)
            .await
            .with_context(|| format!("Failed to delete time entry {}", args.id))?;
        info!("Time entry {} deleted.", args.id);

        Ok(vec![])
    }

    async fn fetch(&self, id: i64) -> Result<TimeEntry> {
        self.gateway
            .get(id)
            .await
            .with_context(|| format!("Failed to retrieve time entry {}", id))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::{json, Value};
    use toggl_entries::transport::ApiRequest;
    use toggl_entries::{EntryGateway, TransportError};

    use super::{EntryCommand, IdArgs, StartArgs, TagArgs};
    use crate::mock_api::MockApi;

    fn response(data: Value) -> Vec<u8> {
        json!({ "data": data }).to_string().into_bytes()
    }

    fn stopped() -> Value {
        json!({
            "id": 42,
            "description": "write report",
            "start": "2024-01-01T09:00:00Z",
            "stop": "2024-01-01T10:30:00Z",
            "duration": 5400,
        })
    }

    fn expect_get(api: &mut MockApi, data: Value) {
        api.expect_send()
            .withf(|request: &ApiRequest| {
                request.method == Method::GET && request.path == "/time_entries/42"
            })
            .times(1)
            .return_once(move |_| Ok(response(data)));
    }

    #[tokio::test]
    async fn test_start() {
        let mut api = MockApi::new();
        api.expect_send()
            .withf(|request: &ApiRequest| {
                request.path == "/time_entries/start"
                    && request.body
                        == Some(json!({
                            "time_entry": {
                                "description": "write report",
                                "pid": 7,
                                "tags": ["docs"],
                                "duronly": false,
                                "billable": true,
                                "created_with": "test",
                            }
                        }))
            })
            .times(1)
            .return_once(|_| Ok(response(json!({"id": 1, "duration": -1704099600}))));
        let gateway = EntryGateway::new(&api, "test");

        let entries = EntryCommand::new(&gateway)
            .start(StartArgs {
                description: "write report".to_string(),
                project: Some(7),
                billable: true,
                tags: vec!["docs".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_running());
    }

    /// 停止済みのtime entryは停止のリクエストを送らずにエラーになることを確認する。
    #[tokio::test]
    async fn test_stop_rejects_stopped_entry() {
        let mut api = MockApi::new();
        expect_get(&mut api, stopped());
        let gateway = EntryGateway::new(&api, "test");

        let result = EntryCommand::new(&gateway).stop(IdArgs { id: 42 }).await;

        assert!(result.is_err());
    }

    /// unstopで元のtime entryの削除に失敗した場合、残ったIDがエラーに含まれることを確認する。
    #[tokio::test]
    async fn test_unstop_reports_dangling_entry() {
        let mut api = MockApi::new();
        expect_get(&mut api, stopped());
        api.expect_send()
            .withf(|request: &ApiRequest| request.method == Method::POST)
            .times(1)
            .return_once(|_| {
                Ok(response(json!({
                    "id": 99,
                    "start": "2024-01-02T08:00:00Z",
                    "duration": -1704182400,
                })))
            });
        api.expect_send()
            .withf(|request: &ApiRequest| request.method == Method::PUT)
            .times(1)
            .return_once(|_| {
                Ok(response(json!({
                    "id": 99,
                    "start": "2024-01-01T09:00:00Z",
                    "duration": -1704099600,
                })))
            });
        api.expect_send()
            .withf(|request: &ApiRequest| request.method == Method::DELETE)
            .times(1)
            .return_once(|_| {
                Err(TransportError::Status {
                    method: "DELETE".to_string(),
                    url: "/time_entries/42".to_string(),
                    status: 503,
                    body: String::new(),
                })
            });
        let gateway = EntryGateway::new(&api, "test");

        let error = EntryCommand::new(&gateway)
            .unstop(IdArgs { id: 42 })
            .await
            .unwrap_err();

        assert!(format!("{:#}", error).contains("[42]"));
    }

    #[tokio::test]
    async fn test_tag_remove() {
        let mut api = MockApi::new();
        api.expect_send()
            .withf(|request: &ApiRequest| {
                request.body.as_ref().map(|body| &body["time_entry"]["tag_action"])
                    == Some(&json!("remove"))
            })
            .times(1)
            .return_once(|_| Ok(response(json!({"id": 42, "duration": 60}))));
        let gateway = EntryGateway::new(&api, "test");

        let entries = EntryCommand::new(&gateway)
            .tag(TagArgs {
                id: 42,
                tag: "meeting".to_string(),
                remove: true,
            })
            .await
            .unwrap();

        assert_eq!(entries[0].id, Some(42));
    }

    #[tokio::test]
    async fn test_delete() {
        let mut api = MockApi::new();
        expect_get(&mut api, stopped());
        api.expect_send()
            .withf(|request: &ApiRequest| request.method == Method::DELETE)
            .times(1)
            .return_once(|_| Ok(vec![]));
        let gateway = EntryGateway::new(&api, "test");

        let entries = EntryCommand::new(&gateway)
            .delete(IdArgs { id: 42 })
            .await
            .unwrap();

        assert!(entries.is_empty());
    }
}
