use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike, Utc};
use log::info;
use toggl_entries::{EntryGateway, TimeEntry, Transport};

/// 日毎の情報を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DailyArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<DateTime<Utc>>,
}

pub struct DailyCommand<'a, T: Transport> {
    gateway: &'a EntryGateway<'a, T>,
}

impl<'a, T: Transport> DailyCommand<'a, T> {
    /// 新しい`DailyCommand`を返す。
    ///
    /// # Arguments
    /// * `gateway` - Toggl APIでtime entryを操作するためのゲートウェイ
    pub fn new(gateway: &'a EntryGateway<'a, T>) -> Self {
        Self { gateway }
    }

    /// `daily`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された日付の00:00:00から始まる1日のタイムエントリーを取得する。
    /// 日付が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `daily` - `daily`サブコマンドの引数
    pub async fn run(&self, daily: DailyArgs) -> Result<Vec<TimeEntry>> {
        // Localのタイムゾーンで00:00:00から始まる1日とする
        let date = daily.date.unwrap_or_else(Utc::now);
        let local_date = date.with_timezone(&Local);
        let start_at = local_date
            .with_hour(0)
            .context("Failed to set hour")?
            .with_minute(0)
            .context("Failed to set minute")?
            .with_second(0)
            .context("Failed to set second")?
            .with_nanosecond(0)
            .context("Failed to set nanosecond")?;
        let end_at = start_at + chrono::Duration::days(1);
        info!("Start at: {}, End at: {}", start_at, end_at);

        let time_entries = self
            .gateway
            .list(&start_at.to_utc(), &end_at.to_utc())
            .await
            .context("Failed to retrieve time entries")?;

        info!("Time entries retrieved successfully.");

        Ok(time_entries)
    }
}

/// 日付をパースする。
fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let naive_date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))?;
    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .context("Failed to set hour, minute, and second")?;
    let datetime = Local
        .from_local_datetime(&naive_datetime)
        .single()
        .context("Failed to convert to DateTime<Local>")?
        .to_utc();

    Ok(datetime)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, TimeZone};
    use rstest::rstest;
    use serde_json::json;
    use toggl_entries::transport::ApiRequest;
    use toggl_entries::timestamp::format_timestamp;
    use toggl_entries::EntryGateway;

    use super::{parse_date, DailyArgs, DailyCommand};
    use crate::mock_api::MockApi;

    #[tokio::test]
    async fn test_daily_command_no_date() {
        let args = DailyArgs { date: None };
        let mut api = MockApi::new();
        api.expect_send()
            .times(1)
            .returning(|_| Ok(b"[]".to_vec()));
        let gateway = EntryGateway::new(&api, "test");

        let command = DailyCommand::new(&gateway);
        let result = command.run(args).await;

        assert!(result.is_ok());
    }

    /// 指定した日付のLocalタイムゾーンでの1日分を取得することを確認する。
    #[rstest]
    #[case(Local::now())]
    #[case(Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())]
    #[case(Local.with_ymd_and_hms(2024, 6, 15, 23, 59, 59).unwrap())]
    #[tokio::test]
    async fn test_daily_command_with_date(#[case] date: DateTime<Local>) {
        let start_of_day = Local
            .from_local_datetime(&date.date_naive().and_hms_opt(0, 0, 0).unwrap())
            .unwrap()
            .to_utc();
        let expected_query = vec![
            ("start_date".to_string(), format_timestamp(&start_of_day)),
            (
                "end_date".to_string(),
                format_timestamp(&(start_of_day + chrono::Duration::days(1))),
            ),
        ];
        let daily = DailyArgs {
            date: Some(date.to_utc()),
        };
        let mut api = MockApi::new();
        api.expect_send()
            .withf(move |request: &ApiRequest| request.query == expected_query)
            .times(1)
            .returning(|_| {
                Ok(json!([{"id": 1, "start": "2000-01-01T00:00:00Z", "duration": 60}])
                    .to_string()
                    .into_bytes())
            });
        let gateway = EntryGateway::new(&api, "test");

        let command = DailyCommand::new(&gateway);
        let result = command.run(daily).await.unwrap();

        assert_eq!(result.len(), 1);
    }

    #[rstest]
    #[case("2024-01-31", true)]
    #[case("2024-02-30", false)]
    #[case("2024/01/31", false)]
    fn test_parse_date(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(parse_date(input).is_ok(), ok);
    }
}
