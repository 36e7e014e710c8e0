use chrono::{DateTime, Local, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// 2つの時刻がLocalタイムゾーンで同じ日付かどうかを返す。
pub fn same_local_day(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    a.with_timezone(&Local).date_naive() == b.with_timezone(&Local).date_naive()
}
