//! Toggl APIの日時文字列の変換。
//!
//! 読み込みはUTCの`Z`形式とオフセット付きの形式のどちらも受け付けるが、
//! 書き出しは常にオフセット付きの形式にする。

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

use crate::error::EntryError;

/// `2024-01-01T09:00:00Z`
const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
/// `2024-01-01T18:00:00+09:00`
const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// APIの日時文字列をパースする。
///
/// 空文字列は値なしとして`None`を返す。
/// 秒未満は切り捨てる。
///
/// # Arguments
///
/// * `value` - APIから受け取った日時文字列
///
/// # Examples
///
/// ```
/// use toggl_entries::timestamp::parse_timestamp;
///
/// let start = parse_timestamp("2024-01-01T09:00:00Z").unwrap();
/// assert!(start.is_some());
/// assert_eq!(parse_timestamp("").unwrap(), None);
/// ```
pub fn parse_timestamp(value: &str) -> Result<Option<DateTime<Utc>>, EntryError> {
    if value.is_empty() {
        return Ok(None);
    }

    let parsed = NaiveDateTime::parse_from_str(value, UTC_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .or_else(|_| {
            DateTime::parse_from_str(value, OFFSET_FORMAT).map(|datetime| datetime.to_utc())
        })
        .map_err(|_| EntryError::MalformedTimestamp(value.to_string()))?;

    Ok(Some(parsed.trunc_subsecs(0)))
}

/// 日時をAPIへ送る形式の文字列にする。
pub fn format_timestamp(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::{format_timestamp, parse_timestamp};
    use crate::error::EntryError;

    /// 対応している形式がパースできることを確認する。
    #[rstest]
    #[case::utc("2024-01-01T09:00:00Z", Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())]
    #[case::utc_fraction("2024-01-01T09:00:00.750Z", Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())]
    #[case::zero_offset("2024-01-01T09:00:00+00:00", Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())]
    #[case::positive_offset("2024-01-01T18:00:00+09:00", Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())]
    #[case::negative_offset("2023-12-31T23:30:00-09:30", Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())]
    fn test_parse_timestamp(#[case] input: &str, #[case] expected: chrono::DateTime<Utc>) {
        assert_eq!(parse_timestamp(input).unwrap(), Some(expected));
    }

    /// 空文字列は値なしとして扱うことを確認する。
    #[test]
    fn test_parse_empty_timestamp() {
        assert_eq!(parse_timestamp("").unwrap(), None);
    }

    /// 対応していない形式はエラーになることを確認する。
    #[rstest]
    #[case::date_only("2024-01-01")]
    #[case::no_zone("2024-01-01T09:00:00")]
    #[case::slash_date("2024/01/01T09:00:00Z")]
    #[case::garbage("yesterday")]
    fn test_parse_malformed_timestamp(#[case] input: &str) {
        match parse_timestamp(input) {
            Err(EntryError::MalformedTimestamp(value)) => assert_eq!(value, input),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    /// 書き出しは常にオフセット付きの形式になることを確認する。
    #[test]
    fn test_format_timestamp() {
        let datetime = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        assert_eq!(format_timestamp(&datetime), "2024-01-01T09:00:00+00:00");
    }
}
