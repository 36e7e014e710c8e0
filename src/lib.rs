//! Toggl APIのtime entryを扱うためのライブラリ。
//!
//! time entryは計測中(終了時刻なし)と停止済みのどちらかの状態を持つ。
//! APIでは`duration`が負の場合に計測中を表し、その絶対値が開始時刻のUNIX秒になる。
//! このクレートでは`EntryDuration`で状態を区別し、APIとの境界でのみ符号付き整数に変換する。

pub mod config;
pub mod datetime;
pub mod error;
pub mod gateway;
pub mod time_entry;
pub mod timestamp;
pub mod transitions;
pub mod transport;
pub mod wire;

pub use error::{EntryError, TransportError, UnstopError};
pub use gateway::EntryGateway;
pub use time_entry::{Billable, EntryDuration, Tags, TimeEntry};
pub use transitions::{NewTimeEntry, TagAction};
pub use transport::{HttpTransport, Transport};
