//! # Core Service 設定
//!
//! 環境変数から Core Service サーバーの設定を読み込む。
//!
//! | 変数名 | デフォルト | 説明 |
//! |--------|-----------|------|
//! | `CORE_HOST` | `0.0.0.0` | バインドアドレス |
//! | `CORE_PORT` | `3001` | ポート番号 |
//! | `BOOKING_SAME_DAY_CUTOFF` | `true` | 当日予約で開始時刻を過ぎた枠を拒否する |
//! | `AGENDA_WINDOW_DAYS` | `30` | アジェンダの既定の表示日数 |
//! | `AVAILABILITY_MAX_DAYS` | `90` | 期間指定の空き枠照会で許す最大日数 |
//! | `NOTIFICATION_BACKEND` | `noop` | プッシュ通知の送信バックエンド |

use std::{env, str::FromStr};

use thiserror::Error;

use crate::usecase::BookingPolicy;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 値をパースできない
    #[error("{name} の値が不正です: {value:?}")]
    InvalidValue {
        name:  &'static str,
        value: String,
    },

    /// 未対応の通知バックエンド
    #[error("未対応の NOTIFICATION_BACKEND です: {0:?}（対応: noop）")]
    UnsupportedNotificationBackend(String),
}

/// プッシュ通知の送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationBackend {
    /// 送信しない（ログ出力のみ）
    #[default]
    Noop,
}

/// Core Service サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// 予約ポリシー
    pub booking: BookingPolicy,
    /// 通知バックエンド
    pub notification_backend: NotificationBackend,
}

impl CoreConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の取得関数から設定を読み込む
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = BookingPolicy::default();

        Ok(Self {
            host: lookup("CORE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("CORE_PORT", lookup("CORE_PORT"), 3001)?,
            booking: BookingPolicy {
                same_day_cutoff:       parse_or(
                    "BOOKING_SAME_DAY_CUTOFF",
                    lookup("BOOKING_SAME_DAY_CUTOFF"),
                    defaults.same_day_cutoff,
                )?,
                agenda_window_days:    parse_or(
                    "AGENDA_WINDOW_DAYS",
                    lookup("AGENDA_WINDOW_DAYS"),
                    defaults.agenda_window_days,
                )?,
                availability_max_days: parse_or(
                    "AVAILABILITY_MAX_DAYS",
                    lookup("AVAILABILITY_MAX_DAYS"),
                    defaults.availability_max_days,
                )?,
            },
            notification_backend: match lookup("NOTIFICATION_BACKEND").as_deref() {
                None | Some("noop") => NotificationBackend::Noop,
                Some(other) => {
                    return Err(ConfigError::UnsupportedNotificationBackend(
                        other.to_string(),
                    ));
                }
            },
        })
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}
