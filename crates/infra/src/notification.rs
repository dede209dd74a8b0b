//! # 通知送信
//!
//! プッシュ通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `PushNotificationSender` trait で配信基盤を抽象化
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択（現在は `noop` のみ）

mod noop;

use async_trait::async_trait;
pub use noop::NoopPushSender;
use nutriagenda_domain::notification::{NotificationError, PushMessage};

/// プッシュ通知送信トレイト
#[async_trait]
pub trait PushNotificationSender: Send + Sync {
    /// プッシュ通知を送信する
    async fn send_push(&self, message: &PushMessage) -> Result<(), NotificationError>;
}
