//! Noop 通知送信実装
//!
//! プッシュ通知を実際に送信せず、ログ出力のみ行う。
//! テスト環境や通知無効化時に使用する。

use async_trait::async_trait;
use nutriagenda_domain::notification::{NotificationError, PushMessage};

use super::PushNotificationSender;

/// Noop 通知送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopPushSender;

#[async_trait]
impl PushNotificationSender for NoopPushSender {
    async fn send_push(&self, message: &PushMessage) -> Result<(), NotificationError> {
        tracing::info!(
            recipient = %message.recipient,
            title = %message.title,
            "Noop: プッシュ送信をスキップ"
        );
        Ok(())
    }
}
