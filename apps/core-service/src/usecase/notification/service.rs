//! # 通知サービス
//!
//! メッセージ生成 → プッシュ送信 → ビジネスイベント記録を統合するサービス。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: `notify()` は送信失敗してもエラーを返さない
//! - **依存性注入**: `PushNotificationSender` は trait で抽象化

use std::sync::Arc;

use nutriagenda_domain::notification::AppointmentNotification;
use nutriagenda_infra::notification::PushNotificationSender;
use nutriagenda_shared::{event_log::event, log_business_event};

/// 通知サービス
pub struct NotificationService {
    sender: Arc<dyn PushNotificationSender>,
}

impl NotificationService {
    pub fn new(sender: Arc<dyn PushNotificationSender>) -> Self {
        Self { sender }
    }

    /// 通知を送信する（fire-and-forget）
    pub async fn notify(&self, notification: AppointmentNotification) {
        let event_type: &str = notification.event_type().into();
        let message = notification.render();

        match self.sender.send_push(&message).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::APPOINTMENT,
                    event.entity_id = %notification.appointment_id(),
                    event.result = event::result::SUCCESS,
                    notification.event_type = event_type,
                    notification.recipient = %message.recipient,
                    "プッシュ通知送信成功"
                );
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::APPOINTMENT,
                    event.entity_id = %notification.appointment_id(),
                    event.result = event::result::FAILURE,
                    notification.event_type = event_type,
                    notification.recipient = %message.recipient,
                    error = %e,
                    "プッシュ通知送信失敗"
                );
            }
        }
    }
}
