//! # 通知
//!
//! プッシュ通知に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 受信者 |
//! |---|------------|------|
//! | [`AppointmentNotification`] | 予約通知イベント | イベント種別により患者または栄養士 |
//! | [`NotificationEventType`] | 通知イベント種別 | 6 種類: 申込、確定、拒否、自動拒否、キャンセル、再有効化 |
//! | [`PushMessage`] | プッシュメッセージ | 送信基盤に渡す最終形 |
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: 通知送信の失敗は予約操作に影響しない
//! - **ユースケースからは送らない**: 予約ユースケースの成功後に呼び出し側が送る

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::appointment::{Appointment, AppointmentId};

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// プッシュ送信に失敗
    #[error("プッシュ送信に失敗: {0}")]
    SendFailed(String),
}

/// 通知イベント種別
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationEventType {
    /// 申込: 患者が予約を申し込んだ → 栄養士に送信
    Requested,
    /// 確定: 栄養士が確定した → 患者に送信
    Accepted,
    /// 拒否: 栄養士が拒否した → 患者に送信
    Rejected,
    /// 自動拒否: 同じ枠の別の申込が確定した → 患者に送信
    AutoRejected,
    /// キャンセル → 患者に送信
    Cancelled,
    /// 再有効化 → 患者に送信
    Reactivated,
}

/// プッシュメッセージ
///
/// [`AppointmentNotification::render`] の出力。送信基盤に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    /// 受信者（患者 ID または栄養士 ID）
    pub recipient: String,
    /// タイトル
    pub title:     String,
    /// 本文
    pub body:      String,
}

/// 予約通知イベント
#[derive(Debug, Clone)]
pub struct AppointmentNotification {
    event_type:      NotificationEventType,
    appointment_id:  AppointmentId,
    patient_id:      String,
    nutritionist_id: String,
    date:            NaiveDate,
    time_start:      &'static str,
    time_end:        &'static str,
}

impl AppointmentNotification {
    /// 予約の現在の内容から通知イベントを作る
    pub fn new(event_type: NotificationEventType, appointment: &Appointment) -> Self {
        Self {
            event_type,
            appointment_id: appointment.id().clone(),
            patient_id: appointment.patient_id().to_string(),
            nutritionist_id: appointment.nutritionist_id().to_string(),
            date: appointment.date(),
            time_start: appointment.time_start(),
            time_end: appointment.time_end(),
        }
    }

    pub fn event_type(&self) -> NotificationEventType {
        self.event_type
    }

    pub fn appointment_id(&self) -> &AppointmentId {
        &self.appointment_id
    }

    /// 受信者を返す
    ///
    /// 申込のみ栄養士宛て、それ以外は患者宛て。
    pub fn recipient(&self) -> &str {
        match self.event_type {
            NotificationEventType::Requested => &self.nutritionist_id,
            NotificationEventType::Accepted
            | NotificationEventType::Rejected
            | NotificationEventType::AutoRejected
            | NotificationEventType::Cancelled
            | NotificationEventType::Reactivated => &self.patient_id,
        }
    }

    /// プッシュメッセージを生成する
    pub fn render(&self) -> PushMessage {
        let when = format!(
            "{}, das {} às {}",
            self.date.format("%d/%m/%Y"),
            self.time_start,
            self.time_end
        );
        let (title, body) = match self.event_type {
            NotificationEventType::Requested => (
                "Nova solicitação de consulta",
                format!("Um paciente solicitou uma consulta em {when}."),
            ),
            NotificationEventType::Accepted => (
                "Consulta confirmada",
                format!("Sua consulta em {when} foi confirmada."),
            ),
            NotificationEventType::Rejected => (
                "Consulta recusada",
                format!("Sua solicitação de consulta em {when} foi recusada."),
            ),
            NotificationEventType::AutoRejected => (
                "Horário indisponível",
                format!("O horário solicitado em {when} foi preenchido por outra consulta."),
            ),
            NotificationEventType::Cancelled => (
                "Consulta cancelada",
                format!("Sua consulta em {when} foi cancelada."),
            ),
            NotificationEventType::Reactivated => (
                "Consulta reativada",
                format!("Sua consulta em {when} foi reativada."),
            ),
        };

        PushMessage {
            recipient: self.recipient().to_string(),
            title: title.to_string(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{
        appointment::NewAppointment,
        slot::SlotWindow,
        value_objects::{NutritionistId, PatientId},
    };

    #[fixture]
    fn appointment() -> Appointment {
        let now: NaiveDateTime = NaiveDate::from_ymd_opt(2030, 1, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Appointment::new(NewAppointment {
            id: AppointmentId::new(),
            patient_id: PatientId::new("p1").unwrap(),
            nutritionist_id: NutritionistId::new("n1").unwrap(),
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            slot: SlotWindow::from_catalog("14:00", "16:00").unwrap(),
            observations: None,
            now,
        })
    }

    #[rstest]
    #[case(NotificationEventType::Requested, "n1")]
    #[case(NotificationEventType::Accepted, "p1")]
    #[case(NotificationEventType::Rejected, "p1")]
    #[case(NotificationEventType::AutoRejected, "p1")]
    #[case(NotificationEventType::Cancelled, "p1")]
    #[case(NotificationEventType::Reactivated, "p1")]
    fn test_受信者はイベント種別で決まる(
        appointment: Appointment,
        #[case] event_type: NotificationEventType,
        #[case] recipient: &str,
    ) {
        let notification = AppointmentNotification::new(event_type, &appointment);
        assert_eq!(notification.recipient(), recipient);
        assert_eq!(notification.render().recipient, recipient);
    }

    #[rstest]
    fn test_確定通知の文面(appointment: Appointment) {
        let message =
            AppointmentNotification::new(NotificationEventType::Accepted, &appointment).render();

        assert_eq!(
            message,
            PushMessage {
                recipient: "p1".to_string(),
                title: "Consulta confirmada".to_string(),
                body: "Sua consulta em 07/01/2030, das 14:00 às 16:00 foi confirmada."
                    .to_string(),
            }
        );
    }

    #[rstest]
    fn test_申込通知の文面(appointment: Appointment) {
        let message =
            AppointmentNotification::new(NotificationEventType::Requested, &appointment).render();

        assert_eq!(message.title, "Nova solicitação de consulta");
        assert_eq!(
            message.body,
            "Um paciente solicitou uma consulta em 07/01/2030, das 14:00 às 16:00."
        );
    }

    #[test]
    fn test_イベント種別の文字列表現() {
        assert_eq!(NotificationEventType::AutoRejected.to_string(), "auto_rejected");
    }
}
