//! # 予約 API ハンドラ
//!
//! 予約の申込・状態変更・照会のエンドポイントを実装する。
//! 状態変更が成功した後に、関係者へのプッシュ通知を送る。

mod command;
mod query;

pub use command::*;
pub use query::*;

use nutriagenda_domain::{
    appointment::Appointment,
    slot::{TimeSlot, format_date_to_iso},
};
use serde::{Deserialize, Serialize};

use crate::usecase::{
    AcceptedAppointment,
    AgendaDay,
    AppointmentUseCaseImpl,
    NotificationService,
    ResolvedConflict,
    SlotConflict,
};

/// 予約ハンドラの State
pub struct AppointmentState {
    pub usecase:       AppointmentUseCaseImpl,
    pub notifications: NotificationService,
}

/// 予約申込リクエスト
///
/// 欠けた項目は空文字として扱い、ユースケースの検証でエラーにする。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RequestAppointmentRequest {
    pub patient_id:      String,
    pub nutritionist_id: String,
    /// `YYYY-MM-DD`
    pub date:            String,
    /// `HH:MM`
    pub time_start:      String,
    /// `HH:MM`
    pub time_end:        String,
    pub observations:    Option<String>,
}

/// 日付指定クエリパラメータ
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DateQuery {
    pub date: String,
}

/// 期間指定クエリパラメータ
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DateRangeQuery {
    pub start: String,
    pub end:   String,
}

/// アジェンダの期間指定（省略可）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgendaQuery {
    pub start: Option<String>,
    pub end:   Option<String>,
}

/// 枠指定クエリパラメータ
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlotConflictQuery {
    pub date:       String,
    pub time_start: String,
    pub time_end:   String,
    /// 判定から除く予約 ID
    pub exclude:    Option<String>,
}

/// 予約 DTO
#[derive(Debug, Serialize)]
pub struct AppointmentDto {
    pub id: String,
    pub patient_id: String,
    pub nutritionist_id: String,
    pub date: String,
    pub time_start: String,
    pub time_end: String,
    pub status: String,
    pub observations: Option<String>,
    pub calendar_event_id_patient: Option<String>,
    pub calendar_event_id_nutritionist: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Appointment> for AppointmentDto {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id().to_string(),
            patient_id: appointment.patient_id().to_string(),
            nutritionist_id: appointment.nutritionist_id().to_string(),
            date: format_date_to_iso(appointment.date()),
            time_start: appointment.time_start().to_string(),
            time_end: appointment.time_end().to_string(),
            status: appointment.status().to_string(),
            observations: appointment.observations().map(str::to_string),
            calendar_event_id_patient: appointment
                .calendar_event_id_patient()
                .map(str::to_string),
            calendar_event_id_nutritionist: appointment
                .calendar_event_id_nutritionist()
                .map(str::to_string),
            created_at: appointment.created_at().format("%Y-%m-%dT%H:%M:%S").to_string(),
            updated_at: appointment.updated_at().format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

fn to_dtos(appointments: &[Appointment]) -> Vec<AppointmentDto> {
    appointments.iter().map(AppointmentDto::from).collect()
}

/// 予約確定の結果 DTO
#[derive(Debug, Serialize)]
pub struct AcceptedAppointmentDto {
    pub appointment:   AppointmentDto,
    pub auto_rejected: Vec<AppointmentDto>,
}

impl From<&AcceptedAppointment> for AcceptedAppointmentDto {
    fn from(result: &AcceptedAppointment) -> Self {
        Self {
            appointment:   AppointmentDto::from(&result.appointment),
            auto_rejected: to_dtos(&result.auto_rejected),
        }
    }
}

/// 重複解消の結果 DTO
#[derive(Debug, Serialize)]
pub struct ResolvedConflictDto {
    pub appointment: AppointmentDto,
    pub demoted:     Vec<AppointmentDto>,
    pub promoted:    bool,
}

impl From<&ResolvedConflict> for ResolvedConflictDto {
    fn from(result: &ResolvedConflict) -> Self {
        Self {
            appointment: AppointmentDto::from(&result.appointment),
            demoted:     to_dtos(&result.demoted),
            promoted:    result.promoted,
        }
    }
}

/// 空き枠 DTO
#[derive(Debug, Serialize)]
pub struct TimeSlotDto {
    pub date:       String,
    pub time_start: String,
    pub time_end:   String,
    pub available:  bool,
}

impl From<&TimeSlot> for TimeSlotDto {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            date:       format_date_to_iso(slot.date),
            time_start: slot.time_start.to_string(),
            time_end:   slot.time_end.to_string(),
            available:  slot.available,
        }
    }
}

/// アジェンダの 1 日分 DTO
#[derive(Debug, Serialize)]
pub struct AgendaDayDto {
    pub date:         String,
    pub appointments: Vec<AppointmentDto>,
}

impl From<&AgendaDay> for AgendaDayDto {
    fn from(day: &AgendaDay) -> Self {
        Self {
            date:         format_date_to_iso(day.date),
            appointments: to_dtos(&day.appointments),
        }
    }
}

/// 重複している枠 DTO
#[derive(Debug, Serialize)]
pub struct SlotConflictDto {
    pub time_start: String,
    pub time_end:   String,
    pub accepted:   Vec<AppointmentDto>,
}

impl From<&SlotConflict> for SlotConflictDto {
    fn from(conflict: &SlotConflict) -> Self {
        Self {
            time_start: conflict.slot.time_start().to_string(),
            time_end:   conflict.slot.time_end().to_string(),
            accepted:   to_dtos(&conflict.accepted),
        }
    }
}

/// 重複判定の結果 DTO
#[derive(Debug, Serialize)]
pub struct ConflictCheckDto {
    pub has_conflict: bool,
}
