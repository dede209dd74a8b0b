use chrono::{NaiveDate, NaiveDateTime};

use super::{AppointmentId, AppointmentStatus};
use crate::{
    DomainError,
    slot::SlotWindow,
    value_objects::{NutritionistId, PatientId},
};

/// 予約エンティティ
///
/// 患者 1 名・栄養士 1 名・日付・予約枠の組を表す。
/// 当事者・日付・枠は作成後に変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    id: AppointmentId,
    patient_id: PatientId,
    nutritionist_id: NutritionistId,
    date: NaiveDate,
    slot: SlotWindow,
    status: AppointmentStatus,
    observations: Option<String>,
    calendar_event_id_patient: Option<String>,
    calendar_event_id_nutritionist: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// 予約の新規作成パラメータ
pub struct NewAppointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub nutritionist_id: NutritionistId,
    pub date: NaiveDate,
    pub slot: SlotWindow,
    pub observations: Option<String>,
    pub now: NaiveDateTime,
}

/// 予約の DB 復元パラメータ
pub struct AppointmentRecord {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub nutritionist_id: NutritionistId,
    pub date: NaiveDate,
    pub slot: SlotWindow,
    pub status: AppointmentStatus,
    pub observations: Option<String>,
    pub calendar_event_id_patient: Option<String>,
    pub calendar_event_id_nutritionist: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// 新しい予約を作成する（ステータスは `Pending`）
    ///
    /// 備考は前後の空白を除去し、空なら `None` として扱う。
    pub fn new(params: NewAppointment) -> Self {
        Self {
            id: params.id,
            patient_id: params.patient_id,
            nutritionist_id: params.nutritionist_id,
            date: params.date,
            slot: params.slot,
            status: AppointmentStatus::Pending,
            observations: params
                .observations
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            calendar_event_id_patient: None,
            calendar_event_id_nutritionist: None,
            created_at: params.now,
            updated_at: params.now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: AppointmentRecord) -> Self {
        Self {
            id: record.id,
            patient_id: record.patient_id,
            nutritionist_id: record.nutritionist_id,
            date: record.date,
            slot: record.slot,
            status: record.status,
            observations: record.observations,
            calendar_event_id_patient: record.calendar_event_id_patient,
            calendar_event_id_nutritionist: record.calendar_event_id_nutritionist,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// 保存用のレコードに変換する
    pub fn into_record(self) -> AppointmentRecord {
        AppointmentRecord {
            id: self.id,
            patient_id: self.patient_id,
            nutritionist_id: self.nutritionist_id,
            date: self.date,
            slot: self.slot,
            status: self.status,
            observations: self.observations,
            calendar_event_id_patient: self.calendar_event_id_patient,
            calendar_event_id_nutritionist: self.calendar_event_id_nutritionist,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &AppointmentId {
        &self.id
    }

    pub fn patient_id(&self) -> &PatientId {
        &self.patient_id
    }

    pub fn nutritionist_id(&self) -> &NutritionistId {
        &self.nutritionist_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn slot(&self) -> SlotWindow {
        self.slot
    }

    pub fn time_start(&self) -> &'static str {
        self.slot.time_start()
    }

    pub fn time_end(&self) -> &'static str {
        self.slot.time_end()
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn observations(&self) -> Option<&str> {
        self.observations.as_deref()
    }

    pub fn calendar_event_id_patient(&self) -> Option<&str> {
        self.calendar_event_id_patient.as_deref()
    }

    pub fn calendar_event_id_nutritionist(&self) -> Option<&str> {
        self.calendar_event_id_nutritionist.as_deref()
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    /// 指定された予約枠を占める予約か
    pub fn is_in_slot(&self, slot: &SlotWindow) -> bool {
        self.slot == *slot
    }

    /// 同じ栄養士・日付・予約枠の別の予約か
    pub fn is_sibling_of(&self, other: &Appointment) -> bool {
        self.id != other.id
            && self.nutritionist_id == other.nutritionist_id
            && self.date == other.date
            && self.slot == other.slot
    }

    /// 一覧表示用のソートキー（日付, 開始時刻）
    pub fn schedule_key(&self) -> (NaiveDate, &'static str) {
        (self.date, self.slot.time_start())
    }

    // 状態遷移メソッド

    /// 予約を確定する
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStatusTransition`: 申込中以外の場合
    pub fn accepted(self, now: NaiveDateTime) -> Result<Self, DomainError> {
        self.transition(
            &[AppointmentStatus::Pending],
            AppointmentStatus::Accepted,
            "Apenas consultas pendentes podem ser aceitas.",
            now,
        )
    }

    /// 予約を拒否する
    ///
    /// 栄養士による拒否と、枠の取り合いに負けた申込の自動拒否の両方で使う。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStatusTransition`: 申込中以外の場合
    pub fn rejected(self, now: NaiveDateTime) -> Result<Self, DomainError> {
        self.transition(
            &[AppointmentStatus::Pending],
            AppointmentStatus::Rejected,
            "Apenas consultas pendentes podem ser recusadas.",
            now,
        )
    }

    /// 予約をキャンセルする
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStatusTransition`: 申込中・確定以外の場合
    pub fn cancelled(self, now: NaiveDateTime) -> Result<Self, DomainError> {
        self.transition(
            &[AppointmentStatus::Pending, AppointmentStatus::Accepted],
            AppointmentStatus::Cancelled,
            "Apenas consultas pendentes ou aceitas podem ser canceladas.",
            now,
        )
    }

    /// キャンセル済みの予約を確定状態に戻す
    ///
    /// 申込中には戻さず、直接 `Accepted` にする。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStatusTransition`: キャンセル済み以外の場合
    pub fn reactivated(self, now: NaiveDateTime) -> Result<Self, DomainError> {
        self.transition(
            &[AppointmentStatus::Cancelled],
            AppointmentStatus::Accepted,
            "Apenas consultas canceladas podem ser reativadas.",
            now,
        )
    }

    /// 競合解消で確定させる
    ///
    /// 既に確定済みの場合は変更しない（`updated_at` も据え置き）。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStatusTransition`: 確定・キャンセル済み以外の場合
    pub fn promoted_by_resolution(self, now: NaiveDateTime) -> Result<Self, DomainError> {
        if self.status == AppointmentStatus::Accepted {
            return Ok(self);
        }
        self.transition(
            &[AppointmentStatus::Cancelled],
            AppointmentStatus::Accepted,
            "Apenas consultas aceitas ou canceladas podem ter o conflito resolvido.",
            now,
        )
    }

    /// 競合解消で確定状態から外す
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStatusTransition`: 確定以外の場合
    pub fn demoted_by_resolution(self, now: NaiveDateTime) -> Result<Self, DomainError> {
        self.transition(
            &[AppointmentStatus::Accepted],
            AppointmentStatus::Cancelled,
            "Apenas consultas aceitas podem ser canceladas na resolução de conflito.",
            now,
        )
    }

    fn transition(
        self,
        allowed_from: &[AppointmentStatus],
        to: AppointmentStatus,
        message: &'static str,
        now: NaiveDateTime,
    ) -> Result<Self, DomainError> {
        if !allowed_from.contains(&self.status) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to,
                message,
            });
        }

        Ok(Self {
            status: to,
            updated_at: now,
            ..self
        })
    }
}
