//! # HTTP ハンドラ
//!
//! 予約ユースケースを HTTP エンドポイントとして公開する薄いアダプタ。
//!
//! レスポンスは `ApiResponse { data }` で包み、エラーは
//! [`CoreError`](crate::error::CoreError) の `IntoResponse` で RFC 7807 形式にする。

pub mod appointment;
pub mod health;

pub use appointment::{
    AppointmentState,
    accept_appointment,
    available_slots,
    available_slots_for_range,
    cancel_appointment,
    check_conflict,
    get_appointment,
    list_agenda,
    list_conflicted_slots,
    list_conflicts_by_slot,
    list_patient_appointments,
    list_pending_by_nutritionist,
    reactivate_appointment,
    reject_appointment,
    request_appointment,
    resolve_conflict,
};
pub use health::health_check;
