//! 予約ハンドラの状態変更操作
//!
//! ユースケースが成功した後にだけ通知を送る。通知の失敗はレスポンスに影響しない。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nutriagenda_domain::{
    appointment::Appointment,
    notification::{AppointmentNotification, NotificationEventType},
};
use nutriagenda_shared::ApiResponse;

use super::{
    AcceptedAppointmentDto,
    AppointmentDto,
    AppointmentState,
    RequestAppointmentRequest,
    ResolvedConflictDto,
};
use crate::{error::CoreError, usecase::RequestAppointmentInput};

/// 予約を申し込む
///
/// ## エンドポイント
/// POST /appointments
pub async fn request_appointment(
    State(state): State<Arc<AppointmentState>>,
    Json(req): Json<RequestAppointmentRequest>,
) -> Result<Response, CoreError> {
    let input = RequestAppointmentInput {
        patient_id:      req.patient_id,
        nutritionist_id: req.nutritionist_id,
        date:            req.date,
        time_start:      req.time_start,
        time_end:        req.time_end,
        observations:    req.observations,
    };

    let appointment = state.usecase.request_appointment(input).await?;

    state
        .notifications
        .notify(AppointmentNotification::new(
            NotificationEventType::Requested,
            &appointment,
        ))
        .await;

    let response = ApiResponse::new(AppointmentDto::from(&appointment));
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// 申込中の予約を確定する
///
/// ## エンドポイント
/// POST /appointments/{id}/accept
pub async fn accept_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(id): Path<String>,
) -> Result<Response, CoreError> {
    let result = state.usecase.accept_appointment(&id).await?;

    state
        .notifications
        .notify(AppointmentNotification::new(
            NotificationEventType::Accepted,
            &result.appointment,
        ))
        .await;
    for rejected in &result.auto_rejected {
        state
            .notifications
            .notify(AppointmentNotification::new(
                NotificationEventType::AutoRejected,
                rejected,
            ))
            .await;
    }

    let response = ApiResponse::new(AcceptedAppointmentDto::from(&result));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 申込中の予約を拒否する
///
/// ## エンドポイント
/// POST /appointments/{id}/reject
pub async fn reject_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(id): Path<String>,
) -> Result<Response, CoreError> {
    let appointment = state.usecase.reject_appointment(&id).await?;
    respond_with_notification(&state, NotificationEventType::Rejected, appointment).await
}

/// 予約をキャンセルする
///
/// ## エンドポイント
/// POST /appointments/{id}/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(id): Path<String>,
) -> Result<Response, CoreError> {
    let appointment = state.usecase.cancel_appointment(&id).await?;
    respond_with_notification(&state, NotificationEventType::Cancelled, appointment).await
}

/// キャンセル済みの予約を再有効化する
///
/// ## エンドポイント
/// POST /appointments/{id}/reactivate
pub async fn reactivate_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(id): Path<String>,
) -> Result<Response, CoreError> {
    let appointment = state.usecase.reactivate_appointment(&id).await?;
    respond_with_notification(&state, NotificationEventType::Reactivated, appointment).await
}

/// 枠の重複を解消する
///
/// ## エンドポイント
/// POST /appointments/{id}/resolve-conflict
pub async fn resolve_conflict(
    State(state): State<Arc<AppointmentState>>,
    Path(id): Path<String>,
) -> Result<Response, CoreError> {
    let result = state.usecase.resolve_conflict(&id).await?;

    for demoted in &result.demoted {
        state
            .notifications
            .notify(AppointmentNotification::new(
                NotificationEventType::Cancelled,
                demoted,
            ))
            .await;
    }
    if result.promoted {
        state
            .notifications
            .notify(AppointmentNotification::new(
                NotificationEventType::Accepted,
                &result.appointment,
            ))
            .await;
    }

    let response = ApiResponse::new(ResolvedConflictDto::from(&result));
    Ok((StatusCode::OK, Json(response)).into_response())
}

async fn respond_with_notification(
    state: &AppointmentState,
    event_type: NotificationEventType,
    appointment: Appointment,
) -> Result<Response, CoreError> {
    state
        .notifications
        .notify(AppointmentNotification::new(event_type, &appointment))
        .await;

    let response = ApiResponse::new(AppointmentDto::from(&appointment));
    Ok((StatusCode::OK, Json(response)).into_response())
}
