//! 予約ハンドラの照会操作

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nutriagenda_domain::slot::format_date_to_iso;
use nutriagenda_shared::ApiResponse;

use super::{
    AgendaDayDto,
    AgendaQuery,
    AppointmentDto,
    AppointmentState,
    ConflictCheckDto,
    DateQuery,
    DateRangeQuery,
    SlotConflictDto,
    SlotConflictQuery,
    TimeSlotDto,
    to_dtos,
};
use crate::{error::CoreError, usecase::SlotQuery};

/// 予約を取得する
///
/// ## エンドポイント
/// GET /appointments/{id}
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(id): Path<String>,
) -> Result<Response, CoreError> {
    let appointment = state.usecase.get_appointment(&id).await?;

    let response = ApiResponse::new(AppointmentDto::from(&appointment));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 患者の予約一覧
///
/// ## エンドポイント
/// GET /patients/{patient_id}/appointments
pub async fn list_patient_appointments(
    State(state): State<Arc<AppointmentState>>,
    Path(patient_id): Path<String>,
) -> Result<Response, CoreError> {
    let appointments = state.usecase.list_patient_appointments(&patient_id).await?;

    let response = ApiResponse::new(to_dtos(&appointments));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 指定日の空き枠
///
/// ## エンドポイント
/// GET /nutritionists/{id}/available-slots?date=
pub async fn available_slots(
    State(state): State<Arc<AppointmentState>>,
    Path(nutritionist_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Response, CoreError> {
    let slots = state
        .usecase
        .available_slots(&query.date, &nutritionist_id)
        .await?;

    let response = ApiResponse::new(slots.iter().map(TimeSlotDto::from).collect::<Vec<_>>());
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 期間内の平日ごとの空き枠
///
/// ## エンドポイント
/// GET /nutritionists/{id}/available-slots/range?start=&end=
pub async fn available_slots_for_range(
    State(state): State<Arc<AppointmentState>>,
    Path(nutritionist_id): Path<String>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, CoreError> {
    let by_date = state
        .usecase
        .available_slots_for_range(&query.start, &query.end, &nutritionist_id)
        .await?;

    let body: BTreeMap<String, Vec<TimeSlotDto>> = by_date
        .iter()
        .map(|(date, slots)| {
            (
                format_date_to_iso(*date),
                slots.iter().map(TimeSlotDto::from).collect(),
            )
        })
        .collect();

    Ok((StatusCode::OK, Json(ApiResponse::new(body))).into_response())
}

/// 栄養士のアジェンダ
///
/// ## エンドポイント
/// GET /nutritionists/{id}/agenda?start=&end=
pub async fn list_agenda(
    State(state): State<Arc<AppointmentState>>,
    Path(nutritionist_id): Path<String>,
    Query(query): Query<AgendaQuery>,
) -> Result<Response, CoreError> {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let start = non_empty(&query.start);
    let end = non_empty(&query.end);

    let agenda = state
        .usecase
        .list_agenda(&nutritionist_id, start.as_deref(), end.as_deref())
        .await?;

    let response = ApiResponse::new(agenda.iter().map(AgendaDayDto::from).collect::<Vec<_>>());
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 栄養士の申込中の予約一覧
///
/// ## エンドポイント
/// GET /nutritionists/{id}/pending
pub async fn list_pending_by_nutritionist(
    State(state): State<Arc<AppointmentState>>,
    Path(nutritionist_id): Path<String>,
) -> Result<Response, CoreError> {
    let pending = state
        .usecase
        .list_pending_by_nutritionist(&nutritionist_id)
        .await?;

    let response = ApiResponse::new(to_dtos(&pending));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 枠の確定済み・キャンセル済みの予約一覧
///
/// ## エンドポイント
/// GET /nutritionists/{id}/conflicts?date=&time_start=&time_end=
pub async fn list_conflicts_by_slot(
    State(state): State<Arc<AppointmentState>>,
    Path(nutritionist_id): Path<String>,
    Query(query): Query<SlotConflictQuery>,
) -> Result<Response, CoreError> {
    let conflicts = state
        .usecase
        .list_conflicts_by_slot(&slot_query(nutritionist_id, &query))
        .await?;

    let response = ApiResponse::new(to_dtos(&conflicts));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 枠に確定済みの予約があるか
///
/// ## エンドポイント
/// GET /nutritionists/{id}/conflicts/check?date=&time_start=&time_end=&exclude=
pub async fn check_conflict(
    State(state): State<Arc<AppointmentState>>,
    Path(nutritionist_id): Path<String>,
    Query(query): Query<SlotConflictQuery>,
) -> Result<Response, CoreError> {
    let has_conflict = state
        .usecase
        .has_conflict(
            &slot_query(nutritionist_id, &query),
            query.exclude.as_deref(),
        )
        .await?;

    let response = ApiResponse::new(ConflictCheckDto { has_conflict });
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 確定済みの予約が重複している枠の一覧
///
/// ## エンドポイント
/// GET /nutritionists/{id}/conflicted-slots?date=
pub async fn list_conflicted_slots(
    State(state): State<Arc<AppointmentState>>,
    Path(nutritionist_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Response, CoreError> {
    let conflicts = state
        .usecase
        .list_conflicted_slots(&nutritionist_id, &query.date)
        .await?;

    let response = ApiResponse::new(
        conflicts
            .iter()
            .map(SlotConflictDto::from)
            .collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)).into_response())
}

fn slot_query(nutritionist_id: String, query: &SlotConflictQuery) -> SlotQuery {
    SlotQuery {
        nutritionist_id,
        date: query.date.clone(),
        time_start: query.time_start.clone(),
        time_end: query.time_end.clone(),
    }
}
