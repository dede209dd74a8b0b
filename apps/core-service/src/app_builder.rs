//! # ルーター構築
//!
//! 予約 API のルーティングとミドルウェアを組み立てる。
//! `main` と統合テストが同じ構成のルーターを使う。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use nutriagenda_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handler::{
    AppointmentState,
    accept_appointment,
    available_slots,
    available_slots_for_range,
    cancel_appointment,
    check_conflict,
    get_appointment,
    health_check,
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

/// ルーターを構築する
///
/// ミドルウェアは外側から次の順に適用される。
///
/// 1. `SetRequestIdLayer`: `X-Request-Id` がなければ UUID v7 を生成
/// 2. `TraceLayer`: Request ID 付きのリクエストスパンを作成
/// 3. `PropagateRequestIdLayer`: レスポンスヘッダーに `X-Request-Id` をコピー
pub fn build_app(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/appointments", post(request_appointment))
        .route("/appointments/{id}", get(get_appointment))
        .route("/appointments/{id}/accept", post(accept_appointment))
        .route("/appointments/{id}/reject", post(reject_appointment))
        .route("/appointments/{id}/cancel", post(cancel_appointment))
        .route("/appointments/{id}/reactivate", post(reactivate_appointment))
        .route("/appointments/{id}/resolve-conflict", post(resolve_conflict))
        .route(
            "/patients/{patient_id}/appointments",
            get(list_patient_appointments),
        )
        .route(
            "/nutritionists/{id}/available-slots",
            get(available_slots),
        )
        .route(
            "/nutritionists/{id}/available-slots/range",
            get(available_slots_for_range),
        )
        .route("/nutritionists/{id}/agenda", get(list_agenda))
        .route(
            "/nutritionists/{id}/pending",
            get(list_pending_by_nutritionist),
        )
        .route(
            "/nutritionists/{id}/conflicts",
            get(list_conflicts_by_slot),
        )
        .route("/nutritionists/{id}/conflicts/check", get(check_conflict))
        .route(
            "/nutritionists/{id}/conflicted-slots",
            get(list_conflicted_slots),
        )
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
