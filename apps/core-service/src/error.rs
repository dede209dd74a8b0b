//! # Core Service エラー定義
//!
//! 予約ユースケースのエラー分類と、HTTP レスポンスへの変換を定義する。
//!
//! ## 分類
//!
//! | バリアント | 意味 | HTTP |
//! |-----------|------|------|
//! | [`CoreError::Validation`] | 呼び出し側で修正可能な前提条件違反（未検出を含む） | 400 |
//! | [`CoreError::Repository`] | 予約ストアの障害（そのまま伝播） | 500 |
//!
//! `Validation` のメッセージは利用者にそのまま表示できる最終文言。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nutriagenda_domain::DomainError;
use nutriagenda_infra::InfraError;
use nutriagenda_shared::{ErrorResponse, event_log::error as log_error};
use thiserror::Error;

/// Core Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// バリデーションエラー
    #[error("{0}")]
    Validation(String),

    /// 予約ストアエラー
    #[error("予約ストアエラー: {0}")]
    Repository(#[from] InfraError),
}

impl CoreError {
    /// バリデーションエラーを生成する
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<DomainError> for CoreError {
    fn from(error: DomainError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = match &self {
            CoreError::Validation(message) => ErrorResponse::validation_error(message.clone()),
            CoreError::Repository(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::STORE,
                    span_trace = %e.span_trace(),
                    "予約ストアエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
