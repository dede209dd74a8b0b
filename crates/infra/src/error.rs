//! # インフラ層エラー定義
//!
//! 予約ストアや外部サービスとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **ドメインエラーとの分離**: インフラ固有のエラーを明示
//! - **ログ可能性**: Debug によりログ出力時に詳細情報を表示
//! - **SpanTrace 自動捕捉**: convenience constructor でエラー生成時の
//!   呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（NotFound, Unavailable 等）

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
///
/// ## パターンマッチ
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::NotFound { entity, id } => { /* 未検出 */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// 更新対象の行が存在しない
    #[error("対象が見つかりません: {entity}(id={id})")]
    NotFound {
        /// エンティティ名（例: "Appointment"）
        entity: String,
        /// エンティティの ID
        id:     String,
    },

    /// ストア・外部サービスに到達できない
    #[error("サービスを利用できません: {0}")]
    Unavailable(String),

    /// 予期しないエラー
    ///
    /// 上記に分類できない予期しないエラー（保存データの破損など）。
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// InfraError を分解して InfraErrorKind と SpanTrace を取り出す
    pub fn into_parts(self) -> (InfraErrorKind, SpanTrace) {
        (self.kind, self.span_trace)
    }

    // ===== Convenience constructors =====

    /// 未検出エラーを生成する
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::NotFound {
                entity: entity.into(),
                id:     id.into(),
            },
            span_trace: SpanTrace::capture(),
        }
    }

    /// 利用不可エラーを生成する
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unavailable(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unexpected(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}
