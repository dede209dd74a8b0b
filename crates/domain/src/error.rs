//! # ドメイン層エラー定義
//!
//! ビジネスルール違反を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **メッセージは最終形**: `Display` の出力はそのまま利用者に表示できる文言とし、
//!   呼び出し側で加工・再マッピングしない
//! - **型による分類**: 状態遷移違反は遷移元・遷移先を保持し、テストや
//!   ログで判別できるようにする
//!
//! ## 使用例
//!
//! ```rust
//! use nutriagenda_domain::DomainError;
//!
//! let error = DomainError::Validation("Data inválida.".to_string());
//! assert_eq!(error.to_string(), "Data inválida.");
//! ```

use thiserror::Error;

use crate::appointment::AppointmentStatus;

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 必須フィールドが空
    /// - 週末・過去日の予約
    /// - カタログに存在しない予約枠
    #[error("{0}")]
    Validation(String),

    /// 不正な状態遷移
    ///
    /// 予約のステータスが遷移元として許可されていない場合に使用する。
    /// `message` は利用者向けの最終文言。
    #[error("{message}")]
    InvalidStatusTransition {
        /// 現在のステータス
        from:    AppointmentStatus,
        /// 要求された遷移先
        to:      AppointmentStatus,
        /// 利用者向けメッセージ
        message: &'static str,
    },
}

impl DomainError {
    /// バリデーションエラーを生成する
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
