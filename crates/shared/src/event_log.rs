//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で効率的に調査できるよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.actor_id`: 操作者 ID（患者 ID または栄養士 ID）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const APPOINTMENT: &str = "appointment";
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベントアクション
    pub mod action {
        // 予約
        pub const APPOINTMENT_REQUESTED: &str = "appointment.requested";
        pub const APPOINTMENT_ACCEPTED: &str = "appointment.accepted";
        pub const APPOINTMENT_REJECTED: &str = "appointment.rejected";
        pub const APPOINTMENT_AUTO_REJECTED: &str = "appointment.auto_rejected";
        pub const APPOINTMENT_CANCELLED: &str = "appointment.cancelled";
        pub const APPOINTMENT_REACTIVATED: &str = "appointment.reactivated";
        pub const APPOINTMENT_CONFLICT_RESOLVED: &str = "appointment.conflict_resolved";

        // 通知
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const APPOINTMENT: &str = "appointment";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（予約ストア）
        pub const INFRASTRUCTURE: &str = "infrastructure";
    }

    /// エラー種別
    pub mod kind {
        pub const STORE: &str = "store";
        pub const INTERNAL: &str = "internal";
    }
}
