//! # NutriAgenda ドメイン層
//!
//! 栄養士1名の診療予約を扱うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（[`appointment::Appointment`]）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（[`slot::SlotWindow`],
//!   [`value_objects::PatientId`] など）
//! - **状態遷移**: 遷移メソッドは `self` を消費し、新しいエンティティを返す
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（ストア、通知配信）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`appointment`] - 予約エンティティと状態機械
//! - [`slot`] - 固定の予約枠カタログと日付ヘルパー
//! - [`validation`] - 共通の入力検証ヘルパー
//! - [`notification`] - プッシュ通知のドメインモデル
//! - [`clock`] - 時刻プロバイダ
//!
//! ## 使用例
//!
//! ```rust
//! use nutriagenda_domain::{DomainError, value_objects::PatientId};
//!
//! let patient_id = PatientId::new("p1").unwrap();
//! assert_eq!(patient_id.as_str(), "p1");
//!
//! let error = PatientId::new("   ").unwrap_err();
//! assert!(matches!(error, DomainError::Validation(_)));
//! ```

#[macro_use]
mod macros;

pub mod appointment;
pub mod clock;
pub mod error;
pub mod notification;
pub mod slot;
pub mod validation;
pub mod value_objects;

pub use error::DomainError;
