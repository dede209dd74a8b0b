//! # NutriAgenda インフラ層
//!
//! 予約ストアと通知配信の具体的な実装を提供するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはユースケース層が消費するインターフェース（リポジトリトレイト、
//! 通知送信トレイト）と、その具体的な実装を提供する。外部システムの詳細を
//! カプセル化し、ユースケースをストアの変更から保護する。
//!
//! ## 責務
//!
//! - **予約ストア**: 予約の CRUD・検索・変更購読（[`repository`]）
//! - **プッシュ通知**: 通知送信の抽象化と Noop 実装（[`notification`]）
//!
//! ## 依存関係
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - 予約ストア
//! - [`notification`] - プッシュ通知送信
//! - `mock` - テスト用モック（`test-utils` feature）

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
