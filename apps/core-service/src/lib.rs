//! # Core Service ライブラリ
//!
//! 予約ユースケース、HTTP ハンドラ、アプリケーション構築を公開する。
//! 統合テストからも同じ構成でルーターを組み立てられるようにする。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
