//! # リポジトリ実装
//!
//! 予約ストア（Appointment Store）の契約と実装を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: ユースケース層はトレイトにのみ依存する
//! - **行単位の原子性**: 更新は 1 行ずつ原子的に適用され、行をまたぐトランザクションはない
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod appointment_repository;
mod subscription;

pub use appointment_repository::{
    AppointmentListener,
    AppointmentRepository,
    CalendarEventIdsUpdate,
    InMemoryAppointmentRepository,
};
pub use subscription::Subscription;
