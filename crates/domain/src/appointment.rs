//! # 予約
//!
//! 患者が栄養士に申し込む診療予約と、そのステータス遷移を管理する。
//!
//! ## 状態遷移
//!
//! ```text
//!            accept                 cancel
//! Pending ──────────▶ Accepted ──────────▶ Cancelled
//!    │                  ▲   ▲                  │
//!    │ reject           │   └──── reactivate ──┘
//!    ▼                  │
//! Rejected              └──── resolve conflict（Accepted / Cancelled から）
//! ```
//!
//! - `Pending` からは `Cancelled` にも直接遷移できる
//! - `Rejected` は終端状態
//! - 予約は削除されない（拒否・キャンセルは終端ステータスで表現する）
//!
//! ## 不変条件
//!
//! 同一の栄養士・日付・予約枠に対して `Accepted` の予約は高々 1 件。
//! この性質はユースケース層の競合チェックと自動拒否で維持する。
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::NaiveDate;
//! use nutriagenda_domain::{
//!     appointment::{Appointment, AppointmentId, AppointmentStatus, NewAppointment},
//!     slot::SlotWindow,
//!     value_objects::{NutritionistId, PatientId},
//! };
//!
//! let now = NaiveDate::from_ymd_opt(2030, 1, 4).unwrap().and_hms_opt(8, 0, 0).unwrap();
//! let appointment = Appointment::new(NewAppointment {
//!     id: AppointmentId::new(),
//!     patient_id: PatientId::new("p1")?,
//!     nutritionist_id: NutritionistId::new("n1")?,
//!     date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
//!     slot: SlotWindow::from_catalog("09:00", "11:00")?,
//!     observations: None,
//!     now,
//! });
//! assert_eq!(appointment.status(), AppointmentStatus::Pending);
//!
//! let accepted = appointment.accepted(now)?;
//! assert_eq!(accepted.status(), AppointmentStatus::Accepted);
//! # Ok(())
//! # }
//! ```

mod entity;
mod status;

pub use entity::*;
pub use status::*;
