//! # ユースケース層
//!
//! 予約のビジネスロジックを実装する。
//! ユースケースは予約ストアだけを読み書きし、通知は呼び出し側が行う。

mod helpers;
pub mod appointment;
pub mod notification;

pub use appointment::{
    AcceptedAppointment,
    AgendaDay,
    AppointmentUseCaseImpl,
    BookingPolicy,
    RequestAppointmentInput,
    ResolvedConflict,
    SlotConflict,
    SlotQuery,
};
pub use notification::NotificationService;
