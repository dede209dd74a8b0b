//! # 予約ユースケース
//!
//! 予約の申込・確定・拒否・キャンセル・再有効化と、
//! 枠の重複検出・解消、空き枠やアジェンダの照会を実装する。
//!
//! ## 処理の流れ
//!
//! 1. 予約ストアから現在の状態を読む
//! 2. ドメインの状態遷移とビジネスルールで検証する（最初の違反で失敗）
//! 3. 新しいステータスを書き込む
//! 4. 書き込み後に再取得した値を返す
//!
//! 通知やカレンダー同期はユースケースの戻り値を見て呼び出し側が行う。

mod command;
mod conflict;
mod query;

use std::sync::Arc;

use chrono::NaiveDate;
use nutriagenda_domain::{appointment::Appointment, clock::Clock, slot::SlotWindow};
use nutriagenda_infra::repository::AppointmentRepository;

/// 予約ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// 当日予約で開始時刻を過ぎた枠を拒否する
    pub same_day_cutoff:       bool,
    /// アジェンダの既定の表示日数
    pub agenda_window_days:    u32,
    /// 期間指定の空き枠照会で許す最大の日数（終了日 - 開始日）
    pub availability_max_days: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            same_day_cutoff:       true,
            agenda_window_days:    30,
            availability_max_days: 90,
        }
    }
}

/// 予約申込入力
///
/// 呼び出し側から受け取ったプリミティブな値のまま保持し、
/// 検証はユースケース内で順序どおりに行う。
#[derive(Debug, Clone, Default)]
pub struct RequestAppointmentInput {
    pub patient_id:      String,
    pub nutritionist_id: String,
    /// `YYYY-MM-DD`
    pub date:            String,
    /// `HH:MM`
    pub time_start:      String,
    /// `HH:MM`
    pub time_end:        String,
    pub observations:    Option<String>,
}

/// 予約枠の指定（栄養士・日付・時間帯）
#[derive(Debug, Clone, Default)]
pub struct SlotQuery {
    pub nutritionist_id: String,
    pub date:            String,
    pub time_start:      String,
    pub time_end:        String,
}

/// 予約確定の結果
#[derive(Debug, Clone)]
pub struct AcceptedAppointment {
    /// 確定後に再取得した予約
    pub appointment:   Appointment,
    /// 同じ枠で自動的に拒否された申込
    pub auto_rejected: Vec<Appointment>,
}

/// 重複解消の結果
#[derive(Debug, Clone)]
pub struct ResolvedConflict {
    /// 解消後に再取得した予約（確定済み）
    pub appointment: Appointment,
    /// キャンセルに戻された確定済み予約
    pub demoted:     Vec<Appointment>,
    /// 対象の予約が確定済みに昇格したか
    pub promoted:    bool,
}

/// アジェンダの 1 日分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaDay {
    pub date:         NaiveDate,
    /// 開始時刻の昇順
    pub appointments: Vec<Appointment>,
}

/// 確定済み予約が重複している枠
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConflict {
    pub slot:     SlotWindow,
    pub accepted: Vec<Appointment>,
}

/// 予約ユースケース実装
pub struct AppointmentUseCaseImpl {
    repo:   Arc<dyn AppointmentRepository>,
    clock:  Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl AppointmentUseCaseImpl {
    pub fn new(
        repo: Arc<dyn AppointmentRepository>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            repo,
            clock,
            policy,
        }
    }
}
