//! # 予約枠カタログ
//!
//! 栄養士が予約を受け付ける固定の時間枠と、日付に関するヘルパーを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`SlotWindow`] | 予約枠 | カタログに登録された `HH:MM`〜`HH:MM` の時間帯 |
//! | [`TimeSlot`] | 空き枠 | 特定日付の予約枠と空き状況（保存されない） |
//!
//! ## 設計方針
//!
//! - **カタログ経由でのみ生成**: [`SlotWindow`] はカタログの要素からしか作れないため、
//!   予約に保存される枠は常にカタログと一致する
//! - **純粋関数**: 状態を持たず、失敗しない（日付のパースを除く）

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 1 日の予約枠（開始時刻順）
const CATALOG: [SlotWindow; 4] = [
    SlotWindow::catalog_entry("09:00", "11:00"),
    SlotWindow::catalog_entry("11:00", "13:00"),
    SlotWindow::catalog_entry("14:00", "16:00"),
    SlotWindow::catalog_entry("16:00", "18:00"),
];

/// 予約枠
///
/// `time_start` / `time_end` は `HH:MM` 形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotWindow {
    time_start: &'static str,
    time_end:   &'static str,
}

impl SlotWindow {
    const fn catalog_entry(time_start: &'static str, time_end: &'static str) -> Self {
        Self {
            time_start,
            time_end,
        }
    }

    /// カタログから開始・終了時刻が完全一致する枠を探す
    ///
    /// 一致しない場合はバリデーションエラー。
    pub fn from_catalog(time_start: &str, time_end: &str) -> Result<Self, DomainError> {
        catalog()
            .iter()
            .find(|slot| slot.time_start == time_start && slot.time_end == time_end)
            .copied()
            .ok_or_else(|| {
                DomainError::validation("Horário inválido. Selecione um dos horários disponíveis.")
            })
    }

    pub fn time_start(&self) -> &'static str {
        self.time_start
    }

    pub fn time_end(&self) -> &'static str {
        self.time_end
    }

    /// 指定された開始・終了時刻がこの枠と一致するか
    pub fn matches(&self, time_start: &str, time_end: &str) -> bool {
        self.time_start == time_start && self.time_end == time_end
    }

    /// 開始時刻を [`NaiveTime`] として返す
    pub fn start_time(&self) -> NaiveTime {
        // カタログの値は定数なのでパースは失敗しない
        parse_slot_time(self.time_start).unwrap_or(NaiveTime::MIN)
    }
}

impl<'de> Deserialize<'de> for SlotWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            time_start: String,
            time_end:   String,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::from_catalog(&raw.time_start, &raw.time_end).map_err(serde::de::Error::custom)
    }
}

/// 予約枠カタログ（開始時刻順）
pub fn catalog() -> &'static [SlotWindow] {
    &CATALOG
}

/// 平日（月〜金）かどうか
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 日付を `YYYY-MM-DD` 形式に整形する
pub fn format_date_to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD` 形式の文字列を日付に変換する
///
/// 空文字・区切り文字 `-` を含まない文字列・存在しない日付はバリデーションエラー。
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, DomainError> {
    let value = crate::validation::require_non_empty(value, "Data")?;
    if !value.contains('-') {
        return Err(invalid_date(value));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid_date(value))
}

fn invalid_date(value: &str) -> DomainError {
    DomainError::Validation(format!("Data inválida: {value}. Use o formato AAAA-MM-DD."))
}

/// `HH:MM` 形式の時刻をパースする
///
/// 数字以外・範囲外の値は `None`。
pub fn parse_slot_time(value: &str) -> Option<NaiveTime> {
    let (hour, minute) = value.split_once(':')?;
    if hour.len() != 2 || minute.len() != 2 {
        return None;
    }
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// 空き枠
///
/// 空き状況の問い合わせ結果としてのみ生成され、保存されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub date:       NaiveDate,
    pub time_start: &'static str,
    pub time_end:   &'static str,
    pub available:  bool,
}

impl TimeSlot {
    /// 空きとしての枠を作成する
    pub fn available(date: NaiveDate, slot: SlotWindow) -> Self {
        Self {
            date,
            time_start: slot.time_start(),
            time_end: slot.time_end(),
            available: true,
        }
    }
}
