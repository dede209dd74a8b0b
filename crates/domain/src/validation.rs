//! # 共通の入力検証
//!
//! 複数の値オブジェクト・ユースケースから使われる検証ヘルパー。

use chrono::NaiveDate;

use crate::DomainError;

/// 前後の空白を除いた値が空でないことを検証する
///
/// 空の場合は `"{label} é obrigatório."` を返す。
pub fn require_non_empty<'a>(value: &'a str, label: &str) -> Result<&'a str, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{label} é obrigatório.")));
    }
    Ok(trimmed)
}

/// 日付範囲の開始が終了以前であることを検証する
pub fn require_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), DomainError> {
    if start > end {
        return Err(DomainError::validation(
            "A data inicial deve ser anterior ou igual à data final.",
        ));
    }
    Ok(())
}
