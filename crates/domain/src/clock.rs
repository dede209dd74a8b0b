//! # Clock（時刻プロバイダ）
//!
//! ユースケース層での `Local::now()` 直接呼び出しを置き換え、
//! テストで固定時刻を注入可能にするための抽象化。
//!
//! 予約枠はクリニックの壁時計（ローカル時刻）で定義されるため、
//! タイムゾーンを持たない [`NaiveDateTime`] を返す。

use chrono::{Local, NaiveDate, NaiveDateTime};

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// 今日の日付
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// 実際のシステム時刻（ローカル）を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    #[test]
    fn test_system_clock_は現在時刻を返す() {
        let clock = SystemClock;
        let before = Local::now().naive_local();
        let result = clock.now();
        let after = Local::now().naive_local();

        assert!(result >= before);
        assert!(result <= after);
    }

    #[test]
    fn test_fixed_clock_はコンストラクタで渡した時刻を返す() {
        let fixed_time = NaiveDate::from_ymd_opt(2030, 1, 7)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let clock = FixedClock::new(fixed_time);

        assert_eq!(clock.now(), fixed_time);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_today_は現在時刻の日付部分を返す() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        let clock = FixedClock::new(date.and_time(NaiveTime::MIN));

        assert_eq!(clock.today(), date);
    }
}
