use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

define_uuid_id! {
    /// 予約 ID（一意識別子）
    ///
    /// 作成時に採番される。UUID v7 を使用。
    pub struct AppointmentId { label: "ID da consulta" }
}

/// 予約ステータス
///
/// snake_case でシリアライズされる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AppointmentStatus {
    /// 申込中: 栄養士の判断待ち
    Pending,
    /// 確定: 枠ごとに高々 1 件
    Accepted,
    /// 拒否: 承認されないまま終了（栄養士の拒否、または枠の取り合いに負けた）
    Rejected,
    /// キャンセル: 申込中または確定後に取り下げられた
    Cancelled,
}

impl AppointmentStatus {
    /// 競合の解消対象となるステータスか
    ///
    /// `Pending` / `Rejected` は枠を塞がず、調整も不要なので対象外。
    pub fn is_conflict_candidate(self) -> bool {
        matches!(self, Self::Accepted | Self::Cancelled)
    }
}
