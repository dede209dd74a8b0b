//! # 値オブジェクト
//!
//! 予約の当事者を識別する値オブジェクトを定義する。
//!
//! 患者・栄養士の ID は外部の認証基盤が発行する不透明な文字列であり、
//! 形式は検証せず、空でないこととサイズ上限のみを保証する。

/// ID の最大文字数
const PARTY_ID_MAX_LENGTH: usize = 128;

define_validated_string! {
    /// 患者 ID
    pub struct PatientId {
        label: "ID do paciente",
        max_length: PARTY_ID_MAX_LENGTH,
    }
}

define_validated_string! {
    /// 栄養士 ID
    pub struct NutritionistId {
        label: "ID do nutricionista",
        max_length: PARTY_ID_MAX_LENGTH,
    }
}
