//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換や兄弟予約の絞り込みなど、
//! 複数のユースケースで繰り返されるパターンを共通化する。

use nutriagenda_domain::{
    appointment::{Appointment, AppointmentStatus},
    value_objects::{NutritionistId, PatientId},
};
use nutriagenda_infra::InfraError;

use crate::error::CoreError;

/// 予約が見つからない場合のメッセージ
pub(crate) const APPOINTMENT_NOT_FOUND: &str = "Consulta não encontrada.";

/// 更新後に予約を再取得できなかった場合のメッセージ
pub(crate) const APPOINTMENT_NOT_FOUND_AFTER_UPDATE: &str =
    "Consulta não encontrada após a atualização.";

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// `None` は利用者に表示するメッセージ付きの `CoreError::Validation`、
/// `InfraError` はそのまま `CoreError::Repository` になる。
///
/// ```ignore
/// let appointment = self.repo.find_by_id(&id).await
///     .or_not_found(APPOINTMENT_NOT_FOUND)?;
/// ```
pub(crate) trait FindResultExt<T> {
    fn or_not_found(self, message: &str) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, message: &str) -> Result<T, CoreError> {
        self?.ok_or_else(|| CoreError::validation(message))
    }
}

/// 文字列の患者 ID をパースする
pub(crate) fn parse_patient_id(value: &str) -> Result<PatientId, CoreError> {
    Ok(PatientId::new(value)?)
}

/// 文字列の栄養士 ID をパースする
pub(crate) fn parse_nutritionist_id(value: &str) -> Result<NutritionistId, CoreError> {
    Ok(NutritionistId::new(value)?)
}

/// 同じ栄養士・日付・枠の他の予約のうち、指定ステータスのものを返す
pub(crate) fn siblings_with_status<'a>(
    target: &'a Appointment,
    same_day: &'a [Appointment],
    status: AppointmentStatus,
) -> impl Iterator<Item = &'a Appointment> + 'a {
    same_day
        .iter()
        .filter(move |other| other.status() == status && other.is_sibling_of(target))
}
