//! 予約ユースケースの状態変更操作

mod decision;
mod lifecycle;
mod request;

use nutriagenda_domain::appointment::{Appointment, AppointmentId};

use super::AppointmentUseCaseImpl;
use crate::{
    error::CoreError,
    usecase::helpers::{
        APPOINTMENT_NOT_FOUND,
        APPOINTMENT_NOT_FOUND_AFTER_UPDATE,
        FindResultExt,
    },
};

impl AppointmentUseCaseImpl {
    /// 文字列の予約 ID をパースして予約を取得する
    pub(super) async fn load_appointment(&self, id: &str) -> Result<Appointment, CoreError> {
        let id: AppointmentId = id.parse()?;
        self.repo
            .find_by_id(&id)
            .await
            .or_not_found(APPOINTMENT_NOT_FOUND)
    }

    /// 遷移後のステータスを書き込み、ストアから再取得して返す
    ///
    /// 書き込み前のメモリ上の値ではなく、再取得した値を返す。
    pub(super) async fn persist_status(
        &self,
        transitioned: &Appointment,
    ) -> Result<Appointment, CoreError> {
        self.repo
            .update_status(
                transitioned.id(),
                transitioned.status(),
                transitioned.updated_at(),
            )
            .await?;

        self.reload(transitioned).await
    }

    /// 書き込み後の予約をストアから再取得する
    pub(super) async fn reload(&self, written: &Appointment) -> Result<Appointment, CoreError> {
        self.repo
            .find_by_id(written.id())
            .await
            .or_not_found(APPOINTMENT_NOT_FOUND_AFTER_UPDATE)
    }
}
