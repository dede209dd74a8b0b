//! キャンセル済み予約の再有効化

use nutriagenda_domain::appointment::{Appointment, AppointmentStatus};
use nutriagenda_shared::{event_log::event, log_business_event};

use crate::{
    error::CoreError,
    usecase::{appointment::AppointmentUseCaseImpl, helpers::siblings_with_status},
};

const RESOLVE_CONFLICT_FIRST: &str =
    "Já existe outra consulta aceita neste horário. Resolva o conflito antes de reativar.";

impl AppointmentUseCaseImpl {
    /// キャンセル済みの予約を確定済みに戻す
    ///
    /// 申込中には戻さない。同じ枠に確定済みの予約があれば拒否し、
    /// 重複解消（[`resolve_conflict`](Self::resolve_conflict)）を促す。
    #[tracing::instrument(skip_all, fields(appointment_id = %id))]
    pub async fn reactivate_appointment(&self, id: &str) -> Result<Appointment, CoreError> {
        let now = self.clock.now();

        // 1. 予約を取得し、遷移可能か確認
        let reactivated = self.load_appointment(id).await?.reactivated(now)?;

        // 2. 同じ枠の確定済み予約を確認
        let same_day = self
            .repo
            .find_by_date(reactivated.date(), reactivated.nutritionist_id())
            .await?;
        if siblings_with_status(&reactivated, &same_day, AppointmentStatus::Accepted)
            .next()
            .is_some()
        {
            tracing::debug!("同じ枠に確定済みの予約があるため再有効化を拒否");
            return Err(CoreError::validation(RESOLVE_CONFLICT_FIRST));
        }

        // 3. 書き込みと再取得
        let appointment = self.persist_status(&reactivated).await?;

        log_business_event!(
            event.category = event::category::APPOINTMENT,
            event.action = event::action::APPOINTMENT_REACTIVATED,
            event.entity_type = event::entity_type::APPOINTMENT,
            event.entity_id = %appointment.id(),
            event.actor_id = %appointment.nutritionist_id(),
            event.result = event::result::SUCCESS,
            "予約再有効化"
        );

        Ok(appointment)
    }
}
