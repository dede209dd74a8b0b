//! 申込の確定

use std::sync::Arc;

use nutriagenda_domain::appointment::{Appointment, AppointmentStatus};
use nutriagenda_infra::InfraError;
use nutriagenda_shared::{event_log::event, log_business_event};
use tokio::task::JoinSet;

use crate::{
    error::CoreError,
    usecase::{
        appointment::{AcceptedAppointment, AppointmentUseCaseImpl},
        helpers::siblings_with_status,
    },
};

const SLOT_ALREADY_ACCEPTED: &str = "Já existe uma consulta aceita neste horário.";

impl AppointmentUseCaseImpl {
    /// 申込中の予約を確定する
    ///
    /// 同じ枠に確定済みの予約があれば拒否する（待ち行列にはしない）。
    /// 確定後、同じ枠の他の申込中の予約はすべて自動的に拒否される（先着優先）。
    ///
    /// 自動拒否の書き込みは並行に発行し、すべて完了してから
    /// 最初の失敗を返す。
    #[tracing::instrument(skip_all, fields(appointment_id = %id))]
    pub async fn accept_appointment(&self, id: &str) -> Result<AcceptedAppointment, CoreError> {
        let now = self.clock.now();

        // 1. 予約を取得し、遷移可能か確認
        let accepted = self.load_appointment(id).await?.accepted(now)?;

        // 2. 同じ枠の確定済み予約を確認
        let same_day = self
            .repo
            .find_by_date(accepted.date(), accepted.nutritionist_id())
            .await?;
        if siblings_with_status(&accepted, &same_day, AppointmentStatus::Accepted)
            .next()
            .is_some()
        {
            tracing::debug!("同じ枠に確定済みの予約があるため確定を拒否");
            return Err(CoreError::validation(SLOT_ALREADY_ACCEPTED));
        }

        // 3. 確定を書き込む
        self.repo
            .update_status(accepted.id(), accepted.status(), accepted.updated_at())
            .await?;

        // 4. 競合する申込を拒否（確定の書き込み後に読み直す）
        let same_day = self
            .repo
            .find_by_date(accepted.date(), accepted.nutritionist_id())
            .await?;
        let auto_rejected = siblings_with_status(&accepted, &same_day, AppointmentStatus::Pending)
            .cloned()
            .map(|sibling| sibling.rejected(now))
            .collect::<Result<Vec<_>, _>>()?;
        self.write_rejections(&auto_rejected).await?;

        // 5. 確定後の状態を再取得
        let appointment = self.reload(&accepted).await?;

        log_business_event!(
            event.category = event::category::APPOINTMENT,
            event.action = event::action::APPOINTMENT_ACCEPTED,
            event.entity_type = event::entity_type::APPOINTMENT,
            event.entity_id = %appointment.id(),
            event.actor_id = %appointment.nutritionist_id(),
            event.result = event::result::SUCCESS,
            "予約確定"
        );
        for rejected in &auto_rejected {
            log_business_event!(
                event.category = event::category::APPOINTMENT,
                event.action = event::action::APPOINTMENT_AUTO_REJECTED,
                event.entity_type = event::entity_type::APPOINTMENT,
                event.entity_id = %rejected.id(),
                event.actor_id = %rejected.nutritionist_id(),
                event.result = event::result::SUCCESS,
                "競合する申込を自動拒否"
            );
        }

        Ok(AcceptedAppointment {
            appointment,
            auto_rejected,
        })
    }

    /// 拒否の書き込みを並行に発行し、全件の完了を待つ
    async fn write_rejections(&self, rejected: &[Appointment]) -> Result<(), CoreError> {
        let mut tasks = JoinSet::new();
        for appointment in rejected {
            let repo = Arc::clone(&self.repo);
            let id = appointment.id().clone();
            let status = appointment.status();
            let updated_at = appointment.updated_at();
            tasks.spawn(async move { repo.update_status(&id, status, updated_at).await });
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.unwrap_or_else(|e| {
                Err(InfraError::unexpected(format!(
                    "自動拒否の書き込みタスクが失敗しました: {e}"
                )))
            });
            if let Err(e) = result {
                tracing::error!(error = %e, "競合する申込の拒否に失敗");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
