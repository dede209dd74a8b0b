//! 予約のキャンセル

use nutriagenda_domain::appointment::Appointment;
use nutriagenda_shared::{event_log::event, log_business_event};

use crate::{error::CoreError, usecase::appointment::AppointmentUseCaseImpl};

impl AppointmentUseCaseImpl {
    /// 申込中または確定済みの予約をキャンセルする
    #[tracing::instrument(skip_all, fields(appointment_id = %id))]
    pub async fn cancel_appointment(&self, id: &str) -> Result<Appointment, CoreError> {
        let now = self.clock.now();

        let cancelled = self.load_appointment(id).await?.cancelled(now)?;
        let appointment = self.persist_status(&cancelled).await?;

        log_business_event!(
            event.category = event::category::APPOINTMENT,
            event.action = event::action::APPOINTMENT_CANCELLED,
            event.entity_type = event::entity_type::APPOINTMENT,
            event.entity_id = %appointment.id(),
            event.actor_id = %appointment.nutritionist_id(),
            event.result = event::result::SUCCESS,
            "予約キャンセル"
        );

        Ok(appointment)
    }
}
