//! 申込の拒否

use nutriagenda_domain::appointment::Appointment;
use nutriagenda_shared::{event_log::event, log_business_event};

use crate::{error::CoreError, usecase::appointment::AppointmentUseCaseImpl};

impl AppointmentUseCaseImpl {
    /// 申込中の予約を拒否する
    ///
    /// 他の予約には影響しない。
    #[tracing::instrument(skip_all, fields(appointment_id = %id))]
    pub async fn reject_appointment(&self, id: &str) -> Result<Appointment, CoreError> {
        let now = self.clock.now();

        let rejected = self.load_appointment(id).await?.rejected(now)?;
        let appointment = self.persist_status(&rejected).await?;

        log_business_event!(
            event.category = event::category::APPOINTMENT,
            event.action = event::action::APPOINTMENT_REJECTED,
            event.entity_type = event::entity_type::APPOINTMENT,
            event.entity_id = %appointment.id(),
            event.actor_id = %appointment.nutritionist_id(),
            event.result = event::result::SUCCESS,
            "予約拒否"
        );

        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use nutriagenda_domain::appointment::AppointmentStatus;
    use nutriagenda_infra::repository::InMemoryAppointmentRepository;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::usecase::appointment::test_helpers::{build_sut, monday, now, seed, status_of};

    #[tokio::test]
    async fn test_申込中の予約を拒否できる() {
        let repo = InMemoryAppointmentRepository::new();
        let target = seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Pending).await;
        let sibling = seed(&repo, "p2", monday(), "09:00", AppointmentStatus::Pending).await;
        let sut = build_sut(&repo, now());

        let rejected = sut
            .reject_appointment(&target.id().to_string())
            .await
            .unwrap();

        assert_eq!(rejected.status(), AppointmentStatus::Rejected);
        assert_eq!(status_of(&repo, &sibling).await, AppointmentStatus::Pending);
    }

    #[rstest]
    #[case(AppointmentStatus::Accepted)]
    #[case(AppointmentStatus::Rejected)]
    #[case(AppointmentStatus::Cancelled)]
    #[tokio::test]
    async fn test_申込中以外は拒否できない(#[case] status: AppointmentStatus) {
        let repo = InMemoryAppointmentRepository::new();
        let appointment = seed(&repo, "p1", monday(), "09:00", status).await;
        let sut = build_sut(&repo, now());

        let result = sut.reject_appointment(&appointment.id().to_string()).await;

        assert!(matches!(
            result,
            Err(CoreError::Validation(msg)) if msg == "Apenas consultas pendentes podem ser recusadas."
        ));
    }
}
