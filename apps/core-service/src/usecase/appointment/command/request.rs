//! 予約の申込

use chrono::{NaiveDateTime, Timelike};
use nutriagenda_domain::{
    appointment::{Appointment, AppointmentId, AppointmentStatus, NewAppointment},
    slot::{SlotWindow, is_weekday, parse_iso_date, parse_slot_time},
};
use nutriagenda_shared::{event_log::event, log_business_event};

use crate::{
    error::CoreError,
    usecase::{
        appointment::{AppointmentUseCaseImpl, RequestAppointmentInput},
        helpers::{parse_nutritionist_id, parse_patient_id},
    },
};

const WEEKDAYS_ONLY: &str = "Consultas só podem ser agendadas de segunda a sexta-feira.";
const PAST_DATE: &str = "Não é possível agendar consultas em datas passadas.";
const SLOT_NOT_AVAILABLE: &str = "Horário não disponível.";
const SLOT_OCCUPIED: &str = "Este horário já está ocupado.";
const DUPLICATE_PENDING: &str = "Você já possui uma solicitação pendente para este horário.";

impl AppointmentUseCaseImpl {
    /// 予約を申し込む
    ///
    /// 以下の順に検証し、最初の違反で失敗する。
    ///
    /// 1. 平日であること
    /// 2. 過去の日付でないこと
    /// 3. 当日の場合、開始時刻を過ぎていないこと（ポリシーで有効な場合）
    /// 4. カタログの枠と一致すること
    /// 5. 確定済みの予約で埋まっていないこと
    /// 6. 同じ患者の申込中の予約が同じ枠にないこと
    ///
    /// 作成した予約（申込中）を返す。
    #[tracing::instrument(
        skip_all,
        fields(patient_id = %input.patient_id, nutritionist_id = %input.nutritionist_id, date = %input.date)
    )]
    pub async fn request_appointment(
        &self,
        input: RequestAppointmentInput,
    ) -> Result<Appointment, CoreError> {
        let patient_id = parse_patient_id(&input.patient_id)?;
        let nutritionist_id = parse_nutritionist_id(&input.nutritionist_id)?;
        let date = parse_iso_date(&input.date)?;
        let now = self.clock.now();

        // 1. 平日のみ
        if !is_weekday(date) {
            return Err(refuse(WEEKDAYS_ONLY));
        }

        // 2. 過去日は不可（時刻は比較しない）
        if date < now.date() {
            return Err(refuse(PAST_DATE));
        }

        // 3. 当日の締め切り
        if self.policy.same_day_cutoff && date == now.date() {
            check_same_day_cutoff(&input.time_start, now)?;
        }

        // 4. カタログの枠
        let slot = SlotWindow::from_catalog(&input.time_start, &input.time_end)?;

        // 5, 6. 同じ日の予約と照合
        let same_day = self.repo.find_by_date(date, &nutritionist_id).await?;
        let in_slot: Vec<&Appointment> =
            same_day.iter().filter(|a| a.is_in_slot(&slot)).collect();

        if in_slot
            .iter()
            .any(|a| a.status() == AppointmentStatus::Accepted)
        {
            return Err(refuse(SLOT_OCCUPIED));
        }

        if in_slot
            .iter()
            .any(|a| a.status() == AppointmentStatus::Pending && a.patient_id() == &patient_id)
        {
            return Err(refuse(DUPLICATE_PENDING));
        }

        // 7. 作成
        let appointment = Appointment::new(NewAppointment {
            id: AppointmentId::new(),
            patient_id,
            nutritionist_id,
            date,
            slot,
            observations: input.observations,
            now,
        });
        self.repo.insert(&appointment).await?;

        log_business_event!(
            event.category = event::category::APPOINTMENT,
            event.action = event::action::APPOINTMENT_REQUESTED,
            event.entity_type = event::entity_type::APPOINTMENT,
            event.entity_id = %appointment.id(),
            event.actor_id = %appointment.patient_id(),
            event.result = event::result::SUCCESS,
            "予約申込"
        );

        Ok(appointment)
    }
}

/// 当日の予約で、開始時刻（分単位）を過ぎた枠を拒否する
///
/// 開始時刻がパースできない場合も同じく予約不可として扱う。
fn check_same_day_cutoff(time_start: &str, now: NaiveDateTime) -> Result<(), CoreError> {
    let Some(start) = parse_slot_time(time_start) else {
        return Err(refuse(SLOT_NOT_AVAILABLE));
    };

    if (start.hour(), start.minute()) < (now.hour(), now.minute()) {
        return Err(refuse(SLOT_NOT_AVAILABLE));
    }

    Ok(())
}

fn refuse(message: &'static str) -> CoreError {
    tracing::debug!(reason = message, "予約申込を拒否");
    CoreError::validation(message)
}
