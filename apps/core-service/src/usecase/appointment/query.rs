//! # 予約の照会
//!
//! 空き枠・アジェンダ・一覧の取得と、一覧の変更購読を提供する。
//! 一覧は常に（日付, 開始時刻）の昇順で返す。

use std::{collections::BTreeMap, sync::Arc};

use chrono::{Days, NaiveDate};
use itertools::Itertools;
use nutriagenda_domain::{
    appointment::{Appointment, AppointmentStatus},
    slot::{SlotWindow, TimeSlot, catalog, is_weekday, parse_iso_date},
    validation::require_date_range,
};
use nutriagenda_infra::repository::{AppointmentListener, Subscription};

use super::{AgendaDay, AppointmentUseCaseImpl};
use crate::{
    error::CoreError,
    usecase::helpers::{parse_nutritionist_id, parse_patient_id},
};

impl AppointmentUseCaseImpl {
    /// ID で予約を取得する
    pub async fn get_appointment(&self, id: &str) -> Result<Appointment, CoreError> {
        self.load_appointment(id).await
    }

    /// 患者の予約一覧（全ステータス）
    pub async fn list_patient_appointments(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Appointment>, CoreError> {
        let patient_id = parse_patient_id(patient_id)?;
        let mut appointments = self.repo.find_by_patient(&patient_id).await?;
        sort_by_schedule(&mut appointments);
        Ok(appointments)
    }

    /// 指定日の空き枠
    ///
    /// 週末は空の一覧を返す。
    pub async fn available_slots(
        &self,
        date: &str,
        nutritionist_id: &str,
    ) -> Result<Vec<TimeSlot>, CoreError> {
        let date = parse_iso_date(date)?;
        let nutritionist_id = parse_nutritionist_id(nutritionist_id)?;
        if !is_weekday(date) {
            return Ok(Vec::new());
        }

        let occupied: Vec<SlotWindow> = self
            .repo
            .find_by_date(date, &nutritionist_id)
            .await?
            .iter()
            .filter(|a| a.status() == AppointmentStatus::Accepted)
            .map(Appointment::slot)
            .collect();

        Ok(free_slots(date, &occupied))
    }

    /// 期間内（両端を含む）の平日ごとの空き枠
    ///
    /// 週末は結果に含めない。平日は空きがなくても空の一覧として含める。
    /// 期間は [`BookingPolicy::availability_max_days`](super::BookingPolicy) 日まで。
    pub async fn available_slots_for_range(
        &self,
        start: &str,
        end: &str,
        nutritionist_id: &str,
    ) -> Result<BTreeMap<NaiveDate, Vec<TimeSlot>>, CoreError> {
        let start = parse_iso_date(start)?;
        let end = parse_iso_date(end)?;
        require_date_range(start, end)?;
        let max_days = self.policy.availability_max_days;
        if (end - start).num_days() > i64::from(max_days) {
            return Err(CoreError::validation(format!(
                "O intervalo de datas não pode exceder {max_days} dias."
            )));
        }
        let nutritionist_id = parse_nutritionist_id(nutritionist_id)?;

        let occupied = self
            .repo
            .find_accepted_by_date_range(start, end, &nutritionist_id)
            .await?
            .into_iter()
            .into_group_map_by(Appointment::date);

        Ok(start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| is_weekday(*date))
            .map(|date| {
                let slots: Vec<SlotWindow> = occupied
                    .get(&date)
                    .map(|appointments| appointments.iter().map(Appointment::slot).collect())
                    .unwrap_or_default();
                (date, free_slots(date, &slots))
            })
            .collect())
    }

    /// 栄養士のアジェンダ（確定済みの予約を日付ごとにまとめたもの）
    ///
    /// 開始日の既定は今日、終了日の既定は開始日から
    /// [`BookingPolicy::agenda_window_days`](super::BookingPolicy) 日後。
    pub async fn list_agenda(
        &self,
        nutritionist_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<AgendaDay>, CoreError> {
        let nutritionist_id = parse_nutritionist_id(nutritionist_id)?;
        let start = match start {
            Some(value) => parse_iso_date(value)?,
            None => self.clock.today(),
        };
        let end = match end {
            Some(value) => parse_iso_date(value)?,
            None => start
                .checked_add_days(Days::new(u64::from(self.policy.agenda_window_days)))
                .unwrap_or(NaiveDate::MAX),
        };
        require_date_range(start, end)?;

        let mut accepted = self
            .repo
            .find_accepted_by_date_range(start, end, &nutritionist_id)
            .await?;
        sort_by_schedule(&mut accepted);

        let by_date = accepted.into_iter().chunk_by(Appointment::date);
        let agenda = by_date
            .into_iter()
            .map(|(date, appointments)| AgendaDay {
                date,
                appointments: appointments.collect(),
            })
            .collect();

        Ok(agenda)
    }

    /// 栄養士の申込中の予約一覧
    pub async fn list_pending_by_nutritionist(
        &self,
        nutritionist_id: &str,
    ) -> Result<Vec<Appointment>, CoreError> {
        let nutritionist_id = parse_nutritionist_id(nutritionist_id)?;
        let mut pending = self
            .repo
            .find_by_status(AppointmentStatus::Pending, &nutritionist_id)
            .await?;
        sort_by_schedule(&mut pending);
        Ok(pending)
    }

    /// 患者の予約一覧の変更を購読する
    ///
    /// 登録時と変更のたびに、並び替え済みの全件を `listener` に渡す。
    pub async fn watch_patient_appointments(
        &self,
        patient_id: &str,
        listener: AppointmentListener,
    ) -> Result<Subscription, CoreError> {
        let patient_id = parse_patient_id(patient_id)?;
        Ok(self
            .repo
            .subscribe_patient_appointments(&patient_id, sorted_listener(listener))
            .await?)
    }

    /// 栄養士の申込中の予約一覧の変更を購読する
    ///
    /// 登録時と変更のたびに、並び替え済みの全件を `listener` に渡す。
    pub async fn watch_pending_by_nutritionist(
        &self,
        nutritionist_id: &str,
        listener: AppointmentListener,
    ) -> Result<Subscription, CoreError> {
        let nutritionist_id = parse_nutritionist_id(nutritionist_id)?;
        Ok(self
            .repo
            .subscribe_nutritionist_pending(&nutritionist_id, sorted_listener(listener))
            .await?)
    }
}

/// （日付, 開始時刻, 作成日時）の昇順に並べる
fn sort_by_schedule(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| {
        a.schedule_key()
            .cmp(&b.schedule_key())
            .then_with(|| a.created_at().cmp(&b.created_at()))
    });
}

/// 受け取った一覧を並び替えてから渡すリスナーで包む
fn sorted_listener(listener: AppointmentListener) -> AppointmentListener {
    Arc::new(move |appointments: &[Appointment]| {
        let mut sorted = appointments.to_vec();
        sort_by_schedule(&mut sorted);
        listener(&sorted);
    })
}

/// カタログから埋まっている枠を除いた空き枠
fn free_slots(date: NaiveDate, occupied: &[SlotWindow]) -> Vec<TimeSlot> {
    catalog()
        .iter()
        .filter(|slot| !occupied.contains(slot))
        .map(|slot| TimeSlot::available(date, *slot))
        .collect()
}
