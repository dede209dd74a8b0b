//! # 枠の重複検出と解消
//!
//! 同じ栄養士・日付・枠に確定済みの予約が複数ある状態を「重複」と呼ぶ。
//! 通常の操作では確定時の自動拒否と再有効化の拒否で防がれるが、
//! 並行した確定や手動の修正で発生しうるため、一覧と解消の操作を提供する。

use chrono::NaiveDate;
use nutriagenda_domain::{
    appointment::{Appointment, AppointmentId, AppointmentStatus},
    slot::{catalog, parse_iso_date},
    validation::require_non_empty,
    value_objects::NutritionistId,
};
use nutriagenda_shared::{event_log::event, log_business_event};

use super::{AppointmentUseCaseImpl, ResolvedConflict, SlotConflict, SlotQuery};
use crate::{
    error::CoreError,
    usecase::helpers::{parse_nutritionist_id, siblings_with_status},
};

/// 検証済みの枠指定
struct ValidatedSlotQuery<'a> {
    nutritionist_id: NutritionistId,
    date:            NaiveDate,
    time_start:      &'a str,
    time_end:        &'a str,
}

impl<'a> ValidatedSlotQuery<'a> {
    /// 文字列をすべて空でないことを確認してから日付をパースする
    fn parse(query: &'a SlotQuery) -> Result<Self, CoreError> {
        require_non_empty(&query.nutritionist_id, "ID do nutricionista")?;
        require_non_empty(&query.date, "Data")?;
        let time_start = require_non_empty(&query.time_start, "Horário inicial")?;
        let time_end = require_non_empty(&query.time_end, "Horário final")?;

        Ok(Self {
            nutritionist_id: parse_nutritionist_id(&query.nutritionist_id)?,
            date: parse_iso_date(&query.date)?,
            time_start,
            time_end,
        })
    }

    fn matches(&self, appointment: &Appointment) -> bool {
        appointment.slot().matches(self.time_start, self.time_end)
    }
}

impl AppointmentUseCaseImpl {
    /// 枠に確定済みの予約があるか
    ///
    /// `exclude` に指定した ID の予約は判定から除く。
    /// 空文字は除外なしとして扱い、ID として不正な値はバリデーションエラー。
    pub async fn has_conflict(
        &self,
        query: &SlotQuery,
        exclude: Option<&str>,
    ) -> Result<bool, CoreError> {
        let query = ValidatedSlotQuery::parse(query)?;
        let exclude = exclude
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::parse::<AppointmentId>)
            .transpose()?;

        let same_day = self
            .repo
            .find_by_date(query.date, &query.nutritionist_id)
            .await?;

        Ok(same_day.iter().any(|appointment| {
            appointment.status() == AppointmentStatus::Accepted
                && query.matches(appointment)
                && exclude.as_ref() != Some(appointment.id())
        }))
    }

    /// 枠の確定済み・キャンセル済みの予約を一覧する（作成日時順）
    ///
    /// 申込中・拒否済みは枠を塞がず解消の対象にもならないため含めない。
    pub async fn list_conflicts_by_slot(
        &self,
        query: &SlotQuery,
    ) -> Result<Vec<Appointment>, CoreError> {
        let query = ValidatedSlotQuery::parse(query)?;

        let mut candidates: Vec<Appointment> = self
            .repo
            .find_by_date(query.date, &query.nutritionist_id)
            .await?
            .into_iter()
            .filter(|a| a.status().is_conflict_candidate() && query.matches(a))
            .collect();
        candidates.sort_by_key(Appointment::created_at);

        Ok(candidates)
    }

    /// 指定日に確定済みの予約が複数ある枠を一覧する（カタログ順）
    pub async fn list_conflicted_slots(
        &self,
        nutritionist_id: &str,
        date: &str,
    ) -> Result<Vec<SlotConflict>, CoreError> {
        let nutritionist_id = parse_nutritionist_id(nutritionist_id)?;
        let date = parse_iso_date(date)?;

        let accepted: Vec<Appointment> = self
            .repo
            .find_by_date(date, &nutritionist_id)
            .await?
            .into_iter()
            .filter(|a| a.status() == AppointmentStatus::Accepted)
            .collect();

        Ok(catalog()
            .iter()
            .map(|slot| SlotConflict {
                slot:     *slot,
                accepted: accepted
                    .iter()
                    .filter(|a| a.is_in_slot(slot))
                    .cloned()
                    .collect(),
            })
            .filter(|conflict| conflict.accepted.len() > 1)
            .collect())
    }

    /// 重複を解消し、指定した予約を枠の唯一の確定済み予約にする
    ///
    /// 同じ枠の他の確定済み予約をすべてキャンセルに戻してから、
    /// 対象がキャンセル済みであれば確定済みに昇格させる。
    /// 対象が既に唯一の確定済み予約であれば何も書き込まない。
    #[tracing::instrument(skip_all, fields(appointment_id = %id))]
    pub async fn resolve_conflict(&self, id: &str) -> Result<ResolvedConflict, CoreError> {
        let now = self.clock.now();

        // 1. 予約を取得し、遷移可能か確認
        let target = self.load_appointment(id).await?;
        let was_accepted = target.status() == AppointmentStatus::Accepted;
        let promoted = target.promoted_by_resolution(now)?;

        // 2. 他の確定済み予約を先にキャンセルに戻す
        let same_day = self
            .repo
            .find_by_date(promoted.date(), promoted.nutritionist_id())
            .await?;
        let mut demoted = Vec::new();
        for sibling in siblings_with_status(&promoted, &same_day, AppointmentStatus::Accepted) {
            let sibling = sibling.clone().demoted_by_resolution(now)?;
            self.repo
                .update_status(sibling.id(), sibling.status(), sibling.updated_at())
                .await?;
            demoted.push(sibling);
        }

        // 3. 対象を確定済みにする
        let appointment = if was_accepted {
            self.reload(&promoted).await?
        } else {
            self.persist_status(&promoted).await?
        };

        log_business_event!(
            event.category = event::category::APPOINTMENT,
            event.action = event::action::APPOINTMENT_CONFLICT_RESOLVED,
            event.entity_type = event::entity_type::APPOINTMENT,
            event.entity_id = %appointment.id(),
            event.actor_id = %appointment.nutritionist_id(),
            event.result = event::result::SUCCESS,
            demoted_count = demoted.len(),
            "予約の重複を解消"
        );

        Ok(ResolvedConflict {
            appointment,
            demoted,
            promoted: !was_accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use nutriagenda_infra::repository::InMemoryAppointmentRepository;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::usecase::appointment::test_helpers::{build_sut, monday, now, seed, status_of};

    fn slot_query(time_start: &str, time_end: &str) -> SlotQuery {
        SlotQuery {
            nutritionist_id: "n1".to_string(),
            date:            "2030-01-07".to_string(),
            time_start:      time_start.to_string(),
            time_end:        time_end.to_string(),
        }
    }

    #[tokio::test]
    async fn test_確定済みの予約がある枠は重複ありと判定する() {
        let repo = InMemoryAppointmentRepository::new();
        let accepted = seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Accepted).await;
        seed(&repo, "p2", monday(), "11:00", AppointmentStatus::Pending).await;
        let sut = build_sut(&repo, now());

        assert!(sut.has_conflict(&slot_query("09:00", "11:00"), None).await.unwrap());
        assert!(!sut.has_conflict(&slot_query("11:00", "13:00"), None).await.unwrap());
        assert!(
            !sut.has_conflict(
                &slot_query("09:00", "11:00"),
                Some(&accepted.id().to_string())
            )
            .await
            .unwrap()
        );
    }

    #[rstest]
    #[case::小文字(false)]
    #[case::大文字(true)]
    #[tokio::test]
    async fn test_除外idは表記によらず同じ予約として扱う(#[case] uppercase: bool) {
        let repo = InMemoryAppointmentRepository::new();
        let accepted = seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Accepted).await;
        let sut = build_sut(&repo, now());
        let exclude = if uppercase {
            accepted.id().to_string().to_uppercase()
        } else {
            accepted.id().to_string()
        };

        let found = sut.get_appointment(&exclude).await.unwrap();
        let has_conflict = sut
            .has_conflict(&slot_query("09:00", "11:00"), Some(&format!(" {exclude} ")))
            .await
            .unwrap();

        assert_eq!(found.id(), accepted.id());
        assert!(!has_conflict);
    }

    #[rstest]
    #[case::空文字("")]
    #[case::空白のみ("  ")]
    #[tokio::test]
    async fn test_空の除外idは除外なしとして扱う(#[case] exclude: &str) {
        let repo = InMemoryAppointmentRepository::new();
        seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Accepted).await;
        let sut = build_sut(&repo, now());

        let has_conflict = sut
            .has_conflict(&slot_query("09:00", "11:00"), Some(exclude))
            .await
            .unwrap();

        assert!(has_conflict);
    }

    #[tokio::test]
    async fn test_不正な除外idはvalidation() {
        let repo = InMemoryAppointmentRepository::new();
        seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Accepted).await;
        let sut = build_sut(&repo, now());

        let result = sut
            .has_conflict(&slot_query("09:00", "11:00"), Some("not-a-uuid"))
            .await;

        assert!(matches!(
            result,
            Err(CoreError::Validation(msg)) if msg == "ID da consulta inválido."
        ));
    }

    #[rstest]
    #[case::栄養士id空("", "2030-01-07", "09:00", "11:00", "ID do nutricionista é obrigatório.")]
    #[case::日付空("n1", "", "09:00", "11:00", "Data é obrigatório.")]
    #[case::開始時刻空("n1", "2030-01-07", "", "11:00", "Horário inicial é obrigatório.")]
    #[case::終了時刻空("n1", "2030-01-07", "09:00", " ", "Horário final é obrigatório.")]
    #[case::区切りのない日付("n1", "07/01/2030", "09:00", "11:00", "Data inválida: 07/01/2030. Use o formato AAAA-MM-DD.")]
    #[tokio::test]
    async fn test_重複判定の入力が不正ならvalidation(
        #[case] nutritionist_id: &str,
        #[case] date: &str,
        #[case] time_start: &str,
        #[case] time_end: &str,
        #[case] expected: &str,
    ) {
        let repo = InMemoryAppointmentRepository::new();
        let sut = build_sut(&repo, now());
        let query = SlotQuery {
            nutritionist_id: nutritionist_id.to_string(),
            date:            date.to_string(),
            time_start:      time_start.to_string(),
            time_end:        time_end.to_string(),
        };

        let result = sut.has_conflict(&query, None).await;

        assert!(matches!(result, Err(CoreError::Validation(msg)) if msg == expected));
    }

    #[tokio::test]
    async fn test_重複一覧は確定済みとキャンセル済みのみ() {
        let repo = InMemoryAppointmentRepository::new();
        let accepted = seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Accepted).await;
        let cancelled = seed(&repo, "p2", monday(), "09:00", AppointmentStatus::Cancelled).await;
        seed(&repo, "p3", monday(), "09:00", AppointmentStatus::Pending).await;
        seed(&repo, "p4", monday(), "09:00", AppointmentStatus::Rejected).await;
        seed(&repo, "p5", monday(), "11:00", AppointmentStatus::Accepted).await;
        let sut = build_sut(&repo, now());

        let conflicts = sut
            .list_conflicts_by_slot(&slot_query("09:00", "11:00"))
            .await
            .unwrap();

        let mut ids: Vec<_> = conflicts.iter().map(|a| a.id().clone()).collect();
        ids.sort();
        let mut expected = vec![accepted.id().clone(), cancelled.id().clone()];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_キャンセル済みを指定すると昇格し他の確定済みはキャンセルに戻る() {
        // Arrange
        let repo = InMemoryAppointmentRepository::new();
        let a = seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Accepted).await;
        let b = seed(&repo, "p2", monday(), "09:00", AppointmentStatus::Cancelled).await;
        let sut = build_sut(&repo, now());

        // Act
        let resolved = sut.resolve_conflict(&b.id().to_string()).await.unwrap();

        // Assert
        assert!(resolved.promoted);
        assert_eq!(resolved.appointment.id(), b.id());
        assert_eq!(resolved.appointment.status(), AppointmentStatus::Accepted);
        assert_eq!(resolved.demoted.len(), 1);
        assert_eq!(resolved.demoted[0].id(), a.id());
        assert_eq!(status_of(&repo, &a).await, AppointmentStatus::Cancelled);
        assert_eq!(status_of(&repo, &b).await, AppointmentStatus::Accepted);
    }

    #[tokio::test]
    async fn test_確定済みが複数ある枠は指定した1件だけが残る() {
        let repo = InMemoryAppointmentRepository::new();
        let keep = seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Accepted).await;
        let other1 = seed(&repo, "p2", monday(), "09:00", AppointmentStatus::Accepted).await;
        let other2 = seed(&repo, "p3", monday(), "09:00", AppointmentStatus::Accepted).await;
        let sut = build_sut(&repo, now());
        assert_eq!(
            sut.list_conflicted_slots("n1", "2030-01-07").await.unwrap().len(),
            1
        );

        let resolved = sut.resolve_conflict(&keep.id().to_string()).await.unwrap();

        assert!(!resolved.promoted);
        assert_eq!(resolved.demoted.len(), 2);
        assert_eq!(status_of(&repo, &keep).await, AppointmentStatus::Accepted);
        assert_eq!(status_of(&repo, &other1).await, AppointmentStatus::Cancelled);
        assert_eq!(status_of(&repo, &other2).await, AppointmentStatus::Cancelled);
        assert!(sut.list_conflicted_slots("n1", "2030-01-07").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_唯一の確定済みを解消しても何も変わらない() {
        let repo = InMemoryAppointmentRepository::new();
        let only = seed(&repo, "p1", monday(), "09:00", AppointmentStatus::Accepted).await;
        let sut = build_sut(&repo, now());

        let resolved = sut.resolve_conflict(&only.id().to_string()).await.unwrap();

        assert!(!resolved.promoted);
        assert!(resolved.demoted.is_empty());
        assert_eq!(resolved.appointment, only);
    }

    #[rstest]
    #[case(AppointmentStatus::Pending)]
    #[case(AppointmentStatus::Rejected)]
    #[tokio::test]
    async fn test_申込中や拒否済みは解消の対象にできない(#[case] status: AppointmentStatus) {
        let repo = InMemoryAppointmentRepository::new();
        let appointment = seed(&repo, "p1", monday(), "09:00", status).await;
        let sut = build_sut(&repo, now());

        let result = sut.resolve_conflict(&appointment.id().to_string()).await;

        assert!(matches!(
            result,
            Err(CoreError::Validation(msg))
                if msg == "Apenas consultas aceitas ou canceladas podem ter o conflito resolvido."
        ));
    }
}
