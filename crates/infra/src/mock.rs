//! # テスト用モック
//!
//! ユースケーステストで使用するモックリポジトリ・モック送信。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! nutriagenda-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use nutriagenda_domain::{
    appointment::{Appointment, AppointmentId, AppointmentStatus},
    notification::{NotificationError, PushMessage},
    value_objects::{NutritionistId, PatientId},
};
use tokio::sync::Barrier;

use crate::{
    error::InfraError,
    notification::PushNotificationSender,
    repository::{
        AppointmentListener,
        AppointmentRepository,
        CalendarEventIdsUpdate,
        InMemoryAppointmentRepository,
        Subscription,
    },
};

// ===== FailingAppointmentRepository =====

/// すべての操作が失敗するリポジトリ
///
/// ストア障害（RepositoryError）がそのまま伝播することの検証に使う。
#[derive(Clone, Default)]
pub struct FailingAppointmentRepository;

impl FailingAppointmentRepository {
    fn fail<T>() -> Result<T, InfraError> {
        Err(InfraError::unavailable("予約ストアに接続できません"))
    }
}

#[async_trait]
impl AppointmentRepository for FailingAppointmentRepository {
    async fn insert(&self, _appointment: &Appointment) -> Result<(), InfraError> {
        Self::fail()
    }

    async fn find_by_id(&self, _id: &AppointmentId) -> Result<Option<Appointment>, InfraError> {
        Self::fail()
    }

    async fn find_by_patient(
        &self,
        _patient_id: &PatientId,
    ) -> Result<Vec<Appointment>, InfraError> {
        Self::fail()
    }

    async fn find_by_date(
        &self,
        _date: NaiveDate,
        _nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        Self::fail()
    }

    async fn find_by_status(
        &self,
        _status: AppointmentStatus,
        _nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        Self::fail()
    }

    async fn find_accepted_by_date_range(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
        _nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        Self::fail()
    }

    async fn update_status(
        &self,
        _id: &AppointmentId,
        _status: AppointmentStatus,
        _updated_at: NaiveDateTime,
    ) -> Result<(), InfraError> {
        Self::fail()
    }

    async fn update_calendar_event_ids(
        &self,
        _id: &AppointmentId,
        _update: &CalendarEventIdsUpdate,
    ) -> Result<(), InfraError> {
        Self::fail()
    }

    async fn subscribe_patient_appointments(
        &self,
        _patient_id: &PatientId,
        _listener: AppointmentListener,
    ) -> Result<Subscription, InfraError> {
        Self::fail()
    }

    async fn subscribe_nutritionist_pending(
        &self,
        _nutritionist_id: &NutritionistId,
        _listener: AppointmentListener,
    ) -> Result<Subscription, InfraError> {
        Self::fail()
    }
}

// ===== BarrierAppointmentRepository =====

/// 競合チェックの読み取りで呼び出し元を待ち合わせるリポジトリ
///
/// 最初の `parties` 回の `find_by_date` は読み取り後にバリアで待機する。
/// 並行する確定操作がすべて古い状態を読んでから書き込むため、
/// 後勝ちの競合を再現できる。以降の呼び出しは待機しない。
///
/// ステータスの書き込みは適用順に記録する。
#[derive(Clone)]
pub struct BarrierAppointmentRepository {
    inner:   InMemoryAppointmentRepository,
    barrier: Arc<Barrier>,
    parties: usize,
    arrived: Arc<AtomicUsize>,
    writes:  Arc<tokio::sync::Mutex<Vec<(AppointmentId, AppointmentStatus)>>>,
}

impl BarrierAppointmentRepository {
    pub fn new(inner: InMemoryAppointmentRepository, parties: usize) -> Self {
        Self {
            inner,
            barrier: Arc::new(Barrier::new(parties)),
            parties,
            arrived: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(tokio::sync::Mutex::new(Vec::new())),
        }
    }

    /// 適用順のステータス書き込み履歴
    pub async fn writes(&self) -> Vec<(AppointmentId, AppointmentStatus)> {
        self.writes.lock().await.clone()
    }

    /// 指定した予約への最後の書き込み
    pub async fn last_write_for(&self, id: &AppointmentId) -> Option<AppointmentStatus> {
        self.writes
            .lock()
            .await
            .iter()
            .rev()
            .find(|(written, _)| written == id)
            .map(|(_, status)| *status)
    }
}

#[async_trait]
impl AppointmentRepository for BarrierAppointmentRepository {
    async fn insert(&self, appointment: &Appointment) -> Result<(), InfraError> {
        self.inner.insert(appointment).await
    }

    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, InfraError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<Appointment>, InfraError> {
        self.inner.find_by_patient(patient_id).await
    }

    async fn find_by_date(
        &self,
        date: NaiveDate,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        let result = self.inner.find_by_date(date, nutritionist_id).await;
        if self.arrived.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        result
    }

    async fn find_by_status(
        &self,
        status: AppointmentStatus,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        self.inner.find_by_status(status, nutritionist_id).await
    }

    async fn find_accepted_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        self.inner
            .find_accepted_by_date_range(start, end, nutritionist_id)
            .await
    }

    async fn update_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
        updated_at: NaiveDateTime,
    ) -> Result<(), InfraError> {
        let mut writes = self.writes.lock().await;
        self.inner.update_status(id, status, updated_at).await?;
        writes.push((id.clone(), status));
        Ok(())
    }

    async fn update_calendar_event_ids(
        &self,
        id: &AppointmentId,
        update: &CalendarEventIdsUpdate,
    ) -> Result<(), InfraError> {
        self.inner.update_calendar_event_ids(id, update).await
    }

    async fn subscribe_patient_appointments(
        &self,
        patient_id: &PatientId,
        listener: AppointmentListener,
    ) -> Result<Subscription, InfraError> {
        self.inner
            .subscribe_patient_appointments(patient_id, listener)
            .await
    }

    async fn subscribe_nutritionist_pending(
        &self,
        nutritionist_id: &NutritionistId,
        listener: AppointmentListener,
    ) -> Result<Subscription, InfraError> {
        self.inner
            .subscribe_nutritionist_pending(nutritionist_id, listener)
            .await
    }
}

// ===== MockPushSender =====

/// 送信したメッセージを記録するプッシュ通知送信
#[derive(Clone, Default)]
pub struct MockPushSender {
    sent:    Arc<Mutex<Vec<PushMessage>>>,
    failing: bool,
}

impl MockPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に送信に失敗するモックを作成する
    pub fn failing() -> Self {
        Self {
            sent:    Arc::new(Mutex::new(Vec::new())),
            failing: true,
        }
    }

    /// 送信に成功したメッセージ
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushNotificationSender for MockPushSender {
    async fn send_push(&self, message: &PushMessage) -> Result<(), NotificationError> {
        if self.failing {
            return Err(NotificationError::SendFailed("モック送信失敗".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nutriagenda_domain::{appointment::NewAppointment, slot::SlotWindow};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::InfraErrorKind;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    fn pending(patient: &str) -> Appointment {
        Appointment::new(NewAppointment {
            id: AppointmentId::new(),
            patient_id: PatientId::new(patient).unwrap(),
            nutritionist_id: NutritionistId::new("n1").unwrap(),
            date: monday(),
            slot: SlotWindow::from_catalog("09:00", "11:00").unwrap(),
            observations: None,
            now: monday().and_hms_opt(8, 0, 0).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_failingリポジトリはunavailableを返す() {
        let sut = FailingAppointmentRepository;

        let result = sut.find_by_id(&AppointmentId::new()).await;

        assert!(matches!(
            result.unwrap_err().kind(),
            InfraErrorKind::Unavailable(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_barrierは指定数の読み取りが揃うまで待機する() {
        // Arrange
        let inner = InMemoryAppointmentRepository::new();
        let appointment = pending("p1");
        inner.insert(&appointment).await.unwrap();
        let sut = BarrierAppointmentRepository::new(inner, 2);
        let n1 = NutritionistId::new("n1").unwrap();

        // Act: 2 つの読み取りが揃えば両方とも完了する
        let (first, second) = tokio::join!(
            sut.find_by_date(monday(), &n1),
            sut.find_by_date(monday(), &n1)
        );

        // Assert
        assert_eq!(first.unwrap().len(), 1);
        assert_eq!(second.unwrap().len(), 1);
        // 3 回目以降は待機しない
        assert_eq!(sut.find_by_date(monday(), &n1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_barrierは書き込みを適用順に記録する() {
        let inner = InMemoryAppointmentRepository::new();
        let appointment = pending("p1");
        inner.insert(&appointment).await.unwrap();
        let sut = BarrierAppointmentRepository::new(inner, 1);
        let now = monday().and_hms_opt(9, 0, 0).unwrap();

        sut.update_status(appointment.id(), AppointmentStatus::Accepted, now)
            .await
            .unwrap();
        sut.update_status(appointment.id(), AppointmentStatus::Cancelled, now)
            .await
            .unwrap();

        assert_eq!(
            sut.writes().await,
            vec![
                (appointment.id().clone(), AppointmentStatus::Accepted),
                (appointment.id().clone(), AppointmentStatus::Cancelled),
            ]
        );
        assert_eq!(
            sut.last_write_for(appointment.id()).await,
            Some(AppointmentStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_mock_push_senderは送信内容を記録する() {
        let sut = MockPushSender::new();
        let message = PushMessage {
            recipient: "p1".to_string(),
            title:     "t".to_string(),
            body:      "b".to_string(),
        };

        sut.send_push(&message).await.unwrap();

        assert_eq!(sut.sent(), vec![message]);
    }

    #[tokio::test]
    async fn test_failingなmock_push_senderは記録しない() {
        let sut = MockPushSender::failing();
        let message = PushMessage {
            recipient: "p1".to_string(),
            title:     "t".to_string(),
            body:      "b".to_string(),
        };

        assert!(sut.send_push(&message).await.is_err());
        assert!(sut.sent().is_empty());
    }
}
