//! AppointmentRepository: 予約の永続化と変更購読
//!
//! 予約ストアの契約と、プロセス内で完結するインメモリ実装を提供する。
//!
//! ## 更新の意味論
//!
//! - `update_status` は 1 行単位で原子的に適用される（後勝ち）
//! - 行をまたぐトランザクションはない
//! - 変更購読は、変更前または変更後の行が条件に一致する購読者に、
//!   その時点で条件に一致する全件を通知する
//! - リスナーはストアのロックを保持せずに呼ばれるため、リスナー内からストアに書き込んでもよい
//! - 購読者ごとに通知は直列化され、版番号より古い一覧は捨てられる
//!   （連続した変更は最新の一覧にまとめて届くことがある）

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use nutriagenda_domain::{
    appointment::{Appointment, AppointmentId, AppointmentRecord, AppointmentStatus},
    slot::SlotWindow,
    value_objects::{NutritionistId, PatientId},
};
use uuid::Uuid;

use super::Subscription;
use crate::error::InfraError;

/// 変更購読のコールバック
///
/// 条件に一致する予約の全件を受け取る。
/// 同じ購読者のリスナーが並行に呼ばれることはない。
pub type AppointmentListener = Arc<dyn Fn(&[Appointment]) + Send + Sync>;

/// カレンダーイベント ID の部分更新
///
/// `Some` のフィールドのみ上書きし、`None` のフィールドは変更しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarEventIdsUpdate {
    pub patient:      Option<String>,
    pub nutritionist: Option<String>,
}

/// AppointmentRepository トレイト
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// 新規予約を作成する
    async fn insert(&self, appointment: &Appointment) -> Result<(), InfraError>;

    /// ID で予約を検索する
    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, InfraError>;

    /// 患者の予約一覧を取得する
    async fn find_by_patient(&self, patient_id: &PatientId)
    -> Result<Vec<Appointment>, InfraError>;

    /// 栄養士の指定日の予約一覧を取得する（全ステータス）
    async fn find_by_date(
        &self,
        date: NaiveDate,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError>;

    /// 栄養士の指定ステータスの予約一覧を取得する
    async fn find_by_status(
        &self,
        status: AppointmentStatus,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError>;

    /// 栄養士の期間内（両端を含む）の確定済み予約一覧を取得する
    async fn find_accepted_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError>;

    /// ステータスを更新する
    ///
    /// 行が存在しない場合は `InfraErrorKind::NotFound` を返す。
    async fn update_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
        updated_at: NaiveDateTime,
    ) -> Result<(), InfraError>;

    /// カレンダーイベント ID を部分更新する
    ///
    /// カレンダー同期専用。予約ユースケースからは使わない。
    async fn update_calendar_event_ids(
        &self,
        id: &AppointmentId,
        update: &CalendarEventIdsUpdate,
    ) -> Result<(), InfraError>;

    /// 患者の予約一覧の変更を購読する
    ///
    /// 登録時に現在の一覧を 1 回通知する。
    async fn subscribe_patient_appointments(
        &self,
        patient_id: &PatientId,
        listener: AppointmentListener,
    ) -> Result<Subscription, InfraError>;

    /// 栄養士の申込中予約一覧の変更を購読する
    ///
    /// 登録時に現在の一覧を 1 回通知する。
    async fn subscribe_nutritionist_pending(
        &self,
        nutritionist_id: &NutritionistId,
        listener: AppointmentListener,
    ) -> Result<Subscription, InfraError>;
}

/// 保存される予約の行
///
/// 永続化ストアと同じく、値オブジェクトではなくプリミティブで保持する。
/// `TryFrom` で `Appointment` への変換ロジックを一箇所に集約する。
#[derive(Debug, Clone)]
struct AppointmentRow {
    id: Uuid,
    patient_id: String,
    nutritionist_id: String,
    date: NaiveDate,
    time_start: String,
    time_end: String,
    status: String,
    observations: Option<String>,
    calendar_event_id_patient: Option<String>,
    calendar_event_id_nutritionist: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<&Appointment> for AppointmentRow {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: *appointment.id().as_uuid(),
            patient_id: appointment.patient_id().to_string(),
            nutritionist_id: appointment.nutritionist_id().to_string(),
            date: appointment.date(),
            time_start: appointment.time_start().to_string(),
            time_end: appointment.time_end().to_string(),
            status: appointment.status().to_string(),
            observations: appointment.observations().map(str::to_string),
            calendar_event_id_patient: appointment.calendar_event_id_patient().map(str::to_string),
            calendar_event_id_nutritionist: appointment
                .calendar_event_id_nutritionist()
                .map(str::to_string),
            created_at: appointment.created_at(),
            updated_at: appointment.updated_at(),
        }
    }
}

impl TryFrom<&AppointmentRow> for Appointment {
    type Error = InfraError;

    fn try_from(row: &AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment::from_db(AppointmentRecord {
            id: AppointmentId::from_uuid(row.id),
            patient_id: PatientId::new(row.patient_id.as_str())
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            nutritionist_id: NutritionistId::new(row.nutritionist_id.as_str())
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            date: row.date,
            slot: SlotWindow::from_catalog(&row.time_start, &row.time_end)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            status: row
                .status
                .parse::<AppointmentStatus>()
                .map_err(|e| InfraError::unexpected(format!("不正なステータス: {e}")))?,
            observations: row.observations.clone(),
            calendar_event_id_patient: row.calendar_event_id_patient.clone(),
            calendar_event_id_nutritionist: row.calendar_event_id_nutritionist.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

/// 購読の条件
#[derive(Debug, Clone)]
enum WatchFilter {
    Patient(String),
    NutritionistPending(String),
}

impl WatchFilter {
    fn matches(&self, row: &AppointmentRow) -> bool {
        match self {
            Self::Patient(patient_id) => row.patient_id == *patient_id,
            Self::NutritionistPending(nutritionist_id) => {
                row.nutritionist_id == *nutritionist_id
                    && row.status == AppointmentStatus::Pending.to_string()
            }
        }
    }
}

struct Watcher {
    filter:   WatchFilter,
    listener: AppointmentListener,
    active:   Arc<AtomicBool>,
    mailbox:  Arc<Mutex<Mailbox>>,
}

/// 購読者ごとの未配信の通知
///
/// 配信中のスレッドは 1 つだけで、他のスレッドは最新の一覧を置いて戻る。
#[derive(Default)]
struct Mailbox {
    /// 受け付けた最新の版番号
    version:  u64,
    /// まだリスナーに渡していない最新の一覧
    pending:  Option<Vec<Appointment>>,
    draining: bool,
}

/// 購読者への 1 回分の通知
struct Delivery {
    listener:     AppointmentListener,
    active:       Arc<AtomicBool>,
    mailbox:      Arc<Mutex<Mailbox>>,
    /// 一覧を組み立てた時点のテーブルの版番号
    version:      u64,
    appointments: Vec<Appointment>,
}

impl Delivery {
    /// ストアのロックを解放した後に呼ぶ
    fn run(self) {
        let Ok(mut mailbox) = self.mailbox.lock() else {
            return;
        };
        if self.version <= mailbox.version {
            return;
        }
        mailbox.version = self.version;
        mailbox.pending = Some(self.appointments);
        if mailbox.draining {
            return;
        }
        mailbox.draining = true;

        while let Some(appointments) = mailbox.pending.take() {
            drop(mailbox);
            if self.active.load(Ordering::SeqCst) {
                (self.listener)(&appointments);
            }
            mailbox = match self.mailbox.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
        }
        mailbox.draining = false;
    }
}

#[derive(Default)]
struct Table {
    rows: Vec<AppointmentRow>,
    watchers: HashMap<u64, Watcher>,
    next_watcher_id: u64,
    /// 行または購読者が変わるたびに増える版番号
    version: u64,
}

impl Table {
    fn select(
        &self,
        predicate: impl Fn(&AppointmentRow) -> bool,
    ) -> Result<Vec<Appointment>, InfraError> {
        self.rows
            .iter()
            .filter(|row| predicate(row))
            .map(Appointment::try_from)
            .collect()
    }

    fn row_mut(&mut self, id: &AppointmentId) -> Result<&mut AppointmentRow, InfraError> {
        self.rows
            .iter_mut()
            .find(|row| row.id == *id.as_uuid())
            .ok_or_else(|| InfraError::not_found("Appointment", id.to_string()))
    }

    /// 変更前後の行のいずれかに一致する購読者への通知を組み立てる
    ///
    /// 版番号を進めてから呼ぶ。
    fn deliveries_for(
        &self,
        before: Option<&AppointmentRow>,
        after: &AppointmentRow,
    ) -> Result<Vec<Delivery>, InfraError> {
        self.watchers
            .values()
            .filter(|watcher| {
                watcher.filter.matches(after) || before.is_some_and(|row| watcher.filter.matches(row))
            })
            .map(|watcher| self.delivery_to(watcher))
            .collect()
    }

    fn delivery_to(&self, watcher: &Watcher) -> Result<Delivery, InfraError> {
        Ok(Delivery {
            listener:     Arc::clone(&watcher.listener),
            active:       Arc::clone(&watcher.active),
            mailbox:      Arc::clone(&watcher.mailbox),
            version:      self.version,
            appointments: self.select(|row| watcher.filter.matches(row))?,
        })
    }
}

/// インメモリの予約ストア
///
/// クローンは同じストアを共有する。
#[derive(Clone, Default)]
pub struct InMemoryAppointmentRepository {
    table: Arc<Mutex<Table>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, Table>, InfraError> {
        self.table
            .lock()
            .map_err(|_| InfraError::unexpected("予約ストアのロック取得に失敗しました"))
    }

    /// 1 行を更新し、影響を受ける購読者に通知する
    fn mutate_row(
        &self,
        id: &AppointmentId,
        apply: impl FnOnce(&mut AppointmentRow),
    ) -> Result<(), InfraError> {
        let deliveries = {
            let mut table = self.table()?;
            let row = table.row_mut(id)?;
            let before = row.clone();
            apply(row);
            let after = row.clone();
            table.version += 1;
            table.deliveries_for(Some(&before), &after)?
        };
        deliveries.into_iter().for_each(Delivery::run);
        Ok(())
    }

    fn subscribe(
        &self,
        filter: WatchFilter,
        listener: AppointmentListener,
    ) -> Result<Subscription, InfraError> {
        let (watcher_id, initial) = {
            let mut table = self.table()?;
            table.version += 1;
            let watcher = Watcher {
                filter,
                listener,
                active: Arc::new(AtomicBool::new(true)),
                mailbox: Arc::default(),
            };
            let initial = table.delivery_to(&watcher)?;
            let watcher_id = table.next_watcher_id;
            table.next_watcher_id += 1;
            table.watchers.insert(watcher_id, watcher);
            (watcher_id, initial)
        };
        let active = Arc::clone(&initial.active);
        initial.run();

        let table = Arc::downgrade(&self.table);
        Ok(Subscription::new(move || {
            active.store(false, Ordering::SeqCst);
            if let Some(strong) = table.upgrade()
                && let Ok(mut guard) = strong.lock()
            {
                guard.watchers.remove(&watcher_id);
            }
        }))
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(appointment_id = %appointment.id()))]
    async fn insert(&self, appointment: &Appointment) -> Result<(), InfraError> {
        let deliveries = {
            let mut table = self.table()?;
            let row = AppointmentRow::from(appointment);
            if table.rows.iter().any(|existing| existing.id == row.id) {
                return Err(InfraError::unexpected(format!(
                    "予約 ID が重複しています: {}",
                    appointment.id()
                )));
            }
            table.rows.push(row.clone());
            table.version += 1;
            table.deliveries_for(None, &row)?
        };
        deliveries.into_iter().for_each(Delivery::run);
        Ok(())
    }

    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, InfraError> {
        let table = self.table()?;
        table
            .rows
            .iter()
            .find(|row| row.id == *id.as_uuid())
            .map(Appointment::try_from)
            .transpose()
    }

    async fn find_by_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<Appointment>, InfraError> {
        self.table()?
            .select(|row| row.patient_id == patient_id.as_str())
    }

    async fn find_by_date(
        &self,
        date: NaiveDate,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        self.table()?
            .select(|row| row.date == date && row.nutritionist_id == nutritionist_id.as_str())
    }

    async fn find_by_status(
        &self,
        status: AppointmentStatus,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        let status = status.to_string();
        self.table()?
            .select(|row| row.status == status && row.nutritionist_id == nutritionist_id.as_str())
    }

    async fn find_accepted_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        nutritionist_id: &NutritionistId,
    ) -> Result<Vec<Appointment>, InfraError> {
        let accepted = AppointmentStatus::Accepted.to_string();
        self.table()?.select(|row| {
            row.status == accepted
                && row.nutritionist_id == nutritionist_id.as_str()
                && (start..=end).contains(&row.date)
        })
    }

    #[tracing::instrument(skip_all, level = "debug", fields(appointment_id = %id, %status))]
    async fn update_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
        updated_at: NaiveDateTime,
    ) -> Result<(), InfraError> {
        self.mutate_row(id, |row| {
            row.status = status.to_string();
            row.updated_at = updated_at;
        })
    }

    #[tracing::instrument(skip_all, level = "debug", fields(appointment_id = %id))]
    async fn update_calendar_event_ids(
        &self,
        id: &AppointmentId,
        update: &CalendarEventIdsUpdate,
    ) -> Result<(), InfraError> {
        self.mutate_row(id, |row| {
            if let Some(patient) = &update.patient {
                row.calendar_event_id_patient = Some(patient.clone());
            }
            if let Some(nutritionist) = &update.nutritionist {
                row.calendar_event_id_nutritionist = Some(nutritionist.clone());
            }
        })
    }

    async fn subscribe_patient_appointments(
        &self,
        patient_id: &PatientId,
        listener: AppointmentListener,
    ) -> Result<Subscription, InfraError> {
        self.subscribe(WatchFilter::Patient(patient_id.to_string()), listener)
    }

    async fn subscribe_nutritionist_pending(
        &self,
        nutritionist_id: &NutritionistId,
        listener: AppointmentListener,
    ) -> Result<Subscription, InfraError> {
        self.subscribe(
            WatchFilter::NutritionistPending(nutritionist_id.to_string()),
            listener,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread, time::Duration};

    use nutriagenda_domain::appointment::NewAppointment;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::InfraErrorKind;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    fn appointment(patient: &str, date: NaiveDate, start: &str, end: &str) -> Appointment {
        Appointment::new(NewAppointment {
            id: AppointmentId::new(),
            patient_id: PatientId::new(patient).unwrap(),
            nutritionist_id: NutritionistId::new("n1").unwrap(),
            date,
            slot: SlotWindow::from_catalog(start, end).unwrap(),
            observations: None,
            now: now(),
        })
    }

    fn n1() -> NutritionistId {
        NutritionistId::new("n1").unwrap()
    }

    /// 通知された予約 ID の一覧を記録するリスナー
    fn recorder() -> (Arc<Mutex<Vec<Vec<AppointmentId>>>>, AppointmentListener) {
        let calls: Arc<Mutex<Vec<Vec<AppointmentId>>>> = Arc::new(Mutex::new(Vec::new()));
        let cloned = Arc::clone(&calls);
        let listener: AppointmentListener = Arc::new(move |appointments: &[Appointment]| {
            cloned
                .lock()
                .unwrap()
                .push(appointments.iter().map(|a| a.id().clone()).collect());
        });
        (calls, listener)
    }

    #[tokio::test]
    async fn test_insert後にfind_by_idで取得できる() {
        // Arrange
        let sut = InMemoryAppointmentRepository::new();
        let appointment = appointment("p1", monday(), "09:00", "11:00");

        // Act
        sut.insert(&appointment).await.unwrap();

        // Assert
        let found = sut.find_by_id(appointment.id()).await.unwrap();
        assert_eq!(found, Some(appointment));
    }

    #[tokio::test]
    async fn test_存在しないidはnoneを返す() {
        let sut = InMemoryAppointmentRepository::new();

        let found = sut.find_by_id(&AppointmentId::new()).await.unwrap();

        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_同じidの二重insertはエラー() {
        let sut = InMemoryAppointmentRepository::new();
        let appointment = appointment("p1", monday(), "09:00", "11:00");
        sut.insert(&appointment).await.unwrap();

        let result = sut.insert(&appointment).await;

        assert!(matches!(
            result.unwrap_err().kind(),
            InfraErrorKind::Unexpected(_)
        ));
    }

    #[tokio::test]
    async fn test_update_statusでステータスと更新日時が変わる() {
        // Arrange
        let now = now();
        let sut = InMemoryAppointmentRepository::new();
        let appointment = appointment("p1", monday(), "09:00", "11:00");
        sut.insert(&appointment).await.unwrap();
        let later = now + chrono::Duration::hours(1);

        // Act
        sut.update_status(appointment.id(), AppointmentStatus::Accepted, later)
            .await
            .unwrap();

        // Assert
        let found = sut.find_by_id(appointment.id()).await.unwrap().unwrap();
        assert_eq!(found.status(), AppointmentStatus::Accepted);
        assert_eq!(found.updated_at(), later);
        assert_eq!(found.created_at(), now);
    }

    #[tokio::test]
    async fn test_存在しない予約のupdate_statusはnot_found() {
        let sut = InMemoryAppointmentRepository::new();

        let result = sut
            .update_status(&AppointmentId::new(), AppointmentStatus::Accepted, now())
            .await;

        assert!(matches!(
            result.unwrap_err().kind(),
            InfraErrorKind::NotFound { entity, .. } if entity == "Appointment"
        ));
    }

    #[tokio::test]
    async fn test_検索メソッドは条件で絞り込む() {
        // Arrange
        let sut = InMemoryAppointmentRepository::new();
        let tuesday = monday().succ_opt().unwrap();
        let a = appointment("p1", monday(), "09:00", "11:00");
        let b = appointment("p2", monday(), "11:00", "13:00");
        let c = appointment("p1", tuesday, "09:00", "11:00");
        let other = Appointment::new(NewAppointment {
            id: AppointmentId::new(),
            patient_id: PatientId::new("p1").unwrap(),
            nutritionist_id: NutritionistId::new("n2").unwrap(),
            date: monday(),
            slot: SlotWindow::from_catalog("09:00", "11:00").unwrap(),
            observations: None,
            now: now(),
        });
        for appointment in [&a, &b, &c, &other] {
            sut.insert(appointment).await.unwrap();
        }
        sut.update_status(b.id(), AppointmentStatus::Accepted, now())
            .await
            .unwrap();
        sut.update_status(c.id(), AppointmentStatus::Accepted, now())
            .await
            .unwrap();

        // Act & Assert
        let ids = |list: Vec<Appointment>| list.iter().map(|a| a.id().clone()).collect::<Vec<_>>();

        let by_date = sut.find_by_date(monday(), &n1()).await.unwrap();
        assert_eq!(ids(by_date), vec![a.id().clone(), b.id().clone()]);

        let by_patient = sut.find_by_patient(&PatientId::new("p1").unwrap()).await.unwrap();
        assert_eq!(
            ids(by_patient),
            vec![a.id().clone(), c.id().clone(), other.id().clone()]
        );

        let pending = sut
            .find_by_status(AppointmentStatus::Pending, &n1())
            .await
            .unwrap();
        assert_eq!(ids(pending), vec![a.id().clone()]);

        let accepted = sut
            .find_accepted_by_date_range(monday(), tuesday, &n1())
            .await
            .unwrap();
        assert_eq!(ids(accepted), vec![b.id().clone(), c.id().clone()]);

        let accepted_monday_only = sut
            .find_accepted_by_date_range(monday(), monday(), &n1())
            .await
            .unwrap();
        assert_eq!(ids(accepted_monday_only), vec![b.id().clone()]);
    }

    #[tokio::test]
    async fn test_カレンダーイベントidは指定したフィールドのみ更新される() {
        // Arrange
        let sut = InMemoryAppointmentRepository::new();
        let appointment = appointment("p1", monday(), "09:00", "11:00");
        sut.insert(&appointment).await.unwrap();

        // Act
        sut.update_calendar_event_ids(
            appointment.id(),
            &CalendarEventIdsUpdate {
                patient:      Some("evt-p".to_string()),
                nutritionist: None,
            },
        )
        .await
        .unwrap();
        sut.update_calendar_event_ids(
            appointment.id(),
            &CalendarEventIdsUpdate {
                patient:      None,
                nutritionist: Some("evt-n".to_string()),
            },
        )
        .await
        .unwrap();

        // Assert
        let found = sut.find_by_id(appointment.id()).await.unwrap().unwrap();
        assert_eq!(found.calendar_event_id_patient(), Some("evt-p"));
        assert_eq!(found.calendar_event_id_nutritionist(), Some("evt-n"));
        assert_eq!(found.status(), AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_患者の購読は登録時と変更時に全件を受け取る() {
        // Arrange
        let sut = InMemoryAppointmentRepository::new();
        let first = appointment("p1", monday(), "09:00", "11:00");
        sut.insert(&first).await.unwrap();
        let (calls, listener) = recorder();

        // Act
        let subscription = sut
            .subscribe_patient_appointments(&PatientId::new("p1").unwrap(), listener)
            .await
            .unwrap();
        let second = appointment("p1", monday(), "11:00", "13:00");
        sut.insert(&second).await.unwrap();
        sut.insert(&appointment("p2", monday(), "14:00", "16:00"))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                vec![first.id().clone()],
                vec![first.id().clone(), second.id().clone()],
            ]
        );
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_申込中の購読は申込中でなくなった変更も通知される() {
        // Arrange
        let sut = InMemoryAppointmentRepository::new();
        let pending = appointment("p1", monday(), "09:00", "11:00");
        sut.insert(&pending).await.unwrap();
        let (calls, listener) = recorder();
        let _subscription = sut
            .subscribe_nutritionist_pending(&n1(), listener)
            .await
            .unwrap();

        // Act
        sut.update_status(pending.id(), AppointmentStatus::Accepted, now())
            .await
            .unwrap();

        // Assert
        assert_eq!(
            *calls.lock().unwrap(),
            vec![vec![pending.id().clone()], vec![]]
        );
    }

    #[tokio::test]
    async fn test_購読解除後は通知されない() {
        // Arrange
        let sut = InMemoryAppointmentRepository::new();
        let (calls, listener) = recorder();
        let subscription = sut
            .subscribe_patient_appointments(&PatientId::new("p1").unwrap(), listener)
            .await
            .unwrap();

        // Act
        subscription.unsubscribe();
        sut.insert(&appointment("p1", monday(), "09:00", "11:00"))
            .await
            .unwrap();

        // Assert: 登録時の 1 回のみ
        assert_eq!(*calls.lock().unwrap(), vec![Vec::<AppointmentId>::new()]);
    }

    #[tokio::test]
    async fn test_ハンドル破棄後は通知されない() {
        let sut = InMemoryAppointmentRepository::new();
        let (calls, listener) = recorder();
        let subscription = sut
            .subscribe_nutritionist_pending(&n1(), listener)
            .await
            .unwrap();

        drop(subscription);
        sut.insert(&appointment("p1", monday(), "09:00", "11:00"))
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_クローンは同じストアを共有する() {
        let sut = InMemoryAppointmentRepository::new();
        let cloned = sut.clone();
        let appointment = appointment("p1", monday(), "09:00", "11:00");

        cloned.insert(&appointment).await.unwrap();

        assert!(sut.find_by_id(appointment.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_リスナー内からストアに書き込める() {
        // Arrange: 申込中を受け取ったら拒否に書き換えるリスナー
        let sut = InMemoryAppointmentRepository::new();
        let pending = appointment("p1", monday(), "09:00", "11:00");
        sut.insert(&pending).await.unwrap();
        let (calls, record) = recorder();
        let store = sut.clone();
        let listener: AppointmentListener = Arc::new(move |appointments: &[Appointment]| {
            record(appointments);
            for appointment in appointments {
                store
                    .mutate_row(appointment.id(), |row| {
                        row.status = AppointmentStatus::Rejected.to_string();
                    })
                    .unwrap();
            }
        });

        // Act
        let _subscription = sut
            .subscribe_nutritionist_pending(&n1(), listener)
            .await
            .unwrap();

        // Assert: 書き込みによる通知は登録時の通知の後に届く
        assert_eq!(*calls.lock().unwrap(), vec![vec![pending.id().clone()], vec![]]);
        let stored = sut.find_by_id(pending.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), AppointmentStatus::Rejected);
    }

    #[tokio::test]
    async fn test_リスナーの処理中も他の書き込みは待たされない() {
        // Arrange
        let sut = InMemoryAppointmentRepository::new();
        let watched = appointment("p1", monday(), "09:00", "11:00");
        let other = appointment("p2", monday(), "11:00", "13:00");
        sut.insert(&watched).await.unwrap();
        sut.insert(&other).await.unwrap();

        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let released = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&released);
        let listener: AppointmentListener = Arc::new(move |appointments: &[Appointment]| {
            if appointments
                .iter()
                .any(|a| a.status() == AppointmentStatus::Cancelled)
            {
                entered_tx.send(()).unwrap();
                let result = release_rx
                    .lock()
                    .unwrap()
                    .recv_timeout(Duration::from_secs(5));
                recorded.lock().unwrap().push(result.is_ok());
            }
        });
        let _subscription = sut
            .subscribe_patient_appointments(&PatientId::new("p1").unwrap(), listener)
            .await
            .unwrap();

        // Act: 別スレッドの書き込みがリスナー内で止まっている間に書き込む
        let slow = sut.clone();
        let watched_id = watched.id().clone();
        let slow_write = thread::spawn(move || {
            slow.mutate_row(&watched_id, |row| {
                row.status = AppointmentStatus::Cancelled.to_string();
            })
        });
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        sut.mutate_row(other.id(), |row| {
            row.status = AppointmentStatus::Accepted.to_string();
        })
        .unwrap();
        release_tx.send(()).unwrap();
        slow_write.join().unwrap().unwrap();

        // Assert
        assert_eq!(*released.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_古い版の通知は新しい版の後では捨てられる() {
        let (calls, listener) = recorder();
        let mailbox: Arc<Mutex<Mailbox>> = Arc::default();
        let active = Arc::new(AtomicBool::new(true));
        let newer = appointment("p1", monday(), "09:00", "11:00");
        let delivery = |version: u64, appointments: Vec<Appointment>| Delivery {
            listener: Arc::clone(&listener),
            active: Arc::clone(&active),
            mailbox: Arc::clone(&mailbox),
            version,
            appointments,
        };

        delivery(2, vec![newer.clone()]).run();
        delivery(1, vec![]).run();

        assert_eq!(*calls.lock().unwrap(), vec![vec![newer.id().clone()]]);
    }
}
