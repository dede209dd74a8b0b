//! 統合テストの共通ヘルパー
//!
//! 固定時刻と共有ストアで SUT を組み立てる。

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use nutriagenda_core_service::{
    app_builder::build_app,
    handler::AppointmentState,
    usecase::{AppointmentUseCaseImpl, BookingPolicy, NotificationService, RequestAppointmentInput},
};
use nutriagenda_domain::{appointment::Appointment, clock::FixedClock};
use nutriagenda_infra::{
    mock::MockPushSender,
    repository::{AppointmentRepository, InMemoryAppointmentRepository},
};

/// 2030-01-04（金）10:00
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 1, 4)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// `now()` の次の月曜日
pub const NEXT_MONDAY: &str = "2030-01-07";

/// `now()` の次の土曜日
pub const NEXT_SATURDAY: &str = "2030-01-05";

/// 予約申込入力を組み立てる（栄養士は n1）
pub fn request_input(patient: &str, date: &str, time_start: &str, time_end: &str) -> RequestAppointmentInput {
    RequestAppointmentInput {
        patient_id: patient.to_string(),
        nutritionist_id: "n1".to_string(),
        date: date.to_string(),
        time_start: time_start.to_string(),
        time_end: time_end.to_string(),
        observations: None,
    }
}

/// 任意のリポジトリで SUT を構築する
pub fn build_usecase(repo: Arc<dyn AppointmentRepository>) -> AppointmentUseCaseImpl {
    AppointmentUseCaseImpl::new(repo, Arc::new(FixedClock::new(now())), BookingPolicy::default())
}

/// インメモリストアと SUT の組
pub struct Harness {
    pub repo: InMemoryAppointmentRepository,
    pub sut:  AppointmentUseCaseImpl,
}

impl Harness {
    pub fn setup() -> Self {
        let repo = InMemoryAppointmentRepository::new();
        let sut = build_usecase(Arc::new(repo.clone()));
        Self { repo, sut }
    }

    /// 次の月曜日の指定枠に申し込む
    pub async fn request_monday(&self, patient: &str, time_start: &str, time_end: &str) -> Appointment {
        self.sut
            .request_appointment(request_input(patient, NEXT_MONDAY, time_start, time_end))
            .await
            .unwrap()
    }

    /// ストアから最新の予約を読む
    pub async fn reload(&self, appointment: &Appointment) -> Appointment {
        self.repo
            .find_by_id(appointment.id())
            .await
            .unwrap()
            .unwrap()
    }
}

/// HTTP テスト用のルーターと、その裏側のストア・通知モック
pub struct TestApp {
    pub router: axum::Router,
    pub repo:   InMemoryAppointmentRepository,
    pub sender: MockPushSender,
}

impl TestApp {
    pub fn setup() -> Self {
        Self::with_sender(MockPushSender::new())
    }

    /// 通知の送信が常に失敗する構成
    pub fn with_failing_sender() -> Self {
        Self::with_sender(MockPushSender::failing())
    }

    fn with_sender(sender: MockPushSender) -> Self {
        let repo = InMemoryAppointmentRepository::new();
        let state = Arc::new(AppointmentState {
            usecase:       build_usecase(Arc::new(repo.clone())),
            notifications: NotificationService::new(Arc::new(sender.clone())),
        });
        Self {
            router: build_app(state),
            repo,
            sender,
        }
    }
}
