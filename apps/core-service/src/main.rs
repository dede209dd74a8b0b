//! # Core Service サーバー
//!
//! 栄養クリニックの予約を管理するサービス。
//!
//! ## 役割
//!
//! - **予約ライフサイクル**: 申込・確定・拒否・キャンセル・再有効化
//! - **枠の重複管理**: 同じ枠の確定済み予約を 1 件に保つ
//! - **照会**: 空き枠・アジェンダ・申込中一覧
//!
//! ## 環境変数
//!
//! 設定項目は [`config`](nutriagenda_core_service::config) を参照。
//! 加えて `RUST_LOG` と `LOG_FORMAT`（`json` / `pretty`）でログ出力を制御する。
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p nutriagenda-core-service
//!
//! CORE_PORT=8080 LOG_FORMAT=json cargo run -p nutriagenda-core-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use nutriagenda_core_service::{
    app_builder::build_app,
    config::{CoreConfig, NotificationBackend},
    handler::AppointmentState,
    usecase::{AppointmentUseCaseImpl, NotificationService},
};
use nutriagenda_domain::clock::SystemClock;
use nutriagenda_infra::{
    notification::{NoopPushSender, PushNotificationSender},
    repository::InMemoryAppointmentRepository,
};
use nutriagenda_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Core Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("core-service"));

    // 設定読み込み
    let config = CoreConfig::from_env()?;

    tracing::info!(
        "Core Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // 依存コンポーネントを初期化
    let sender: Arc<dyn PushNotificationSender> = match config.notification_backend {
        NotificationBackend::Noop => Arc::new(NoopPushSender),
    };
    let state = Arc::new(AppointmentState {
        usecase:       AppointmentUseCaseImpl::new(
            Arc::new(InMemoryAppointmentRepository::new()),
            Arc::new(SystemClock),
            config.booking,
        ),
        notifications: NotificationService::new(sender),
    });

    let app = build_app(state);

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Core Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
