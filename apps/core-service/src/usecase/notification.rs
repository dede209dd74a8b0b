//! # 通知ユースケース
//!
//! 予約操作に伴うプッシュ通知の生成・送信・ログ記録を統合する。
//!
//! 予約ユースケースからは呼ばれず、HTTP ハンドラが成功後に呼び出す。

pub mod service;

pub use service::NotificationService;
