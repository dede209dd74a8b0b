//! 確定後のライフサイクル操作（キャンセル・再有効化）

mod cancel;
mod reactivate;
