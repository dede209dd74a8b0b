//! 変更購読のハンドル

/// 変更購読の解除ハンドル
///
/// [`unsubscribe`](Subscription::unsubscribe) を呼ぶか、ハンドルを破棄すると購読が解除される。
/// 解除後に開始される通知はない。
#[must_use = "ハンドルを破棄すると購読が解除される"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// 解除処理を指定してハンドルを作成する
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// 購読を解除する
    pub fn unsubscribe(mut self) {
        self.cancel_once();
    }

    fn cancel_once(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_once();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
