// New-device push notifications

pub mod pushplus;

pub use pushplus::PushPlusNotifier;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Device;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("push request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("push endpoint rejected message (code {code:?}): {message}")]
    Rejected { code: Option<i64>, message: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_new_devices(&self, devices: &[Device]) -> Result<(), NotifyError>;
}
