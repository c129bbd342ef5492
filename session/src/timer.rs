//! Resettable inactivity timer.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

pub struct InactivityTimer {
    timeout: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl InactivityTimer {
    /// Arms the timer to fire `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sleep: Box::pin(tokio::time::sleep(timeout)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self) -> Instant {
        self.sleep.deadline()
    }

    /// Pushes the deadline back to a full timeout from now.
    pub fn reset(&mut self) {
        let deadline = Instant::now() + self.timeout;
        self.sleep.as_mut().reset(deadline);
    }

    /// Completes once the deadline passes.
    pub async fn expired(&mut self) {
        self.sleep.as_mut().await
    }
}
