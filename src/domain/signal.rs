use tokio::sync::watch;

/// Fires a one-shot, level-triggered signal observed by any number of [`Signal`]s.
///
/// Dropping the trigger counts as firing it.
#[derive(Debug)]
pub struct Trigger {
    tx: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct Signal {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (Trigger, Signal) {
    let (tx, rx) = watch::channel(false);
    (Trigger { tx }, Signal { rx })
}

impl Trigger {
    /// Returns `true` only for the call that actually fired the signal.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn signal(&self) -> Signal {
        Signal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Signal {
    pub fn is_fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once the trigger fired or was dropped.
    pub async fn fired(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_fire_is_idempotent() {
        let (trigger, signal) = channel();
        assert!(!signal.is_fired());
        assert!(trigger.fire());
        assert!(!trigger.fire());
        assert!(signal.is_fired());
    }

    #[tokio::test]
    async fn test_every_clone_observes_firing() {
        let (trigger, signal) = channel();
        let mut first = signal.clone();
        let mut second = trigger.signal();

        trigger.fire();

        timeout(Duration::from_secs(1), first.fired()).await.unwrap();
        timeout(Duration::from_secs(1), second.fired()).await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_trigger_releases_waiters() {
        let (trigger, mut signal) = channel();
        drop(trigger);
        timeout(Duration::from_secs(1), signal.fired()).await.unwrap();
    }

    #[tokio::test]
    async fn test_unfired_signal_stays_pending() {
        let (_trigger, mut signal) = channel();
        assert!(timeout(Duration::from_millis(50), signal.fired()).await.is_err());
    }
}
