use std::sync::Arc;

use tokio::sync::watch;

/// Shared state cell that publishes every change to its subscribers.
///
/// Writers always replace or patch the whole value under the channel lock,
/// so an observer never sees a half-applied update.
pub struct Observable<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Inspect the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Patch the value; subscribers are only notified when `f` returns true.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_update() {
        let cell = Observable::new(1);
        cell.set(2);
        cell.update(|v| *v += 3);
        assert_eq!(cell.get(), 5);
        assert!(cell.with(|v| *v == 5));
    }

    #[test]
    fn test_clones_share_state() {
        let cell = Observable::new(String::from("a"));
        let other = cell.clone();
        other.set("b".to_string());
        assert_eq!(cell.get(), "b");
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let cell = Observable::new(0);
        let mut rx = cell.subscribe();

        cell.update(|v| *v = 7);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 7);
    }

    #[test]
    fn test_update_if_skips_unchanged() {
        let cell = Observable::new(vec![1, 2]);
        let mut rx = cell.subscribe();
        rx.borrow_and_update();

        assert!(!cell.update_if(|v| {
            let before = v.len();
            v.retain(|x| *x != 9);
            v.len() != before
        }));
        assert!(!rx.has_changed().unwrap());

        assert!(cell.update_if(|v| {
            v.push(3);
            true
        }));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), vec![1, 2, 3]);
    }
}
