use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// A way of sharing the latest frame between the frame loop and a renderer such that the frame
/// loop never blocks. A slow renderer sees fewer frames, never stale ones.
///
/// Only works with 1 waiter & 1 updater.
#[derive(Clone)]
pub struct MonitorData<T> {
    inner: Arc<Shared<T>>,
}

struct Shared<T> {
    data: Mutex<Inner<T>>,
    /// waker
    waker: Condvar,
}

struct Inner<T> {
    value: T,
    /// Bumped on every update.
    generation: u64,
    new_data: bool,
    shutdown: bool,
}

impl<T> MonitorData<T> {
    pub fn new(inner: T) -> Self {
        MonitorData {
            inner: Arc::new(Shared {
                data: Mutex::new(Inner {
                    value: inner,
                    generation: 0,
                    new_data: false,
                    shutdown: false,
                }),
                waker: Condvar::new(),
            }),
        }
    }

    /// Replace the value and inc. the gen number. If the mutex is locked then skip over.
    ///
    /// Returns whether the update landed.
    pub fn update(&self, cb: impl FnOnce(&mut T)) -> bool {
        let mut data = match self.inner.data.try_lock() {
            Some(lock) => lock,
            // the renderer is reading, try again on next frame
            None => return false,
        };
        if data.shutdown {
            return false;
        }
        cb(&mut data.value);
        data.generation += 1;
        data.new_data = true;
        self.inner.waker.notify_one();
        true
    }

    /// Call `cb` each time the value changes, until [`close`](MonitorData::close) is called.
    pub fn on_changed(&self, mut cb: impl FnMut(&T)) {
        let mut data = self.inner.data.lock();
        loop {
            while !data.new_data && !data.shutdown {
                self.inner.waker.wait(&mut data);
            }
            if data.shutdown {
                break;
            }
            cb(&data.value);
            data.new_data = false;
        }
    }

    /// Wake the waiter and make it return. Later updates are dropped.
    pub fn close(&self) {
        let mut data = self.inner.data.lock();
        data.shutdown = true;
        self.inner.waker.notify_all();
    }

    pub fn generation(&self) -> u64 {
        self.inner.data.lock().generation
    }
}

impl<T: Clone> MonitorData<T> {
    pub fn latest(&self) -> T {
        self.inner.data.lock().value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn updates_bump_generation() {
        let data = MonitorData::new(0u32);
        assert!(data.update(|v| *v = 5));
        assert!(data.update(|v| *v += 1));
        assert_eq!(data.latest(), 6);
        assert_eq!(data.generation(), 2);
    }

    #[test]
    fn close_ends_waiter() {
        let data = MonitorData::new(0u32);
        let waiter = data.clone();
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            waiter.on_changed(|v| seen.push(*v));
            seen
        });
        data.update(|v| *v = 1);
        data.close();
        let seen = handle.join().unwrap();
        // the waiter may or may not have woken before the close
        assert!(seen.is_empty() || seen == vec![1]);
        assert!(!data.update(|v| *v = 2));
        assert_eq!(data.latest(), 1);
    }
}
