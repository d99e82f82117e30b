use log::debug;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// A unit of work scheduled onto the controlling context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The controlling ("main") execution context that completion callbacks are delivered to.
///
/// Background work never calls user callbacks directly. It sends them through a [`MainHandle`],
/// and whichever thread owns the `MainQueue` runs them, in the order they were dispatched, when
/// it drains the queue with [`MainQueue::run_pending`], [`MainQueue::run_next`] or
/// [`MainQueue::run`].
pub struct MainQueue {
    receiver: mpsc::UnboundedReceiver<Job>,
}

/// Cloneable sending side of a [`MainQueue`].
#[derive(Clone, Debug)]
pub struct MainHandle {
    sender: mpsc::UnboundedSender<Job>,
}

impl MainQueue {
    /// Creates a queue together with the first handle that can dispatch onto it.
    pub fn channel() -> (MainHandle, MainQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (MainHandle { sender }, MainQueue { receiver })
    }

    /// Runs every job that is already queued without waiting for more. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(job) => {
                    job();
                    ran += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return ran,
            }
        }
    }

    /// Waits for the next job and runs it. Returns `false` once every handle has been dropped and
    /// the queue is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs jobs as they arrive until every [`MainHandle`] has been dropped.
    pub async fn run(mut self) {
        while self.run_next().await {}
    }
}

impl MainHandle {
    /// Schedules `job` to run on the controlling context.
    ///
    /// Returns `false` if the [`MainQueue`] has already been dropped, in which case the job is
    /// discarded.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let sent = self.sender.send(Box::new(job)).is_ok();
        if !sent {
            debug!("Main queue is gone, dropping dispatched job");
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn run_pending_preserves_dispatch_order() {
        let (handle, mut queue) = MainQueue::channel();
        let seen = Arc::new(Mutex::new(vec![]));
        for i in 0..5 {
            let seen = seen.clone();
            assert!(handle.dispatch(move || seen.lock().unwrap().push(i)));
        }

        assert_eq!(queue.run_pending(), 5);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn dispatch_fails_after_queue_dropped() {
        let (handle, queue) = MainQueue::channel();
        drop(queue);
        assert!(!handle.dispatch(|| {}));
    }

    #[tokio::test]
    async fn run_returns_when_all_handles_dropped() {
        let (handle, queue) = MainQueue::channel();
        let seen = Arc::new(Mutex::new(0));
        let other = handle.clone();

        let counter = seen.clone();
        tokio::spawn(async move {
            let c = counter.clone();
            handle.dispatch(move || *c.lock().unwrap() += 1);
            other.dispatch(move || *counter.lock().unwrap() += 10);
        });

        queue.run().await;
        assert_eq!(*seen.lock().unwrap(), 11);
    }
}
