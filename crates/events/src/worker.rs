//! Dedicated consumer thread for a bus subscription.
//!
//! One worker owns one subscription and applies one handler. The loop
//! alternates a short blocking wait with a backlog drain, so a burst of
//! publications (a rescan releasing several items, say) is processed in one
//! pass instead of one message per poll interval. Handlers must be
//! idempotent: delivery is at-least-once and a handler error does not
//! consume a retry, it only logs.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use ledgerpilot_core::TenantId;

use crate::bus::{EventBus, Subscription};
use crate::tenant::TenantScoped;

/// How long the loop blocks on the subscription between stop checks.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Owns the consumer thread; dropping without [`WorkerHandle::shutdown`]
/// detaches it.
#[derive(Debug)]
pub struct WorkerHandle {
    stop: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Ask the worker to stop and wait for it. Messages already received
    /// are handled before the thread exits.
    pub fn shutdown(mut self) {
        let _ = self.stop.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub struct EventWorker;

impl EventWorker {
    /// Subscribe to `bus` and start a named thread feeding `handler`.
    ///
    /// With a `tenant_id`, messages for other tenants are silently skipped;
    /// `None` consumes everything.
    pub fn spawn<M, B, H, E>(
        name: &'static str,
        bus: B,
        tenant_id: Option<TenantId>,
        handler: H,
    ) -> WorkerHandle
    where
        M: TenantScoped + Send + 'static,
        B: EventBus<M> + Send + Sync + 'static,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let subscription = bus.subscribe();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(name, subscription, stop_rx, tenant_id, handler))
            .expect("worker thread spawn failed");

        WorkerHandle {
            stop: stop_tx,
            thread: Some(thread),
        }
    }
}

fn run<M, H, E>(
    name: &'static str,
    subscription: Subscription<M>,
    stop: mpsc::Receiver<()>,
    tenant_id: Option<TenantId>,
    mut handler: H,
) where
    M: TenantScoped,
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    debug!(worker = name, "event worker started");

    'outer: loop {
        if stop.try_recv().is_ok() {
            break;
        }

        match subscription.recv_timeout(POLL_INTERVAL) {
            Ok(message) => handle(name, tenant_id, &mut handler, message),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        // Drain whatever queued up behind the first message.
        loop {
            match subscription.try_recv() {
                Ok(message) => handle(name, tenant_id, &mut handler, message),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => break 'outer,
            }
        }
    }

    debug!(worker = name, "event worker stopped");
}

fn handle<M, H, E>(name: &'static str, tenant_id: Option<TenantId>, handler: &mut H, message: M)
where
    M: TenantScoped,
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    if let Some(tenant) = tenant_id {
        if message.tenant_id() != tenant {
            return;
        }
    }
    if let Err(err) = handler(message) {
        warn!(worker = name, error = ?err, "event handler failed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;
    use crate::in_memory::InMemoryEventBus;

    #[derive(Debug, Clone)]
    struct Msg {
        tenant_id: TenantId,
    }

    impl TenantScoped for Msg {
        fn tenant_id(&self) -> TenantId {
            self.tenant_id
        }
    }

    fn wait_for(counter: &AtomicUsize, target: usize) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while counter.load(Ordering::SeqCst) < target && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn only_the_workers_tenant_reaches_the_handler() {
        let bus = Arc::new(InMemoryEventBus::<Msg>::new());
        let tenant = TenantId::new();
        let other = TenantId::new();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let handle = EventWorker::spawn(
            "tenant-filter",
            Arc::clone(&bus),
            Some(tenant),
            move |_msg: Msg| -> Result<(), String> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );

        bus.publish(Msg { tenant_id: tenant }).unwrap();
        bus.publish(Msg { tenant_id: other }).unwrap();
        bus.publish(Msg { tenant_id: tenant }).unwrap();

        wait_for(&seen, 2);
        handle.shutdown();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn a_handler_error_does_not_stop_the_loop() {
        let bus = Arc::new(InMemoryEventBus::<Msg>::new());
        let tenant = TenantId::new();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let handle = EventWorker::spawn(
            "flaky-handler",
            Arc::clone(&bus),
            None,
            move |_msg: Msg| -> Result<(), String> {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err("first one fails".to_string())
                } else {
                    Ok(())
                }
            },
        );

        bus.publish(Msg { tenant_id: tenant }).unwrap();
        bus.publish(Msg { tenant_id: tenant }).unwrap();

        wait_for(&seen, 2);
        handle.shutdown();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn a_burst_is_drained_without_waiting_a_poll_interval_per_message() {
        let bus = Arc::new(InMemoryEventBus::<Msg>::new());
        let tenant = TenantId::new();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let handle = EventWorker::spawn(
            "burst-drain",
            Arc::clone(&bus),
            None,
            move |_msg: Msg| -> Result<(), String> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );

        for _ in 0..20 {
            bus.publish(Msg { tenant_id: tenant }).unwrap();
        }

        // 20 messages at one-per-interval would need 5s; the drain gets
        // them well inside the 2s deadline.
        wait_for(&seen, 20);
        handle.shutdown();
        assert_eq!(seen.load(Ordering::SeqCst), 20);
    }
}
