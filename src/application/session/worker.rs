//! Per-station inbound workers
//!
//! One router task fans inbound traffic out to a queue per station. Each queue
//! is drained by its own task, so frames from one station are handled strictly
//! in arrival order while different stations run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::handlers::Dispatcher;
use crate::application::ports::{InboundEvent, StationSender};
use crate::shared::shutdown::ShutdownSignal;
use crate::shared::OcppFrame;

struct Worker {
    queue: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

pub struct StationWorkers {
    dispatcher: Arc<Dispatcher>,
    outbound: Arc<dyn StationSender>,
    workers: HashMap<String, Worker>,
    /// Workers of disconnected stations that may still be draining.
    retired: HashMap<String, JoinHandle<()>>,
}

impl StationWorkers {
    pub fn new(dispatcher: Arc<Dispatcher>, outbound: Arc<dyn StationSender>) -> Self {
        Self {
            dispatcher,
            outbound,
            workers: HashMap::new(),
            retired: HashMap::new(),
        }
    }

    pub fn spawn(
        self,
        inbound: mpsc::UnboundedReceiver<InboundEvent>,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(inbound, shutdown))
    }

    pub async fn run(mut self, mut inbound: mpsc::UnboundedReceiver<InboundEvent>, shutdown: ShutdownSignal) {
        let stop = shutdown.notified().wait();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = &mut stop => {
                    info!(stations = self.workers.len(), "🛑 Station workers stopping");
                    break;
                }
                event = inbound.recv() => match event {
                    Some(InboundEvent::Frame { charge_point_id, text }) => {
                        self.route(charge_point_id, text);
                    }
                    Some(InboundEvent::Disconnected { charge_point_id }) => {
                        self.retire(&charge_point_id);
                    }
                    None => break,
                },
            }
        }
    }

    fn route(&mut self, charge_point_id: String, text: String) {
        let text = match self.workers.get(&charge_point_id) {
            Some(worker) => match worker.queue.send(text) {
                Ok(()) => return,
                Err(mpsc::error::SendError(text)) => {
                    warn!(charge_point_id = charge_point_id.as_str(), "Station worker gone, respawning");
                    self.workers.remove(&charge_point_id);
                    text
                }
            },
            None => text,
        };

        let worker = self.start_worker(&charge_point_id);
        let _ = worker.queue.send(text);
        self.workers.insert(charge_point_id, worker);
    }

    /// Drop the station's queue. Its worker finishes what is already queued.
    fn retire(&mut self, charge_point_id: &str) {
        self.retired.retain(|_, task| !task.is_finished());
        if let Some(worker) = self.workers.remove(charge_point_id) {
            debug!(charge_point_id, "Station worker retired");
            self.retired.insert(charge_point_id.to_string(), worker.task);
        }
    }

    fn start_worker(&mut self, charge_point_id: &str) -> Worker {
        let (queue, mut rx) = mpsc::unbounded_channel::<String>();
        let dispatcher = self.dispatcher.clone();
        let outbound = self.outbound.clone();
        let predecessor = self.retired.remove(charge_point_id);
        let cp_id = charge_point_id.to_string();

        debug!(charge_point_id, "Station worker started");
        let task = tokio::spawn(async move {
            // A reconnecting station waits for its previous worker to drain.
            if let Some(previous) = predecessor {
                let _ = previous.await;
            }

            while let Some(text) = rx.recv().await {
                let frame = match OcppFrame::parse(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(charge_point_id = cp_id.as_str(), error = %e, "Dropping malformed frame");
                        continue;
                    }
                };

                if let Some(reply) = dispatcher.handle_inbound(&cp_id, frame).await {
                    if let Err(e) = outbound.send_to(&cp_id, &reply) {
                        warn!(
                            charge_point_id = cp_id.as_str(),
                            message_id = reply.unique_id(),
                            error = %e,
                            "Reply not delivered"
                        );
                    }
                }
            }
        });

        Worker { queue, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::application::handlers::tests::{fixture, Fixture};

    fn start(f: &Fixture) -> (mpsc::UnboundedSender<InboundEvent>, ShutdownSignal, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = ShutdownSignal::new();
        let handle = StationWorkers::new(f.dispatcher.clone(), f.outbound.clone())
            .spawn(rx, shutdown.clone());
        (tx, shutdown, handle)
    }

    fn frame(cp: &str, text: String) -> InboundEvent {
        InboundEvent::Frame {
            charge_point_id: cp.into(),
            text,
        }
    }

    async fn wait_for_replies(f: &Fixture, n: usize) {
        for _ in 0..400 {
            if f.outbound.sent.lock().unwrap().len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {} replies", n);
    }

    fn reply_ids(f: &Fixture, cp: &str) -> Vec<String> {
        f.outbound
            .sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == cp)
            .map(|(_, reply)| reply.unique_id().to_string())
            .collect()
    }

    #[tokio::test]
    async fn replies_follow_arrival_order_per_station() {
        let f = fixture();
        let (tx, shutdown, handle) = start(&f);

        for i in 0..40 {
            tx.send(frame("CP1", format!(r#"[2,"a{i}","Heartbeat",{{}}]"#))).unwrap();
            tx.send(frame("CP2", format!(r#"[2,"b{i}","Heartbeat",{{}}]"#))).unwrap();
        }
        wait_for_replies(&f, 80).await;

        let expected_a: Vec<String> = (0..40).map(|i| format!("a{i}")).collect();
        let expected_b: Vec<String> = (0..40).map(|i| format!("b{i}")).collect();
        assert_eq!(reply_ids(&f, "CP1"), expected_a);
        assert_eq!(reply_ids(&f, "CP2"), expected_b);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn malformed_frame_gets_no_reply() {
        let f = fixture();
        let (tx, _shutdown, _handle) = start(&f);

        tx.send(frame("CP1", r#"[2,"1","Heartbeat"]"#.into())).unwrap();
        tx.send(frame("CP1", "not json".into())).unwrap();
        tx.send(frame("CP1", r#"[2,"2","Heartbeat",{}]"#.into())).unwrap();
        wait_for_replies(&f, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(reply_ids(&f, "CP1"), vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn station_is_served_again_after_disconnect() {
        let f = fixture();
        let (tx, _shutdown, _handle) = start(&f);

        tx.send(frame("CP1", r#"[2,"1","Heartbeat",{}]"#.into())).unwrap();
        tx.send(InboundEvent::Disconnected {
            charge_point_id: "CP1".into(),
        })
        .unwrap();
        tx.send(frame("CP1", r#"[2,"2","Heartbeat",{}]"#.into())).unwrap();
        wait_for_replies(&f, 2).await;

        assert_eq!(reply_ids(&f, "CP1"), vec!["1".to_string(), "2".to_string()]);
    }
}
