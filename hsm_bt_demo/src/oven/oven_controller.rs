//! Async front-end for [`OvenCtx`]: a single task owns the hsm, and callers
//! talk to it over a channel of requests plus a one-shot reply per request —
//! the same shape as the teacher's `StateEngineMessages`/channel delegate,
//! generalized from "one channel per state" to "one channel for the whole
//! machine" now that nothing but the BT `Delay` node needs to originate an
//! event on its own schedule.
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::oven::oven_events::OvenEvent;
use crate::oven::oven_states::OvenCtx;
use crate::oven::oven_timer::ActorTimer;

#[derive(Debug, Clone, Default)]
pub struct OvenSnapshot {
    pub is_on: bool,
    pub is_off: bool,
    pub preheated: bool,
    pub trace: String,
}

enum OvenCommand {
    Dispatch(OvenEvent, oneshot::Sender<()>),
    Snapshot(oneshot::Sender<OvenSnapshot>),
}

pub struct OvenController {
    tx: mpsc::UnboundedSender<OvenCommand>,
}

impl OvenController {
    /// Spawns the actor task and returns a handle to it.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(OvenCtx::new(ActorTimer::new()), rx));
        Self { tx }
    }

    pub async fn dispatch(&self, event: OvenEvent) {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(OvenCommand::Dispatch(event, reply_tx))
            .expect("oven actor task has stopped");
        reply_rx.await.expect("oven actor dropped the reply channel");
    }

    pub async fn snapshot(&self) -> OvenSnapshot {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(OvenCommand::Snapshot(reply_tx))
            .expect("oven actor task has stopped");
        reply_rx.await.expect("oven actor dropped the reply channel")
    }
}

async fn run(mut ctx: OvenCtx, mut rx: mpsc::UnboundedReceiver<OvenCommand>) {
    loop {
        let deadline = ctx.next_timer_deadline();
        let sleep = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            cmd = rx.recv() => {
                match cmd {
                    Some(OvenCommand::Dispatch(event, reply)) => {
                        ctx.dispatch_user(event);
                        let _ = reply.send(());
                    }
                    Some(OvenCommand::Snapshot(reply)) => {
                        let snapshot = OvenSnapshot {
                            is_on: ctx.is_on(),
                            is_off: ctx.is_off(),
                            preheated: ctx.preheated,
                            trace: ctx.take_trace(),
                        };
                        let _ = reply.send(snapshot);
                    }
                    None => return,
                }
            }
            _ = sleep => {
                ctx.fire_due_timers(Instant::now());
            }
        }
    }
}
