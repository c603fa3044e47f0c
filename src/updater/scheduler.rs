use super::Updater;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    RefreshNow,
    Reschedule(Duration),
    Stop,
}

/// Fixed-delay polling: the next cycle is armed once the previous one
/// returns, so slow servers drift instead of stacking cycles.
#[derive(Debug)]
pub struct Scheduler {
    commands: mpsc::Sender<Command>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn spawn(updater: Arc<Updater>) -> Self {
        let (commands, receiver) = mpsc::channel(8);
        let interval = updater.scan_interval();
        let handle = tokio::spawn(run(updater, interval, receiver));

        Self { commands, handle }
    }

    pub async fn refresh_now(&self) {
        self.send(Command::RefreshNow).await;
    }

    pub async fn reschedule(&self, interval: Duration) {
        self.send(Command::Reschedule(interval)).await;
    }

    /// Cancels the pending tick, stops the updater and waits for the task.
    pub async fn stop(self) {
        self.send(Command::Stop).await;
        if let Err(err) = self.handle.await {
            tracing::error!("Scheduler task failed: {}", err);
        }
    }

    async fn send(&self, command: Command) {
        if self.commands.send(command).await.is_err() {
            tracing::debug!("Scheduler already stopped, dropping {:?}", command);
        }
    }
}

async fn run(updater: Arc<Updater>, mut interval: Duration, mut commands: mpsc::Receiver<Command>) {
    tracing::debug!("Polling {} every {:?}", updater.address(), interval);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                updater.refresh().await;
            }
            command = commands.recv() => match command {
                Some(Command::RefreshNow) => {
                    updater.refresh().await;
                }
                Some(Command::Reschedule(next)) => {
                    tracing::debug!("Rescheduling {} to every {:?}", updater.address(), next);
                    interval = next;
                }
                Some(Command::Stop) | None => break,
            }
        }
    }

    updater.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LedFxClient, Method};
    use crate::testing::{script_v1, ScriptedTransport};

    fn updater(transport: &Arc<ScriptedTransport>) -> Arc<Updater> {
        let client = LedFxClient::new(transport.clone(), "127.0.0.1", 8888, None, Duration::from_secs(10)).unwrap();
        Arc::new(Updater::new(client, Duration::from_secs(7), false))
    }

    fn config_calls(transport: &ScriptedTransport) -> usize {
        transport.requests_to(Method::GET, "config").len()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_interval() {
        let transport = Arc::new(ScriptedTransport::new());
        script_v1(&transport);
        let updater = updater(&transport);
        let scheduler = Scheduler::spawn(updater.clone());

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(config_calls(&transport), 2);

        scheduler.stop().await;
        assert!(updater.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_now() {
        let transport = Arc::new(ScriptedTransport::new());
        script_v1(&transport);
        let updater = updater(&transport);
        let scheduler = Scheduler::spawn(updater.clone());

        scheduler.refresh_now().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(config_calls(&transport), 1);
        assert!(updater.data().available());

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule() {
        let transport = Arc::new(ScriptedTransport::new());
        script_v1(&transport);
        let updater = updater(&transport);
        let scheduler = Scheduler::spawn(updater.clone());

        scheduler.reschedule(Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(config_calls(&transport), 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(config_calls(&transport), 1);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_tick() {
        let transport = Arc::new(ScriptedTransport::new());
        script_v1(&transport);
        let updater = updater(&transport);
        let scheduler = Scheduler::spawn(updater.clone());

        scheduler.stop().await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(config_calls(&transport), 0);
        assert_eq!(updater.refresh().await, crate::updater::CycleOutcome::Skipped);
    }
}
