use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, info, instrument, warn};

use crate::room::repository::RoomRegistry;
use crate::websockets::connection_manager::ConnectionManager;
use crate::websockets::messages::ServerEvent;

/// Timer state for one room.
///
/// Invariants: `running` implies `started_at` is set; a timer that reaches
/// zero is removed from the map entirely (Idle), which also clears its
/// accumulated paused time.
struct RoomTimer {
    total_seconds: u64,
    running: bool,
    /// Anchor instant, already shifted back by previously paused elapsed time.
    started_at: Option<Instant>,
    started_at_epoch_ms: Option<i64>,
    paused_elapsed: Duration,
    tick_task: Option<JoinHandle<()>>,
}

impl Default for RoomTimer {
    fn default() -> Self {
        Self {
            total_seconds: 0,
            running: false,
            started_at: None,
            started_at_epoch_ms: None,
            paused_elapsed: Duration::ZERO,
            tick_task: None,
        }
    }
}

type TimerMap = Arc<RwLock<HashMap<String, RoomTimer>>>;

/// Countdown timers, one per room.
///
/// Each running timer owns a 1 Hz tick task that broadcasts the remaining
/// whole seconds to the room's current members and cancels itself on zero.
/// Duplicate starts and redundant stops are absorbed silently.
pub struct CountdownEngine {
    timers: TimerMap,
    registry: Arc<dyn RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
}

impl CountdownEngine {
    pub fn new(registry: Arc<dyn RoomRegistry>, connections: Arc<dyn ConnectionManager>) -> Self {
        Self {
            timers: Arc::new(RwLock::new(HashMap::new())),
            registry,
            connections,
        }
    }

    /// Starts (or resumes) the room's countdown. No-op while already running,
    /// so overlapping starts can never leak a second tick loop.
    #[instrument(skip(self))]
    pub async fn start(&self, room_id: &str, seconds: u64) {
        let mut timers = self.timers.write().await;
        let timer = timers.entry(room_id.to_string()).or_default();

        if timer.running {
            debug!(room_id = %room_id, "Countdown already running, start absorbed");
            return;
        }

        // Shift the anchor back by whatever already elapsed before a pause,
        // so the restarted timer resumes rather than starting over.
        let anchor = Instant::now()
            .checked_sub(timer.paused_elapsed)
            .unwrap_or_else(Instant::now);

        timer.total_seconds = seconds;
        timer.running = true;
        timer.started_at = Some(anchor);
        timer.started_at_epoch_ms =
            Some(Utc::now().timestamp_millis() - timer.paused_elapsed.as_millis() as i64);

        timer.tick_task = Some(tokio::spawn(run_tick_loop(
            room_id.to_string(),
            seconds,
            anchor,
            Arc::clone(&self.timers),
            Arc::clone(&self.registry),
            Arc::clone(&self.connections),
        )));

        info!(
            room_id = %room_id,
            seconds = seconds,
            started_at_epoch_ms = timer.started_at_epoch_ms.unwrap_or_default(),
            resumed_elapsed_ms = timer.paused_elapsed.as_millis() as u64,
            "Countdown started"
        );
    }

    /// Pauses the room's countdown, freezing its elapsed time. No-op when the
    /// timer is idle.
    #[instrument(skip(self))]
    pub async fn stop(&self, room_id: &str) {
        let mut timers = self.timers.write().await;
        let Some(timer) = timers.get_mut(room_id) else {
            debug!(room_id = %room_id, "Stop for idle countdown absorbed");
            return;
        };
        if !timer.running {
            debug!(room_id = %room_id, "Stop for paused countdown absorbed");
            return;
        }

        if let Some(task) = timer.tick_task.take() {
            task.abort();
        }
        if let Some(anchor) = timer.started_at.take() {
            timer.paused_elapsed = anchor.elapsed();
        }
        timer.started_at_epoch_ms = None;
        timer.running = false;

        info!(
            room_id = %room_id,
            paused_elapsed_ms = timer.paused_elapsed.as_millis() as u64,
            "Countdown paused"
        );
    }

    /// Remaining whole seconds, computed analytically from the anchor so a
    /// late subscriber gets a current value between ticks.
    pub async fn snapshot_remaining(&self, room_id: &str) -> u64 {
        let timers = self.timers.read().await;
        match timers.get(room_id) {
            None => 0,
            Some(timer) => {
                let elapsed = match timer.started_at {
                    Some(anchor) => anchor.elapsed(),
                    None => timer.paused_elapsed,
                };
                timer.total_seconds.saturating_sub(elapsed.as_secs())
            }
        }
    }

    /// Drops the room's timer entirely: on member disconnect and on room
    /// teardown.
    #[instrument(skip(self))]
    pub async fn reset(&self, room_id: &str) {
        let mut timers = self.timers.write().await;
        if let Some(timer) = timers.remove(room_id) {
            if let Some(task) = timer.tick_task {
                task.abort();
            }
            info!(room_id = %room_id, "Countdown reset to idle");
        }
    }
}

async fn run_tick_loop(
    room_id: String,
    total_seconds: u64,
    anchor: Instant,
    timers: TimerMap,
    registry: Arc<dyn RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
) {
    let mut ticker = interval(Duration::from_secs(1));
    // A tokio interval fires immediately; the wire cadence wants the first
    // emission a full second after start.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let remaining = total_seconds.saturating_sub(anchor.elapsed().as_secs());
        broadcast_remaining(&registry, &connections, &room_id, remaining).await;

        if remaining == 0 {
            timers.write().await.remove(&room_id);
            debug!(room_id = %room_id, "Countdown expired");
            break;
        }
    }
}

async fn broadcast_remaining(
    registry: &Arc<dyn RoomRegistry>,
    connections: &Arc<dyn ConnectionManager>,
    room_id: &str,
    remaining: u64,
) {
    let members = match registry.get_room(room_id).await {
        Ok(Some(room)) => room.member_ids(),
        // Room vanished mid-countdown; the teardown path resets the timer.
        Ok(None) => return,
        Err(e) => {
            warn!(room_id = %room_id, error = %e, "Skipping countdown tick");
            return;
        }
    };

    match serde_json::to_string(&ServerEvent::Countdown(remaining)) {
        Ok(message) => connections.send_to_connections(&members, &message).await,
        Err(e) => warn!(room_id = %room_id, error = %e, "Failed to encode countdown tick"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::models::Participant;
    use crate::room::repository::InMemoryRoomRegistry;
    use crate::shared::test_utils::RecordingConnectionManager;

    async fn setup() -> (CountdownEngine, Arc<RecordingConnectionManager>, String) {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let connections = Arc::new(RecordingConnectionManager::new());

        let room = registry
            .create_room(Participant::drawer(
                "conn-alice".to_string(),
                "alice".to_string(),
            ))
            .await
            .unwrap();
        registry
            .join_room(
                &room.id,
                Participant::guesser("conn-bob".to_string(), "bob".to_string()),
            )
            .await
            .unwrap();

        let engine = CountdownEngine::new(registry, connections.clone());
        (engine, connections, room.id)
    }

    fn countdown_values(messages: &[String]) -> Vec<u64> {
        messages
            .iter()
            .filter_map(|m| serde_json::from_str::<ServerEvent>(m).ok())
            .filter_map(|e| match e {
                ServerEvent::Countdown(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_to_zero_then_idles() {
        let (engine, connections, room_id) = setup().await;

        engine.start(&room_id, 3).await;
        tokio::time::sleep(Duration::from_millis(3200)).await;

        for conn in ["conn-alice", "conn-bob"] {
            let values = countdown_values(&connections.messages_for(conn).await);
            assert_eq!(values, vec![2, 1, 0]);
        }
        assert_eq!(engine.snapshot_remaining(&room_id).await, 0);

        // Back to idle: a fresh start begins from the new duration.
        engine.start(&room_id, 5).await;
        assert_eq!(engine.snapshot_remaining(&room_id).await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_are_non_increasing() {
        let (engine, connections, room_id) = setup().await;

        engine.start(&room_id, 5).await;
        tokio::time::sleep(Duration::from_millis(5200)).await;

        let values = countdown_values(&connections.messages_for("conn-alice").await);
        assert_eq!(*values.last().unwrap(), 0);
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_elapsed_and_start_resumes() {
        let (engine, connections, room_id) = setup().await;

        engine.start(&room_id, 10).await;
        tokio::time::sleep(Duration::from_millis(2200)).await;
        engine.stop(&room_id).await;

        assert_eq!(engine.snapshot_remaining(&room_id).await, 8);

        // Paused time does not advance.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.snapshot_remaining(&room_id).await, 8);
        let ticks_while_paused = countdown_values(&connections.messages_for("conn-alice").await);
        assert_eq!(ticks_while_paused, vec![9, 8]);

        // Resuming continues from the accumulated elapsed time.
        engine.start(&room_id, 10).await;
        assert_eq!(engine.snapshot_remaining(&room_id).await, 8);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let values = countdown_values(&connections.messages_for("conn-alice").await);
        assert_eq!(*values.last().unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_is_absorbed() {
        let (engine, connections, room_id) = setup().await;

        engine.start(&room_id, 5).await;
        engine.start(&room_id, 99).await;

        assert_eq!(engine.snapshot_remaining(&room_id).await, 5);
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let values = countdown_values(&connections.messages_for("conn-alice").await);
        assert_eq!(values, vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_is_current_between_ticks() {
        let (engine, _connections, room_id) = setup().await;

        engine.start(&room_id, 3).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let remaining = engine.snapshot_remaining(&room_id).await;
        assert_eq!(remaining, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redundant_stop_is_absorbed() {
        let (engine, _connections, room_id) = setup().await;

        // Stop with no timer at all.
        engine.stop(&room_id).await;
        assert_eq!(engine.snapshot_remaining(&room_id).await, 0);

        // Stop twice after a start.
        engine.start(&room_id, 10).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        engine.stop(&room_id).await;
        engine.stop(&room_id).await;
        assert_eq!(engine.snapshot_remaining(&room_id).await, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_tick_loop() {
        let (engine, connections, room_id) = setup().await;

        engine.start(&room_id, 30).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        engine.reset(&room_id).await;

        assert_eq!(engine.snapshot_remaining(&room_id).await, 0);

        let before = countdown_values(&connections.messages_for("conn-alice").await).len();
        tokio::time::sleep(Duration::from_secs(3)).await;
        let after = countdown_values(&connections.messages_for("conn-alice").await).len();
        assert_eq!(before, after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_for_unknown_room_is_zero() {
        let (engine, _connections, _room_id) = setup().await;
        assert_eq!(engine.snapshot_remaining("nope").await, 0);
    }
}
