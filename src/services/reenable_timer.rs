//! Server-owned timer that lifts the buzzer pause once the recorded deadline passes.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info};

use crate::{
    services::{dispatcher::TimerUpdate, policy, sse_events},
    state::{AppState, SharedState, game::GameStatus},
};

/// Apply the timer effect of a committed action.
///
/// Called with the game lock held, so the timer slot changes in the same order as the state.
pub async fn apply(state: &SharedState, update: TimerUpdate) {
    match update {
        TimerUpdate::Keep => {}
        TimerUpdate::Cancel => cancel(state).await,
        TimerUpdate::Schedule(deadline) => schedule(state, deadline).await,
    }
}

async fn schedule(state: &SharedState, deadline: i64) {
    let wait_ms = deadline.saturating_sub(policy::now_millis()).max(0) as u64;
    let task_state = Arc::clone(state);
    let handle = tokio::spawn(async move {
        sleep(Duration::from_millis(wait_ms)).await;
        expire(&task_state, deadline).await;
    });

    if let Some(previous) = state.reenable_timer().lock().await.replace(handle) {
        previous.abort();
    }
    debug!(deadline, wait_ms, "buzzer re-enable scheduled");
}

async fn cancel(state: &SharedState) {
    if let Some(previous) = state.reenable_timer().lock().await.take() {
        previous.abort();
        debug!("buzzer re-enable cancelled");
    }
}

/// Clear the pause if `deadline` is still the pending one and the game is live.
///
/// Returns whether the state changed.
pub async fn expire(state: &AppState, deadline: i64) -> bool {
    let mut game = state.game().lock().await;
    if game.status != GameStatus::Active
        || !game.buzzers_paused
        || game.buzzers_reenable_at != Some(deadline)
    {
        debug!(deadline, "stale buzzer re-enable ignored");
        return false;
    }

    game.buzzers_paused = false;
    game.buzzers_reenable_at = None;
    sse_events::broadcast_game_update(state, &game);
    info!("buzzers re-enabled");
    true
}
