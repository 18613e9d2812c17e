// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Metronome scheduler.
//!
//! Owns at most one recurring beat timer for a local controller. The
//! timer runs only while playback is on, fires every `floor(60000 / bpm)`
//! milliseconds and moves the controller to the next chord on each beat.
//! Changing the tempo, the progression or the playing flag cancels the
//! timer and starts a new one from that moment, so the beat phase
//! restarts instead of resuming mid-beat.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::progression;
use crate::session::Bpm;
use crate::sync::{LocalSessionController, PlaybackState};

/// Milliseconds per minute
const MILLIS_PER_MINUTE: u32 = 60_000;

/// Time between beats at a tempo, truncated to whole milliseconds
pub fn beat_period(bpm: Bpm) -> Duration {
    Duration::from_millis(u64::from(MILLIS_PER_MINUTE / bpm.get()))
}

/// Move the controller one beat forward
///
/// Wraps at the end of a looping progression and holds on the last chord
/// otherwise. Playback is never stopped here. Returns the new index.
pub fn advance_once(controller: &LocalSessionController) -> Result<usize> {
    let state = controller.state();
    let next = progression::advance(
        state.chord_index,
        state.progression.len(),
        state.progression.looping,
    );
    controller.set_chord_index(next)?;
    Ok(next)
}

/// Inputs that define the running timer. Any difference restarts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerPlan {
    bpm: Bpm,
    period: Duration,
    progression_epoch: u64,
}

impl TimerPlan {
    fn for_state(state: &PlaybackState) -> Option<Self> {
        if !state.is_playing || state.progression.is_empty() {
            return None;
        }
        Some(Self {
            bpm: state.bpm,
            period: beat_period(state.bpm),
            progression_epoch: state.progression_epoch(),
        })
    }
}

/// Beat timer bound to one controller
///
/// The timer is cancelled when the scheduler is stopped or dropped.
pub struct MetronomeScheduler {
    controller: LocalSessionController,
    task: Option<JoinHandle<()>>,
}

impl MetronomeScheduler {
    /// Start following `controller`
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(controller: &LocalSessionController) -> Self {
        let task = tokio::spawn(run_metronome(controller.clone(), controller.subscribe()));
        info!("Metronome attached to {} controller", controller.role());
        Self {
            controller: controller.clone(),
            task: Some(task),
        }
    }

    /// Beat period of the timer that is running now, if any
    pub fn current_period(&self) -> Option<Duration> {
        if !self.is_attached() {
            return None;
        }
        TimerPlan::for_state(&self.controller.state()).map(|plan| plan.period)
    }

    /// Check if the scheduler is still following its controller
    pub fn is_attached(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Cancel the timer and detach from the controller
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        info!("Metronome stopped");
    }
}

impl Drop for MetronomeScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_metronome(
    controller: LocalSessionController,
    mut changes: watch::Receiver<PlaybackState>,
) {
    loop {
        let plan = TimerPlan::for_state(&changes.borrow_and_update());
        let Some(plan) = plan else {
            debug!("Metronome idle");
            if changes.changed().await.is_err() {
                return;
            }
            continue;
        };

        info!("Beat timer started at {} BPM ({:?})", plan.bpm, plan.period);
        let mut ticker = interval_at(Instant::now() + plan.period, plan.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match advance_once(&controller) {
                        Ok(index) => debug!("Beat: chord {}", index),
                        Err(e) => warn!("Beat could not advance: {}", e),
                    }
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let next = TimerPlan::for_state(&changes.borrow_and_update());
                    if next != Some(plan) {
                        debug!("Beat timer cancelled");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn controller(id: &str) -> LocalSessionController {
        let progression = Catalog::builtin().progression(id).unwrap().clone();
        LocalSessionController::solo(PlaybackState::new(Bpm::DEFAULT, progression).unwrap())
    }

    #[test]
    fn test_beat_period() {
        assert_eq!(beat_period(Bpm::new(120).unwrap()), Duration::from_millis(500));
        assert_eq!(beat_period(Bpm::new(180).unwrap()), Duration::from_millis(333));
        assert_eq!(beat_period(Bpm::new(60).unwrap()), Duration::from_millis(1000));
        assert_eq!(beat_period(Bpm::new(200).unwrap()), Duration::from_millis(300));
        assert_eq!(beat_period(Bpm::new(70).unwrap()), Duration::from_millis(857));
    }

    #[test]
    fn test_advance_once_wraps_and_holds() {
        let looping = controller("turnaround");
        looping.set_chord_index(3).unwrap();
        assert_eq!(advance_once(&looping).unwrap(), 0);

        let held = controller("ii-v-i");
        let mut progression = held.state().progression;
        progression.looping = false;
        held.set_progression(progression).unwrap();
        held.set_playing(true);
        held.set_chord_index(2).unwrap();
        assert_eq!(advance_once(&held).unwrap(), 2);
        assert!(held.is_playing());
    }

    #[test]
    fn test_timer_plan_requires_playing() {
        let controller = controller("turnaround");
        assert!(TimerPlan::for_state(&controller.state()).is_none());

        controller.set_playing(true);
        let plan = TimerPlan::for_state(&controller.state()).unwrap();
        assert_eq!(plan.period, Duration::from_millis(500));

        // Chord changes do not alter the plan
        controller.set_chord_index(2).unwrap();
        assert_eq!(TimerPlan::for_state(&controller.state()), Some(plan));

        controller.set_bpm(180).unwrap();
        assert_ne!(TimerPlan::for_state(&controller.state()), Some(plan));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_while_playing() {
        let controller = controller("turnaround");
        let scheduler = MetronomeScheduler::start(&controller);
        assert_eq!(scheduler.current_period(), None);

        controller.set_playing(true);
        tokio::time::sleep(Duration::from_millis(510)).await;
        assert_eq!(controller.chord_index(), 1);
        assert_eq!(scheduler.current_period(), Some(Duration::from_millis(500)));

        controller.set_playing(false);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(controller.chord_index(), 1);
        assert_eq!(scheduler.current_period(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_timer() {
        let controller = controller("turnaround");
        controller.set_playing(true);
        let scheduler = MetronomeScheduler::start(&controller);

        tokio::time::sleep(Duration::from_millis(510)).await;
        assert_eq!(controller.chord_index(), 1);

        scheduler.stop().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(controller.chord_index(), 1);
        assert!(controller.is_playing());
    }
}
