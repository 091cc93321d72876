//! Authoritative tick loop around a `DuelMatch`

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DuelSettings;
use crate::util::time::tick_delta;
use crate::ws::protocol::{ClientMsg, DuelSnapshot, GameEvent, ServerMsg};

use super::ability::Sign;
use super::cues::CueDispatcher;
use super::player::PlayerId;
use super::r#match::{DuelMatch, GameState};
use super::snapshot::SnapshotBuilder;
use super::{parse_ability, parse_player, CommandError, DuelInput};

/// Latest classifier output reported for one player
#[derive(Debug, Clone)]
struct SignSample {
    sign: Option<Sign>,
    received_at: Instant,
}

/// Handle to the running duel, cloned into every route and socket
#[derive(Clone)]
pub struct DuelHandle {
    pub input_tx: mpsc::Sender<DuelInput>,
    pub events_tx: broadcast::Sender<ServerMsg>,
    latest: Arc<RwLock<Arc<DuelSnapshot>>>,
}

impl DuelHandle {
    /// Snapshot published after the most recent tick
    pub fn snapshot(&self) -> Arc<DuelSnapshot> {
        self.latest.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.events_tx.subscribe()
    }

    /// Queue a message for the next tick
    pub async fn send(&self, connection_id: Uuid, msg: ClientMsg) -> Result<(), CommandError> {
        self.input_tx
            .send(DuelInput::new(connection_id, msg))
            .await
            .map_err(|_| CommandError::LoopStopped)
    }
}

/// Owns the duel and drives it at a fixed tick rate
pub struct DuelRunner {
    duel: DuelMatch,
    input_rx: mpsc::Receiver<DuelInput>,
    events_tx: broadcast::Sender<ServerMsg>,
    latest: Arc<RwLock<Arc<DuelSnapshot>>>,
    snapshot_builder: SnapshotBuilder,
    cues: CueDispatcher,
    samples: [Option<SignSample>; 2],
    tick_rate: u32,
    sign_stale_after: Duration,
}

impl DuelRunner {
    pub fn new(settings: &DuelSettings) -> (Self, DuelHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (events_tx, _) = broadcast::channel(64);

        let duel = DuelMatch::new(settings);
        let latest = Arc::new(RwLock::new(Arc::new(SnapshotBuilder::build(&duel))));

        let handle = DuelHandle {
            input_tx,
            events_tx: events_tx.clone(),
            latest: latest.clone(),
        };

        let runner = Self {
            duel,
            input_rx,
            events_tx,
            latest,
            snapshot_builder: SnapshotBuilder::for_rates(settings.tick_rate, settings.snapshot_rate),
            cues: CueDispatcher::new(),
            samples: [None, None],
            tick_rate: settings.tick_rate,
            sign_stale_after: settings.sign_stale_after,
        };

        (runner, handle)
    }

    pub fn duel(&self) -> &DuelMatch {
        &self.duel
    }

    /// Run until every handle has been dropped
    pub async fn run(mut self) {
        info!(tick_rate = self.tick_rate, "Duel loop started");

        let tick_duration = Duration::from_micros(1_000_000 / self.tick_rate.max(1) as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            if !self.process_inputs() {
                break;
            }

            self.run_tick(Instant::now());
        }

        info!(tick = self.duel.tick(), "Duel loop stopped");
    }

    /// Drain queued messages. Returns false once all senders are gone.
    pub fn process_inputs(&mut self) -> bool {
        loop {
            match self.input_rx.try_recv() {
                Ok(input) => self.handle_input(input),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn handle_input(&mut self, input: DuelInput) {
        let DuelInput {
            connection_id,
            msg,
            received_at,
        } = input;

        let result = match msg {
            ClientMsg::Sign { player, sign } => parse_player(player).map(|id| {
                let sign = sign
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .map(Sign::new);
                self.samples[id.index()] = Some(SignSample { sign, received_at });
            }),
            ClientMsg::Start => {
                self.start_if(GameState::Start);
                Ok(())
            }
            ClientMsg::Restart => {
                self.start_if(GameState::GameOver);
                Ok(())
            }
            ClientMsg::Abort => {
                self.duel.reset_to_start();
                Ok(())
            }
            ClientMsg::Cast { player, ability } => parse_player(player).and_then(|id| {
                let ability = parse_ability(&ability)?;
                self.duel.manual_cast(id, ability);
                Ok(())
            }),
            ClientMsg::Ping { t } => {
                let _ = self.events_tx.send(ServerMsg::Pong { t });
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(connection_id = %connection_id, error = %e, "Ignoring command");
        }
    }

    fn start_if(&mut self, required: GameState) {
        if self.duel.state() != required {
            debug!(state = ?self.duel.state(), "Start ignored in current state");
            return;
        }
        self.samples = [None, None];
        self.duel.start_game();
    }

    /// Sign a player is showing at `now`; stale reports count as no sign
    fn current_sign(&self, id: PlayerId, now: Instant) -> Option<Sign> {
        self.samples[id.index()]
            .as_ref()
            .filter(|s| now.saturating_duration_since(s.received_at) <= self.sign_stale_after)
            .and_then(|s| s.sign.clone())
    }

    /// Feed gestures, advance one tick and publish the results
    pub fn run_tick(&mut self, now: Instant) {
        for id in PlayerId::ALL {
            let sign = self.current_sign(id, now);
            self.duel.process_gesture(id, sign);
        }

        self.duel.update(tick_delta(self.tick_rate));

        let events = self.duel.take_events();
        if !events.is_empty() {
            self.publish_events(events);
        }

        let snapshot = Arc::new(SnapshotBuilder::build(&self.duel));
        *self.latest.write() = snapshot.clone();

        if self.snapshot_builder.should_send() {
            let _ = self.events_tx.send(ServerMsg::Snapshot((*snapshot).clone()));
        }
    }

    fn publish_events(&mut self, events: Vec<GameEvent>) {
        if events
            .iter()
            .any(|e| matches!(e, GameEvent::StateChanged { .. }))
        {
            self.snapshot_builder.force_next();
        }

        let cues = self.cues.dispatch_all(&events);

        // No subscribers is fine; the snapshot lock still has the state
        let _ = self.events_tx.send(ServerMsg::Events {
            tick: self.duel.tick(),
            events,
        });
        for cue in cues {
            let _ = self.events_tx.send(ServerMsg::Cue { cue });
        }
    }
}
