//! Session owner
//!
//! `Game` is the one authority over the simulation. It takes discrete
//! commands and timer ticks, and keeps exactly one periodic loop registered
//! for the current phase. Game over runs no loop at all.

use crate::consts::TICK_MS;
use crate::ledger::AccountAddress;
use crate::platform::{InputSource, LoopKind, ManualScheduler, Scheduler, TimerHandle};
use crate::reward::{RewardAccumulator, RewardError, RewardPolicy, RewardReceipt, RewardRequest};
use crate::sim::{CommandError, GameEvent, GamePhase, GameState, Snapshot, TickInput, Viewport, tick};

/// Discrete inputs to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Space/ArrowUp, click or tap: start in the menu, jump while playing
    Flap(InputSource),
    /// Start button
    Start,
    /// "Play again" on the game-over screen
    PlayAgain,
    /// "Back to menu" on the game-over screen
    BackToMenu,
    ConnectWallet(AccountAddress),
    DisconnectWallet,
    /// Ask for the end-of-session reward
    ClaimReward,
    /// Outcome of a submitted claim
    RewardSettled(Result<RewardReceipt, RewardError>),
}

#[derive(Debug, Clone, Copy)]
struct ActiveLoop {
    kind: LoopKind,
    handle: TimerHandle,
}

/// Which loop a phase runs
fn loop_for(phase: GamePhase) -> Option<LoopKind> {
    match phase {
        GamePhase::Menu => Some(LoopKind::Menu),
        GamePhase::Playing => Some(LoopKind::Gameplay),
        GamePhase::GameOver => None,
    }
}

pub struct Game<S: Scheduler> {
    state: GameState,
    scheduler: S,
    active: Option<ActiveLoop>,
}

impl<S: Scheduler> Game<S> {
    /// New game in the menu with its loop registered
    pub fn new(seed: u64, scheduler: S, input: &TickInput) -> Self {
        let mut game = Self {
            state: GameState::new(seed, input.viewport, input.now_ms),
            scheduler,
            active: None,
        };
        game.sync_loop();
        game
    }

    pub fn with_reward_policy(mut self, policy: RewardPolicy) -> Self {
        self.state.reward_policy = policy;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Loop currently registered with the scheduler
    pub fn active_loop(&self) -> Option<LoopKind> {
        self.active.map(|a| a.kind)
    }

    pub fn snapshot(&self, viewport: Viewport) -> Snapshot {
        self.state.snapshot(viewport)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Apply one command. Rejected commands leave the state untouched.
    pub fn handle(&mut self, command: Command, input: &TickInput) -> Result<(), CommandError> {
        let viewport = input.viewport;
        let result = match command {
            Command::Flap(source) => match (self.state.phase, source) {
                (GamePhase::Menu, _) | (GamePhase::GameOver, InputSource::Keyboard) => {
                    self.state.start_session(viewport)
                }
                (GamePhase::Playing, _) => self.state.jump(viewport),
                // Pointer and touch on the game-over screen belong to its buttons
                (GamePhase::GameOver, _) => Ok(()),
            },
            Command::Start | Command::PlayAgain => self.state.start_session(viewport),
            Command::BackToMenu => self.state.back_to_menu(viewport, input.now_ms),
            Command::ConnectWallet(account) => {
                self.state.connect_wallet(account);
                Ok(())
            }
            Command::DisconnectWallet => {
                self.state.disconnect_wallet();
                Ok(())
            }
            Command::ClaimReward => self.state.begin_claim().map(|_| ()),
            Command::RewardSettled(outcome) => {
                self.state.settle_claim(outcome, viewport, input.now_ms)
            }
        };
        self.sync_loop();
        result
    }

    /// A periodic timer fired
    pub fn on_timer(&mut self, kind: LoopKind, input: &TickInput) {
        if self.active_loop() != Some(kind) {
            log::warn!(
                "Ignoring stale {:?} tick (active: {:?})",
                kind,
                self.active_loop()
            );
            return;
        }
        tick(&mut self.state, input);
        self.sync_loop();
    }

    /// Make the registered loop match the phase: cancel the old one first,
    /// then register the new one.
    fn sync_loop(&mut self) {
        let wanted = loop_for(self.state.phase);
        if self.active_loop() == wanted {
            return;
        }
        if let Some(old) = self.active.take() {
            self.scheduler.cancel(old.handle);
            log::debug!("Cancelled {:?} loop", old.kind);
        }
        if let Some(kind) = wanted {
            let handle = self.scheduler.start_interval(kind, TICK_MS);
            self.active = Some(ActiveLoop { kind, handle });
            log::debug!("Started {:?} loop", kind);
        }
    }
}

impl Game<ManualScheduler> {
    /// Fire the live timer once. Returns false when no loop is registered.
    pub fn pump(&mut self, input: &TickInput) -> bool {
        match self.scheduler.due() {
            Some(kind) => {
                self.on_timer(kind, input);
                true
            }
            None => false,
        }
    }
}

/// Submit a claim and turn its outcome into the command that settles it
pub async fn submit_claim<A: RewardAccumulator>(accumulator: &A, request: RewardRequest) -> Command {
    let outcome = accumulator.submit(&request).await;
    if let Err(err) = &outcome {
        log::warn!("Reward submission for score {} failed: {}", request.score, err);
    }
    Command::RewardSettled(outcome)
}
