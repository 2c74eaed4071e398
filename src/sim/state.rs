//! Game state and the session state machine
//!
//! `GameState` is the single owner of everything a run mutates. Transitions
//! between menu, playing and game-over happen only through the methods here;
//! the tick loop and the command intake both go through them.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::Rect;
use super::dimensions::{Dimensions, Viewport};
use super::obstacle::{Obstacle, ObstacleStream, StreamKind};
use crate::consts::*;
use crate::ledger::AccountAddress;
use crate::reward::{RewardError, RewardPolicy, RewardReceipt, RewardRequest};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen with decorative obstacles scrolling behind it
    Menu,
    /// Active session
    Playing,
    /// Session ended, loop frozen
    GameOver,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    /// Actor left the field through the top or hit the ground
    OutOfBounds,
    /// Actor overlapped a barrier
    Collision,
}

/// The player-controlled entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Top-left of the bounding box; x is fixed for the whole session
    pub pos: Vec2,
    /// Vertical speed, positive = falling
    pub velocity: f32,
}

impl Actor {
    /// Actor at rest, horizontally at 1/8 of the viewport and vertically centered
    pub fn spawn(viewport: Viewport, dims: &Dimensions) -> Self {
        Self {
            pos: Vec2::new(viewport.width * ACTOR_X_RATIO, dims.field_height / 2.0),
            velocity: 0.0,
        }
    }

    pub fn rect(&self, size: f32) -> Rect {
        Rect::square(self.pos, size)
    }
}

/// Progress of the end-of-session reward claim
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Unclaimed,
    Pending,
    Claimed { digest: String },
    Failed { reason: String },
}

/// Things that happened, for audio and presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    Jumped,
    Scored { score: u32 },
    /// A pass that counts toward the reward (wallet connected)
    RewardEligiblePass { tokens_earned: u32 },
    Crashed {
        cause: CrashCause,
        score: u32,
        new_high_score: bool,
    },
    /// The controller should submit this claim
    RewardRequested(RewardRequest),
    RewardClaimed(RewardReceipt),
    RewardFailed { reason: String },
    WalletChanged { account: Option<AccountAddress> },
}

/// Commands the state machine refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("cannot {action} while in {phase:?}")]
    InvalidPhase {
        action: &'static str,
        phase: GamePhase,
    },
    #[error("the reward for a score of {score} has not been claimed")]
    RewardUnclaimed { score: u32 },
    #[error("nothing to claim for a zero score")]
    NothingToClaim,
    #[error("a reward claim is already in flight")]
    ClaimInFlight,
    #[error("the reward for this session was already claimed")]
    AlreadyClaimed,
    #[error("no reward claim is pending")]
    NoClaimPending,
    #[error(transparent)]
    Reward(#[from] RewardError),
}

/// One play-through
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: Actor,
    pub obstacles: ObstacleStream,
    /// Obstacles passed
    pub score: u32,
    /// Passes made with a wallet connected
    pub tokens_earned: u32,
    /// Ticks simulated
    pub ticks: u64,
}

impl Session {
    fn new(viewport: Viewport, seed: u64) -> Self {
        Self {
            actor: Actor::spawn(viewport, &Dimensions::resolve(viewport)),
            obstacles: ObstacleStream::new(StreamKind::Gameplay, seed),
            score: 0,
            tokens_earned: 0,
            ticks: 0,
        }
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub dimensions: Dimensions,
    /// Absent in the menu, which has no actor
    pub actor: Option<Actor>,
    /// Decorative stream in the menu, gameplay stream otherwise
    pub obstacles: Vec<Obstacle>,
    pub score: u32,
    pub high_score: u32,
    pub tokens_earned: u32,
    pub claim: ClaimStatus,
    pub account: Option<AccountAddress>,
    pub can_claim: bool,
    pub can_return_to_menu: bool,
}

/// Complete game state (deterministic given seed, inputs and clock)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    pub session: Session,
    pub menu_stream: ObstacleStream,
    /// Best score this runtime, never persisted
    pub high_score: u32,
    pub account: Option<AccountAddress>,
    pub claim: ClaimStatus,
    pub reward_policy: RewardPolicy,
    sessions_started: u32,
    menus_entered: u32,
    events: Vec<GameEvent>,
}

impl GameState {
    /// New game sitting in the menu
    pub fn new(seed: u64, viewport: Viewport, now_ms: f64) -> Self {
        let mut state = Self {
            seed,
            phase: GamePhase::Menu,
            session: Session::new(viewport, seed),
            menu_stream: ObstacleStream::new(StreamKind::Decorative, seed),
            high_score: 0,
            account: None,
            claim: ClaimStatus::Unclaimed,
            reward_policy: RewardPolicy::default(),
            sessions_started: 0,
            menus_entered: 0,
            events: Vec::new(),
        };
        state.populate_menu(viewport, now_ms);
        state
    }

    /// Per-run stream seed so every session gets a fresh layout
    fn stream_seed(&self, index: u32, salt: u64) -> u64 {
        (index as u64)
            .wrapping_mul(2654435761)
            .wrapping_add(self.seed)
            ^ salt
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        log::info!("Phase {:?} -> {:?}", from, to);
        self.push_event(GameEvent::PhaseChanged { from, to });
    }

    fn populate_menu(&mut self, viewport: Viewport, now_ms: f64) {
        let seed = self.stream_seed(self.menus_entered, 0x5eed_0f_3e27);
        self.menus_entered += 1;
        self.menu_stream.reset(seed);
        self.menu_stream.seed_decorative(viewport, now_ms);
    }

    /// Menu or game-over → playing with a fresh session
    pub fn start_session(&mut self, viewport: Viewport) -> Result<(), CommandError> {
        if self.phase == GamePhase::Playing {
            return Err(CommandError::InvalidPhase {
                action: "start a session",
                phase: self.phase,
            });
        }
        if self.claim == ClaimStatus::Pending {
            return Err(CommandError::ClaimInFlight);
        }

        let seed = self.stream_seed(self.sessions_started, 0);
        self.sessions_started += 1;
        self.session = Session::new(viewport, seed);
        self.claim = ClaimStatus::Unclaimed;
        self.menu_stream.reset(seed);
        self.set_phase(GamePhase::Playing);
        log::debug!("Session {} started with stream seed {}", self.sessions_started, seed);
        Ok(())
    }

    /// Replace the actor's velocity with the upward impulse
    pub fn jump(&mut self, viewport: Viewport) -> Result<(), CommandError> {
        if self.phase != GamePhase::Playing {
            return Err(CommandError::InvalidPhase {
                action: "jump",
                phase: self.phase,
            });
        }
        self.session.actor.velocity = Dimensions::resolve(viewport).jump_impulse;
        self.push_event(GameEvent::Jumped);
        Ok(())
    }

    /// Playing → game-over
    pub(crate) fn end_session(&mut self, cause: CrashCause) {
        let score = self.session.score;
        let new_high_score = score > self.high_score;
        if new_high_score {
            self.high_score = score;
        }
        log::info!(
            "Session over ({:?}) score={} high={} ticks={}",
            cause,
            score,
            self.high_score,
            self.session.ticks
        );
        self.set_phase(GamePhase::GameOver);
        self.push_event(GameEvent::Crashed {
            cause,
            score,
            new_high_score,
        });
    }

    /// Whether the menu can be reached without forfeiting a reward
    pub fn can_return_to_menu(&self) -> bool {
        self.phase == GamePhase::GameOver
            && (self.session.score == 0 || matches!(self.claim, ClaimStatus::Claimed { .. }))
    }

    /// Game-over → menu, only once nothing is left to claim
    pub fn back_to_menu(&mut self, viewport: Viewport, now_ms: f64) -> Result<(), CommandError> {
        if self.phase != GamePhase::GameOver {
            return Err(CommandError::InvalidPhase {
                action: "return to the menu",
                phase: self.phase,
            });
        }
        if !self.can_return_to_menu() {
            return Err(CommandError::RewardUnclaimed {
                score: self.session.score,
            });
        }
        self.enter_menu(viewport, now_ms);
        Ok(())
    }

    fn enter_menu(&mut self, viewport: Viewport, now_ms: f64) {
        self.populate_menu(viewport, now_ms);
        self.set_phase(GamePhase::Menu);
    }

    pub fn connect_wallet(&mut self, account: AccountAddress) {
        if self.account.as_ref() == Some(&account) {
            return;
        }
        log::info!("Wallet connected: {}", account.short());
        self.account = Some(account.clone());
        self.push_event(GameEvent::WalletChanged {
            account: Some(account),
        });
    }

    pub fn disconnect_wallet(&mut self) {
        if self.account.take().is_some() {
            log::info!("Wallet disconnected");
            self.push_event(GameEvent::WalletChanged { account: None });
        }
    }

    pub fn can_claim(&self) -> bool {
        self.phase == GamePhase::GameOver
            && self.session.score > 0
            && self.account.is_some()
            && matches!(self.claim, ClaimStatus::Unclaimed | ClaimStatus::Failed { .. })
    }

    /// Build the reward claim for the finished session and mark it pending
    pub fn begin_claim(&mut self) -> Result<RewardRequest, CommandError> {
        if self.phase != GamePhase::GameOver {
            return Err(CommandError::InvalidPhase {
                action: "claim a reward",
                phase: self.phase,
            });
        }
        match self.claim {
            ClaimStatus::Pending => return Err(CommandError::ClaimInFlight),
            ClaimStatus::Claimed { .. } => return Err(CommandError::AlreadyClaimed),
            ClaimStatus::Unclaimed | ClaimStatus::Failed { .. } => {}
        }
        if self.session.score == 0 {
            return Err(CommandError::NothingToClaim);
        }
        let recipient = self.account.clone().ok_or(RewardError::WalletDisconnected)?;
        let request = RewardRequest::new(recipient, self.session.score, &self.reward_policy)?;

        log::info!(
            "Claiming {} tokens for score {}",
            request.amount,
            request.score
        );
        self.claim = ClaimStatus::Pending;
        self.push_event(GameEvent::RewardRequested(request.clone()));
        Ok(request)
    }

    /// Record the ledger's answer. Success returns to the menu; failure stays
    /// in game-over with the claim re-offerable.
    pub fn settle_claim(
        &mut self,
        outcome: Result<RewardReceipt, RewardError>,
        viewport: Viewport,
        now_ms: f64,
    ) -> Result<(), CommandError> {
        if self.claim != ClaimStatus::Pending {
            return Err(CommandError::NoClaimPending);
        }
        match outcome {
            Ok(receipt) => {
                log::info!("Reward claimed, digest {}", receipt.digest);
                self.claim = ClaimStatus::Claimed {
                    digest: receipt.digest.clone(),
                };
                self.push_event(GameEvent::RewardClaimed(receipt));
                self.enter_menu(viewport, now_ms);
            }
            Err(err) => {
                let reason = err.to_string();
                log::warn!("Reward claim failed: {}", reason);
                self.claim = ClaimStatus::Failed {
                    reason: reason.clone(),
                };
                self.push_event(GameEvent::RewardFailed { reason });
            }
        }
        Ok(())
    }

    pub fn snapshot(&self, viewport: Viewport) -> Snapshot {
        let (actor, obstacles) = match self.phase {
            GamePhase::Menu => (None, self.menu_stream.obstacles().to_vec()),
            GamePhase::Playing | GamePhase::GameOver => (
                Some(self.session.actor),
                self.session.obstacles.obstacles().to_vec(),
            ),
        };
        Snapshot {
            phase: self.phase,
            dimensions: Dimensions::resolve(viewport),
            actor,
            obstacles,
            score: self.session.score,
            high_score: self.high_score,
            tokens_earned: self.session.tokens_earned,
            claim: self.claim.clone(),
            account: self.account.clone(),
            can_claim: self.can_claim(),
            can_return_to_menu: self.can_return_to_menu(),
        }
    }
}
