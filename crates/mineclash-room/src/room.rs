//! Room actor: an isolated Tokio task that owns one board and its
//! players.
//!
//! All room state is mutated inside the actor task, in command-channel
//! order; no two reveals for the same room are ever processed
//! concurrently, and the tile → score → termination broadcast order of a
//! reveal can never interleave with another player's request.
//!
//! The turn timer is a one-shot sleep task that sends `TurnTimeout`
//! back into the room's own channel, stamped with the round generation
//! at schedule time. The generation bumps on every start, stop, round
//! end, and teardown, so a timer firing into a superseded round is a
//! no-op regardless of task scheduling races.

use std::collections::HashMap;
use std::time::Duration;

use mineclash_game::{
    GameSession, RevealError, RoundOutcome, check_termination, victory_info,
};
use mineclash_protocol::{
    Mode, OptionPatch, PlayerId, PlayerSlot, Recipient, RoomId, ServerEvent,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::modes::{AfterReveal, Gate, ModeHandler};
use crate::options::RoundSettings;
use crate::{AdmissionError, RoomError};

/// Maximum players per room, spectating joiners included.
pub const MAX_PLAYERS: usize = 8;

/// Command channel depth per room actor.
const CHANNEL_SIZE: usize = 64;

/// Channel sender delivering outbound events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// A player request routed into a room.
#[derive(Debug, Clone)]
pub enum RoomAction {
    /// Host relays pending settings (host-only).
    UpdateOption(OptionPatch),
    /// Start or restart a round (host-only).
    Start(OptionPatch),
    /// Abort the current round (host-only).
    Stop,
    /// Reveal a tile.
    Reveal { x: u32, y: u32 },
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<LeaveOutcome>,
    },
    Action {
        player_id: PlayerId,
        action: RoomAction,
    },
    /// Fired by the turn-timer task. Ignored unless the generation
    /// still matches the live round.
    TurnTimeout { generation: u64 },
    Shutdown,
}

/// What a leave did to the room.
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    /// Whether the player was actually a member.
    pub removed: bool,
    /// Whether the room is now empty and should be reclaimed.
    pub empty: bool,
}

/// Handle to a running room actor. Cheap to clone; the registry holds
/// one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's join code.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Adds a player and registers their outbound channel.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join { player_id, name, sender, reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Removes a player; the outcome tells the registry whether the
    /// room emptied out.
    pub async fn leave(
        &self,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave { player_id, reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Routes a player action into the room (fire-and-forget).
    pub async fn act(
        &self,
        player_id: PlayerId,
        action: RoomAction,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Action { player_id, action })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Tells the room to tear down.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    host_id: PlayerId,
    /// Roster in join order, host first. Includes mid-round joiners.
    roster: Vec<(PlayerId, String)>,
    senders: HashMap<PlayerId, PlayerSender>,
    /// Player ids frozen at round start; only these may reveal.
    participants: Vec<PlayerId>,
    settings: RoundSettings,
    pending_option: Option<OptionPatch>,
    session: GameSession,
    handler: ModeHandler,
    turn_player: Option<PlayerId>,
    /// Round identity; bumped on start/stop/end/teardown to invalidate
    /// in-flight timers.
    generation: u64,
    turn_timer: Option<JoinHandle<()>>,
    /// Clone of our own command sender, handed to timer tasks.
    cmd_tx: mpsc::Sender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(
            room_id = %self.room_id,
            host = %self.host_id,
            "room opened"
        );
        self.emit(
            Recipient::Player(self.host_id),
            ServerEvent::RoomCreated { room_id: self.room_id.clone() },
        );

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { player_id, name, sender, reply } => {
                    let result = self.handle_join(player_id, name, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let outcome = self.handle_leave(player_id);
                    let empty = outcome.empty;
                    let _ = reply.send(outcome);
                    if empty {
                        break;
                    }
                }
                RoomCommand::Action { player_id, action } => {
                    self.handle_action(player_id, action);
                }
                RoomCommand::TurnTimeout { generation } => {
                    self.handle_turn_timeout(generation);
                }
                RoomCommand::Shutdown => break,
            }
        }

        self.generation += 1;
        self.cancel_turn_timer();
        tracing::info!(room_id = %self.room_id, "room closed");
    }

    // --- membership -------------------------------------------------------

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let already_member =
            self.roster.iter().any(|&(id, _)| id == player_id);
        if !already_member {
            if self.roster.len() >= MAX_PLAYERS {
                return Err(RoomError::RoomFull(self.room_id.clone()));
            }
            self.roster.push((player_id, name));
        }
        self.senders.insert(player_id, sender);

        let can_participate = !self.session.started;
        tracing::info!(
            room_id = %self.room_id,
            player = %player_id,
            players = self.roster.len(),
            can_participate,
            "player joined"
        );

        self.emit(
            Recipient::All,
            ServerEvent::RoomJoined {
                room_id: self.room_id.clone(),
                players: self.roster_slots(),
                host_id: self.host_id,
                can_participate,
            },
        );
        self.emit(
            Recipient::All,
            ServerEvent::GameState(self.session.snapshot(self.turn_player)),
        );

        // Catch the joiner up on everything the room already knows.
        let to_joiner = Recipient::Player(player_id);
        if let Some(pending) = &self.pending_option {
            self.emit(to_joiner, ServerEvent::OptionUpdate(pending.clone()));
        }
        for update in self.session.revealed_log() {
            self.emit(
                to_joiner,
                ServerEvent::TileUpdate { update: *update, owner: None },
            );
        }
        if !self.session.scores.is_empty() {
            self.emit(to_joiner, self.score_update());
        }
        if self.session.over {
            self.emit(
                to_joiner,
                ServerEvent::GameOver {
                    winner: self.session.winner,
                    reason: self
                        .session
                        .over_reason
                        .clone()
                        .unwrap_or_default(),
                },
            );
        }

        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> LeaveOutcome {
        let Some(pos) =
            self.roster.iter().position(|&(id, _)| id == player_id)
        else {
            return LeaveOutcome { removed: false, empty: self.roster.is_empty() };
        };
        self.roster.remove(pos);
        self.senders.remove(&player_id);
        self.participants.retain(|&id| id != player_id);
        self.handler.on_player_left(player_id);

        tracing::info!(
            room_id = %self.room_id,
            player = %player_id,
            players = self.roster.len(),
            "player left"
        );

        // A leaver holding the turn force-passes it; the round goes on.
        if self.session.started
            && !self.session.over
            && self.session.mode == Mode::Turn
            && self.turn_player == Some(player_id)
        {
            self.pass_turn(true);
        }

        if self.roster.is_empty() {
            self.generation += 1;
            self.cancel_turn_timer();
            LeaveOutcome { removed: true, empty: true }
        } else {
            self.emit(
                Recipient::All,
                ServerEvent::Error { message: "Opponent left".into() },
            );
            LeaveOutcome { removed: true, empty: false }
        }
    }

    // --- actions ----------------------------------------------------------

    fn handle_action(&mut self, player_id: PlayerId, action: RoomAction) {
        if !self.roster.iter().any(|&(id, _)| id == player_id) {
            tracing::warn!(
                room_id = %self.room_id,
                player = %player_id,
                "action from non-member, ignoring"
            );
            return;
        }

        match action {
            RoomAction::UpdateOption(patch) => {
                if !self.require_host(player_id, "option:update") {
                    return;
                }
                self.pending_option = Some(patch.clone());
                self.emit(Recipient::All, ServerEvent::OptionUpdate(patch));
            }
            RoomAction::Start(patch) => {
                if !self.require_host(player_id, "game:start") {
                    return;
                }
                self.start_round(&patch);
            }
            RoomAction::Stop => {
                if !self.require_host(player_id, "game:stop") {
                    return;
                }
                self.stop_round();
            }
            RoomAction::Reveal { x, y } => self.handle_reveal(player_id, x, y),
        }
    }

    /// Host-only actions from non-hosts are dropped without a reply;
    /// they only arise from stale or misbehaving clients.
    fn require_host(&self, player_id: PlayerId, action: &str) -> bool {
        if player_id == self.host_id {
            return true;
        }
        tracing::debug!(
            room_id = %self.room_id,
            player = %player_id,
            action,
            "host-only action from non-host, ignoring"
        );
        false
    }

    // --- round lifecycle --------------------------------------------------

    fn start_round(&mut self, patch: &OptionPatch) {
        self.settings.apply(patch);
        let config = self.settings.resolve();
        self.pending_option = Some(self.settings.as_patch());

        // A restart simply discards the running round; its timers die
        // with the generation bump.
        self.generation += 1;
        self.cancel_turn_timer();

        let mut session = GameSession::new(&config);
        session.started = true;
        self.session = session;
        self.participants =
            self.roster.iter().map(|&(id, _)| id).collect();
        self.handler = ModeHandler::new(config.mode);
        self.turn_player = match config.mode {
            Mode::Turn => Some(self.host_id),
            Mode::Realtime => None,
        };

        tracing::info!(
            room_id = %self.room_id,
            generation = self.generation,
            seed = config.seed,
            mines = config.mines,
            mode = ?config.mode,
            participants = self.participants.len(),
            "round started"
        );

        // Full state goes out before any turn or timer event.
        self.emit(
            Recipient::All,
            ServerEvent::GameState(self.session.snapshot(self.turn_player)),
        );
        match config.mode {
            Mode::Turn => {
                self.emit(
                    Recipient::All,
                    ServerEvent::TurnUpdate { turn_player: self.turn_player },
                );
                self.start_turn_timer();
            }
            Mode::Realtime => {
                self.emit(
                    Recipient::All,
                    ServerEvent::TimerReset { remaining: 0 },
                );
            }
        }
    }

    fn stop_round(&mut self) {
        self.generation += 1;
        self.cancel_turn_timer();
        self.session.started = false;
        self.session.over = false;
        self.turn_player = None;

        tracing::info!(room_id = %self.room_id, "round stopped by host");
        self.emit(
            Recipient::All,
            ServerEvent::GameState(self.session.snapshot(None)),
        );
    }

    fn end_round(&mut self, outcome: RoundOutcome) {
        self.generation += 1;
        self.cancel_turn_timer();
        self.session.over = true;
        self.session.started = false;
        self.session.winner = outcome.winner;
        self.session.over_reason = Some(outcome.reason.clone());

        tracing::info!(
            room_id = %self.room_id,
            winner = ?outcome.winner,
            reason = %outcome.reason,
            "round over"
        );
        self.emit(
            Recipient::All,
            ServerEvent::GameOver {
                winner: outcome.winner,
                reason: outcome.reason,
            },
        );
    }

    // --- reveal pipeline --------------------------------------------------

    fn handle_reveal(&mut self, player_id: PlayerId, x: u32, y: u32) {
        if !self.session.started || self.session.over {
            return self.refuse(player_id, AdmissionError::NotActive);
        }
        if !self.participants.contains(&player_id) {
            return self.refuse(player_id, AdmissionError::NotParticipant);
        }
        if !self.session.in_bounds(x, y) {
            return self.refuse(player_id, AdmissionError::OutOfRange);
        }

        let now = Instant::now();
        match self.handler.admit(player_id, self.turn_player, now) {
            Gate::Admitted => {}
            Gate::Refused(err) => return self.refuse(player_id, err),
            Gate::Locked { remaining } => {
                self.emit(
                    Recipient::Player(player_id),
                    ServerEvent::StunActive { remaining },
                );
                return;
            }
        }

        let outcome = match self.session.reveal(player_id, x, y) {
            Ok(outcome) => outcome,
            Err(err @ RevealError::AlreadyRevealed) => {
                self.emit(
                    Recipient::Player(player_id),
                    ServerEvent::Error { message: err.to_string() },
                );
                return;
            }
        };

        for update in &outcome.updates {
            self.emit(
                Recipient::All,
                ServerEvent::TileUpdate {
                    update: *update,
                    owner: Some(player_id),
                },
            );
        }
        let score_update = self.score_update();
        self.emit(Recipient::All, score_update);

        if let Some(end) =
            check_termination(&self.session.scores, self.session.mine_count)
        {
            self.end_round(end);
            return;
        }

        match self.handler.after_reveal(player_id, &outcome, &self.session, now)
        {
            AfterReveal::PassTurn => self.pass_turn(false),
            AfterReveal::RestartTimer => self.start_turn_timer(),
            AfterReveal::Stun { duration } => {
                self.emit(
                    Recipient::Player(player_id),
                    ServerEvent::StunStart { duration },
                );
                self.emit(
                    Recipient::All,
                    ServerEvent::StunState { player_id, duration },
                );
            }
            AfterReveal::None => {}
        }
    }

    fn refuse(&self, player_id: PlayerId, err: AdmissionError) {
        tracing::debug!(
            room_id = %self.room_id,
            player = %player_id,
            %err,
            "reveal refused"
        );
        self.emit(
            Recipient::Player(player_id),
            ServerEvent::Error { message: err.to_string() },
        );
    }

    // --- turn rotation & timer --------------------------------------------

    fn pass_turn(&mut self, timed_out: bool) {
        if self.session.mode != Mode::Turn || self.participants.is_empty() {
            return;
        }
        // A vanished turn holder (left the room) resolves to index -1,
        // so the next holder is the first participant.
        let next = match self
            .turn_player
            .and_then(|tp| self.participants.iter().position(|&id| id == tp))
        {
            Some(current) => (current + 1) % self.participants.len(),
            None => 0,
        };
        self.turn_player = Some(self.participants[next]);

        tracing::debug!(
            room_id = %self.room_id,
            turn_player = %self.participants[next],
            timed_out,
            "turn passed"
        );
        self.emit(
            Recipient::All,
            ServerEvent::TurnUpdate { turn_player: self.turn_player },
        );
        self.start_turn_timer();
    }

    fn handle_turn_timeout(&mut self, generation: u64) {
        if generation != self.generation
            || !self.session.started
            || self.session.over
            || self.session.mode != Mode::Turn
        {
            tracing::debug!(
                room_id = %self.room_id,
                stale = generation,
                current = self.generation,
                "stale turn timer, ignoring"
            );
            return;
        }
        self.pass_turn(true);
    }

    /// (Re)arms the turn countdown. The previous timer task is aborted,
    /// so at most one timer is live per room.
    fn start_turn_timer(&mut self) {
        self.cancel_turn_timer();
        let seconds = self.session.turn_seconds;
        self.emit(
            Recipient::All,
            ServerEvent::TimerReset { remaining: seconds },
        );

        let generation = self.generation;
        let cmd_tx = self.cmd_tx.clone();
        self.turn_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(u64::from(seconds))).await;
            let _ = cmd_tx.send(RoomCommand::TurnTimeout { generation }).await;
        }));
    }

    fn cancel_turn_timer(&mut self) {
        if let Some(timer) = self.turn_timer.take() {
            timer.abort();
        }
    }

    // --- outbound ---------------------------------------------------------

    fn score_update(&self) -> ServerEvent {
        let scores = self.session.scores.clone();
        let info = victory_info(&scores, self.session.mine_count);
        ServerEvent::ScoreUpdate {
            scores,
            victory_info: info,
            mines_left: self.session.mines_left(),
        }
    }

    fn roster_slots(&self) -> Vec<PlayerSlot> {
        self.roster
            .iter()
            .enumerate()
            .map(|(idx, (id, name))| PlayerSlot {
                id: *id,
                name: name.clone(),
                idx,
            })
            .collect()
    }

    /// Delivers an event. Unreachable players (closed connections) are
    /// silently skipped; their departure arrives as a disconnect.
    fn emit(&self, to: Recipient, event: ServerEvent) {
        match to {
            Recipient::All => {
                for &(id, _) in &self.roster {
                    if let Some(sender) = self.senders.get(&id) {
                        let _ = sender.send(event.clone());
                    }
                }
            }
            Recipient::Player(id) => {
                if let Some(sender) = self.senders.get(&id) {
                    let _ = sender.send(event);
                }
            }
        }
    }
}

/// Spawns a room actor with the host as its first member and returns a
/// handle to it. The host's client receives `room:created` once the
/// actor is live.
pub(crate) fn spawn_room(
    room_id: RoomId,
    host_id: PlayerId,
    host_name: String,
    options: &OptionPatch,
    host_sender: PlayerSender,
) -> RoomHandle {
    let mut settings = RoundSettings::default();
    settings.apply(options);
    let session = GameSession::new(&settings.resolve());
    let handler = ModeHandler::new(settings.mode);
    let pending_option = Some(settings.as_patch());

    let (cmd_tx, receiver) = mpsc::channel(CHANNEL_SIZE);
    let actor = RoomActor {
        room_id: room_id.clone(),
        host_id,
        roster: vec![(host_id, host_name)],
        senders: HashMap::from([(host_id, host_sender)]),
        participants: Vec::new(),
        settings,
        pending_option,
        session,
        handler,
        turn_player: None,
        generation: 0,
        turn_timer: None,
        cmd_tx: cmd_tx.clone(),
        receiver,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: cmd_tx }
}
