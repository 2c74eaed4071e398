//! Sui Flap entry point
//!
//! Browser builds hook the page up to the game. Native builds run a seeded
//! autopilot session headlessly.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{OnceCell, RefCell};
    use std::future::Future;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::convert::FromWasmAbi;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{Document, Event, KeyboardEvent, MouseEvent};

    use sui_flap::audio::{AudioSink, WebAudio};
    use sui_flap::game::submit_claim;
    use sui_flap::ledger::{AccountAddress, LedgerConfig, LedgerError, LedgerQuery, decode_score, format_units};
    use sui_flap::platform::web::{BrowserScheduler, now_ms, viewport};
    use sui_flap::platform::{FIELD_FLAP_EVENTS, InputSource, LoopKind, is_flap_key};
    use sui_flap::reward::{RewardAccumulator, RewardError, RewardReceipt, RewardRequest};
    use sui_flap::sim::{ClaimStatus, GameEvent, GamePhase, Snapshot, TickInput};
    use sui_flap::{Character, Command, Game, Settings};

    // Bridge to the page's wallet integration (`window.suiFlap`)
    #[wasm_bindgen(inline_js = "
        function bridge(name) {
            const b = window.suiFlap;
            return b && typeof b[name] === 'function' ? b[name].bind(b) : null;
        }

        export function submit_reward(call_json) {
            const f = bridge('submitReward');
            return f ? Promise.resolve(f(JSON.parse(call_json)))
                     : Promise.reject(new Error('wallet bridge unavailable'));
        }

        export function fetch_balance(network, address) {
            const f = bridge('fetchBalance');
            return f ? Promise.resolve(f(network, address)).then(String)
                     : Promise.reject(new Error('wallet bridge unavailable'));
        }

        export function fetch_score(network, call_json) {
            const f = bridge('fetchScore');
            return f ? Promise.resolve(f(network, JSON.parse(call_json)))
                         .then(bytes => bytes == null ? null : Uint8Array.from(bytes))
                     : Promise.reject(new Error('wallet bridge unavailable'));
        }

        export function render_frame(snapshot_json, emoji) {
            const f = bridge('render');
            if (f) f(JSON.parse(snapshot_json), emoji);
        }
    ")]
    extern "C" {
        fn submit_reward(call_json: &str) -> js_sys::Promise;
        fn fetch_balance(network: &str, address: &str) -> js_sys::Promise;
        fn fetch_score(network: &str, call_json: &str) -> js_sys::Promise;
        fn render_frame(snapshot_json: &str, emoji: &str);
    }

    fn js_message(value: &JsValue) -> String {
        value
            .dyn_ref::<js_sys::Error>()
            .map(|e| String::from(e.message()))
            .or_else(|| value.as_string())
            .unwrap_or_else(|| format!("{:?}", value))
    }

    /// Reward claims signed and executed by the page's wallet
    #[derive(Clone)]
    struct WalletRewards {
        config: LedgerConfig,
    }

    impl RewardAccumulator for WalletRewards {
        fn submit(
            &self,
            request: &RewardRequest,
        ) -> impl Future<Output = Result<RewardReceipt, RewardError>> {
            let call = self.config.reward_call(request);
            async move {
                let json =
                    serde_json::to_string(&call).map_err(|e| RewardError::Rejected(e.to_string()))?;
                let value = JsFuture::from(submit_reward(&json))
                    .await
                    .map_err(|e| RewardError::Rejected(js_message(&e)))?;
                let digest = js_sys::Reflect::get(&value, &JsValue::from_str("digest"))
                    .ok()
                    .and_then(|d| d.as_string())
                    .ok_or_else(|| RewardError::Network("no transaction digest returned".into()))?;
                Ok(RewardReceipt { digest })
            }
        }
    }

    /// Read-only queries against the configured fullnode
    #[derive(Clone)]
    struct WalletLedger {
        config: LedgerConfig,
    }

    impl LedgerQuery for WalletLedger {
        fn balance(&self, account: &AccountAddress) -> impl Future<Output = Result<u64, LedgerError>> {
            let promise = fetch_balance(&self.config.network.fullnode_url(), account.as_str());
            async move {
                let value = JsFuture::from(promise)
                    .await
                    .map_err(|e| LedgerError::Query(js_message(&e)))?;
                value
                    .as_string()
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or_else(|| LedgerError::Query("balance is not an integer".into()))
            }
        }

        fn score(&self, account: &AccountAddress) -> impl Future<Output = Result<u64, LedgerError>> {
            let call = self.config.score_query_call(account);
            let url = self.config.network.fullnode_url();
            async move {
                let json = serde_json::to_string(&call).map_err(|e| LedgerError::Query(e.to_string()))?;
                let value = JsFuture::from(fetch_score(&url, &json))
                    .await
                    .map_err(|e| LedgerError::Query(js_message(&e)))?;
                let bytes = value
                    .dyn_ref::<js_sys::Uint8Array>()
                    .map(|a| a.to_vec());
                decode_score(bytes.as_deref())
            }
        }
    }

    /// Everything the page talks to
    struct App {
        game: Game<BrowserScheduler>,
        audio: WebAudio,
        settings: Settings,
        rewards: WalletRewards,
        ledger: WalletLedger,
    }

    impl App {
        fn input() -> TickInput {
            TickInput::new(viewport(), now_ms())
        }

        fn command(&mut self, command: Command) {
            if let Err(e) = self.game.handle(command, &Self::input()) {
                log::warn!("Command rejected: {}", e);
            }
            self.dispatch_events();
        }

        fn on_timer(&mut self, kind: LoopKind) {
            self.game.on_timer(kind, &Self::input());
            self.dispatch_events();
        }

        fn claim(&mut self) {
            if !self.settings.ledger.is_deployed() {
                log::warn!("Rewards unavailable: contract ids not configured");
                return;
            }
            self.command(Command::ClaimReward);
        }

        fn toggle_sound(&mut self) {
            let muted = self.audio.toggle_muted();
            if !muted && self.game.phase() == GamePhase::Menu {
                self.audio.set_theme(true);
            }
            self.settings.sound_enabled = !muted;
            self.settings.save();
        }

        /// Route drained events to audio and the wallet
        fn dispatch_events(&mut self) {
            for event in self.game.drain_events() {
                self.audio.handle_event(&event);
                match event {
                    GameEvent::RewardRequested(request) => {
                        let rewards = self.rewards.clone();
                        spawn_local(async move {
                            let settled = submit_claim(&rewards, request).await;
                            with_app(|app| app.command(settled));
                        });
                    }
                    GameEvent::RewardClaimed(receipt) => {
                        log::info!("Reward claimed in {}", receipt.digest);
                        if let Some(account) = self.game.state().account.clone() {
                            refresh_ledger(self.ledger.clone(), self.settings.reward.decimals, account);
                        }
                    }
                    GameEvent::RewardFailed { reason } => log::warn!("Reward failed: {}", reason),
                    _ => {}
                }
            }
        }

        fn render(&self) {
            let snapshot = self.game.snapshot(viewport());
            match serde_json::to_string(&snapshot) {
                Ok(json) => render_frame(&json, self.settings.character.emoji()),
                Err(e) => log::warn!("Snapshot not serializable: {}", e),
            }
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                update_hud(&document, &snapshot);
            }
        }
    }

    thread_local! {
        static APP: OnceCell<Rc<RefCell<App>>> = const { OnceCell::new() };
    }

    /// Run `f` against the app unless it is missing or already borrowed
    fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
        let app = APP.with(|cell| cell.get().cloned())?;
        let Ok(mut app) = app.try_borrow_mut() else {
            log::warn!("App busy, dropping re-entrant call");
            return None;
        };
        Some(f(&mut app))
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    fn update_hud(document: &Document, snapshot: &Snapshot) {
        set_visible(document, "menu-screen", snapshot.phase == GamePhase::Menu);
        set_visible(document, "hud", snapshot.phase == GamePhase::Playing);
        set_visible(document, "game-over", snapshot.phase == GamePhase::GameOver);

        set_text(document, "hud-score", &snapshot.score.to_string());
        set_text(document, "high-score", &snapshot.high_score.to_string());
        set_visible(document, "hud-tokens", snapshot.account.is_some());
        set_text(document, "hud-tokens", &format!("+{}", snapshot.tokens_earned));

        if snapshot.phase == GamePhase::GameOver {
            set_text(document, "final-score", &snapshot.score.to_string());
            set_visible(document, "claim-btn", snapshot.can_claim);
            let status = match &snapshot.claim {
                ClaimStatus::Unclaimed => String::new(),
                ClaimStatus::Pending => "Claiming...".to_string(),
                ClaimStatus::Claimed { digest } => format!("Claimed ({})", digest),
                ClaimStatus::Failed { reason } => format!("Claim failed: {}", reason),
            };
            set_text(document, "claim-status", &status);
            if let Some(btn) = document.get_element_by_id("menu-btn") {
                if snapshot.can_return_to_menu {
                    let _ = btn.remove_attribute("disabled");
                } else {
                    let _ = btn.set_attribute("disabled", "");
                }
            }
        }

        let wallet = snapshot
            .account
            .as_ref()
            .map(|a| a.short())
            .unwrap_or_else(|| "Not connected".to_string());
        set_text(document, "wallet-address", &wallet);
    }

    /// Fetch balance and on-chain best score, then show them
    fn refresh_ledger(ledger: WalletLedger, decimals: u32, account: AccountAddress) {
        spawn_local(async move {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            match ledger.balance(&account).await {
                Ok(balance) => set_text(&document, "wallet-balance", &format_units(balance, decimals)),
                Err(e) => log::warn!("Balance query failed: {}", e),
            }
            match ledger.score(&account).await {
                Ok(score) => set_text(&document, "onchain-score", &score.to_string()),
                Err(e) => log::warn!("Score query failed: {}", e),
            }
        });
    }

    fn listen<E: FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        event: &str,
        handler: impl FnMut(E) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn flap(source: InputSource) {
        with_app(|app| {
            app.audio.resume();
            app.command(Command::Flap(source));
        });
    }

    fn setup_input_handlers(document: &Document) {
        if let Some(window) = web_sys::window() {
            listen(&window, "keydown", |event: KeyboardEvent| {
                if is_flap_key(&event.code()) {
                    event.prevent_default();
                    flap(InputSource::Keyboard);
                }
            });
        }

        if let Some(field) = document.get_element_by_id("game") {
            for (name, source) in FIELD_FLAP_EVENTS {
                listen(&field, name, move |event: Event| {
                    // No synthetic click after a tap
                    if source == InputSource::Touch {
                        event.prevent_default();
                    }
                    flap(source);
                });
            }
        }
    }

    fn setup_buttons(document: &Document) {
        let buttons: [(&str, fn(&mut App)); 5] = [
            ("start-btn", |app| app.command(Command::Start)),
            ("play-again-btn", |app| app.command(Command::PlayAgain)),
            ("menu-btn", |app| app.command(Command::BackToMenu)),
            ("claim-btn", App::claim),
            ("sound-btn", App::toggle_sound),
        ];
        for (id, action) in buttons {
            if let Some(btn) = document.get_element_by_id(id) {
                listen(&btn, "click", move |event: MouseEvent| {
                    // Keep the click from also reaching the play field
                    event.stop_propagation();
                    with_app(|app| {
                        app.audio.resume();
                        action(app);
                    });
                });
            }
        }
    }

    fn request_animation_frame() {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |_time: f64| {
            with_app(|app| app.render());
            request_animation_frame();
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("logger init failed: {}", e).into());
        }

        log::info!("Sui Flap starting...");

        let settings = Settings::load();
        let seed = settings.seed.unwrap_or_else(|| js_sys::Date::now() as u64);

        let on_tick: Rc<dyn Fn(LoopKind)> = Rc::new(|kind| {
            with_app(|app| app.on_timer(kind));
        });
        let game = Game::new(seed, BrowserScheduler::new(on_tick), &App::input())
            .with_reward_policy(settings.reward);

        let mut audio = WebAudio::new(
            settings.master_volume,
            settings.sfx_volume,
            settings.music_volume,
            !settings.sound_enabled,
        );
        // The game opens in the menu without a phase change
        audio.set_theme(true);

        let app = App {
            game,
            audio,
            rewards: WalletRewards {
                config: settings.ledger.clone(),
            },
            ledger: WalletLedger {
                config: settings.ledger.clone(),
            },
            settings,
        };
        log::info!(
            "Game initialized with seed {} on {}",
            seed,
            app.settings.ledger.network.as_str()
        );

        APP.with(|cell| {
            if cell.set(Rc::new(RefCell::new(app))).is_err() {
                log::error!("Sui Flap already running");
            }
        });

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document");
            return;
        };
        set_visible(&document, "loading", false);
        setup_input_handlers(&document);
        setup_buttons(&document);
        request_animation_frame();

        log::info!("Sui Flap running!");
    }

    #[wasm_bindgen]
    pub fn connect_wallet(address: &str) -> Result<(), JsValue> {
        let account = AccountAddress::parse(address).map_err(|e| JsValue::from_str(&e.to_string()))?;
        with_app(|app| {
            app.command(Command::ConnectWallet(account.clone()));
            refresh_ledger(app.ledger.clone(), app.settings.reward.decimals, account);
        });
        Ok(())
    }

    #[wasm_bindgen]
    pub fn disconnect_wallet() {
        with_app(|app| app.command(Command::DisconnectWallet));
    }

    #[wasm_bindgen]
    pub fn select_character(name: &str) -> Result<(), JsValue> {
        let character =
            Character::from_name(name).ok_or_else(|| JsValue::from_str("unknown character"))?;
        with_app(|app| {
            app.settings.character = character;
            app.settings.save();
        });
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    use sui_flap::audio::{AudioSink, LogAudio};
    use sui_flap::consts::TICK_MS;
    use sui_flap::game::submit_claim;
    use sui_flap::ledger::{AccountAddress, LedgerConfig};
    use sui_flap::platform::{InputSource, ManualScheduler};
    use sui_flap::reward::{RewardAccumulator, RewardError, RewardReceipt, RewardRequest};
    use sui_flap::sim::{Dimensions, GamePhase, GameState, TickInput, Viewport};
    use sui_flap::{Command, Game, Settings};

    const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);
    /// One minute of play
    const MAX_TICKS: u32 = 3600;
    const DEMO_ACCOUNT: &str = "0xdec0de";

    /// Logs the move call it would submit and accepts it
    struct DryRun {
        config: LedgerConfig,
    }

    impl RewardAccumulator for DryRun {
        fn submit(
            &self,
            request: &RewardRequest,
        ) -> impl Future<Output = Result<RewardReceipt, RewardError>> {
            let call = self.config.reward_call(request);
            let outcome = serde_json::to_string_pretty(&call)
                .map(|json| {
                    log::info!("Dry-run reward call:\n{}", json);
                    RewardReceipt {
                        digest: "dry-run".to_string(),
                    }
                })
                .map_err(|e| RewardError::Rejected(e.to_string()));
            std::future::ready(outcome)
        }
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        let mut future = pin!(future);
        let mut cx = Context::from_waker(Waker::noop());
        loop {
            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                return output;
            }
        }
    }

    /// Flap when falling below the middle of the next gap
    fn wants_flap(state: &GameState, dims: &Dimensions) -> bool {
        let actor = &state.session.actor;
        let target = state
            .session
            .obstacles
            .obstacles()
            .iter()
            .find(|o| o.right_edge(dims.obstacle_width) >= actor.pos.x)
            .map(|o| o.top_height + o.gap() * 0.5)
            .unwrap_or(dims.field_height * 0.5);
        actor.velocity >= 0.0 && actor.pos.y + dims.actor_size * 0.5 > target
    }

    pub fn run() {
        let settings = Settings::load();
        let seed = settings.seed.unwrap_or_else(rand::random);
        let dims = Dimensions::resolve(VIEWPORT);
        let mut audio = LogAudio::new();
        audio.set_muted(!settings.sound_enabled);

        let mut game = Game::new(seed, ManualScheduler::new(), &TickInput::new(VIEWPORT, 0.0))
            .with_reward_policy(settings.reward);
        log::info!("Autopilot run with seed {}", seed);

        let wallet = match AccountAddress::parse(DEMO_ACCOUNT) {
            Ok(account) => account,
            Err(e) => {
                log::error!("Bad demo account: {}", e);
                return;
            }
        };
        let start = TickInput::new(VIEWPORT, 0.0);
        for command in [Command::ConnectWallet(wallet), Command::Start] {
            if let Err(e) = game.handle(command, &start) {
                log::error!("Could not start: {}", e);
                return;
            }
        }

        let mut ticks = 0;
        while game.phase() == GamePhase::Playing && ticks < MAX_TICKS {
            let input = TickInput::new(VIEWPORT, f64::from(ticks) * TICK_MS);
            if wants_flap(game.state(), &dims) {
                if let Err(e) = game.handle(Command::Flap(InputSource::Keyboard), &input) {
                    log::warn!("Flap rejected: {}", e);
                }
            }
            game.pump(&input);
            for event in game.drain_events() {
                audio.handle_event(&event);
            }
            ticks += 1;
        }

        let state = game.state();
        log::info!(
            "Run over after {} ticks: phase {:?}, score {}, tokens {}, {} sounds",
            ticks,
            state.phase,
            state.session.score,
            state.session.tokens_earned,
            audio.played().len()
        );

        if !game.state().can_claim() {
            return;
        }
        let end = TickInput::new(VIEWPORT, f64::from(ticks) * TICK_MS);
        if let Err(e) = game.handle(Command::ClaimReward, &end) {
            log::warn!("Claim rejected: {}", e);
            return;
        }
        let dry_run = DryRun {
            config: settings.ledger.clone(),
        };
        for event in game.drain_events() {
            if let sui_flap::sim::GameEvent::RewardRequested(request) = event {
                let settled = block_on(submit_claim(&dry_run, request));
                if let Err(e) = game.handle(settled, &end) {
                    log::warn!("Settlement rejected: {}", e);
                }
            }
        }
        log::info!("Claim {:?}, back in {:?}", game.state().claim, game.phase());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Sui Flap (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
