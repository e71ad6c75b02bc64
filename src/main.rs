//! Neon Pulse entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Event, HtmlCanvasElement, HtmlElement, KeyboardEvent, PointerEvent, TouchEvent,
    };

    use neon_pulse::audio::AudioManager;
    use neon_pulse::consts::palette;
    use neon_pulse::highscores::format_age;
    use neon_pulse::persistence::{
        KeyValueStore, LocalStorage, MemoryStore, PersistenceBridge, StoreError,
    };
    use neon_pulse::platform::{EventListener, FrameLoop};
    use neon_pulse::renderer::{RenderState, build_frame};
    use neon_pulse::shop::{self, CATALOG, PaymentError, PaymentProvider, PaymentRequest};
    use neon_pulse::sim::{GameStatus, TickInput, Viewport};
    use neon_pulse::{HudSnapshot, Session};

    // Wallet bridge. The host page exposes `window.neonPulseWallet` with
    // `connected()` and `sendPayment({ itemId, opcode, amountNano })`.
    #[wasm_bindgen(inline_js = "
        export function wallet_connected() {
            const wallet = globalThis.neonPulseWallet;
            return !!(wallet && wallet.connected());
        }

        export async function send_wallet_payment(itemId, opcode, amountNano) {
            const wallet = globalThis.neonPulseWallet;
            if (!wallet) {
                throw new Error('Wallet not connected');
            }
            return await wallet.sendPayment({ itemId, opcode, amountNano });
        }
    ")]
    extern "C" {
        fn wallet_connected() -> bool;
        #[wasm_bindgen(catch)]
        async fn send_wallet_payment(
            item_id: &str,
            opcode: u32,
            amount_nano: String,
        ) -> Result<JsValue, JsValue>;
    }

    /// TON wallet reached through the page's wallet bridge
    struct BrowserWallet;

    impl PaymentProvider for BrowserWallet {
        fn is_connected(&self) -> bool {
            wallet_connected()
        }

        async fn send_payment(&self, request: &PaymentRequest) -> Result<(), PaymentError> {
            let amount = request
                .amount_nano()
                .ok_or_else(|| PaymentError::Rejected(format!("bad price {}", request.amount_ton)))?;
            send_wallet_payment(request.item_id, request.opcode, amount.to_string())
                .await
                .map(|_| ())
                .map_err(|e| {
                    PaymentError::Rejected(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
                })
        }
    }

    /// LocalStorage when the browser allows it, memory otherwise
    enum BrowserStore {
        Local(LocalStorage),
        Memory(MemoryStore),
    }

    impl BrowserStore {
        fn open() -> Self {
            match LocalStorage::open() {
                Ok(storage) => BrowserStore::Local(storage),
                Err(e) => {
                    log::warn!("{} - progress will not be saved", e);
                    BrowserStore::Memory(MemoryStore::new())
                }
            }
        }
    }

    impl KeyValueStore for BrowserStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            match self {
                BrowserStore::Local(s) => s.get(key),
                BrowserStore::Memory(s) => s.get(key),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            match self {
                BrowserStore::Local(s) => s.set(key, value),
                BrowserStore::Memory(s) => s.set(key, value),
            }
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            match self {
                BrowserStore::Local(s) => s.remove(key),
                BrowserStore::Memory(s) => s.remove(key),
            }
        }
    }

    /// Game instance holding all state
    struct Game {
        session: Session<BrowserStore>,
        render_state: Option<RenderState>,
        audio: AudioManager,
        /// One-shot input collected since the last frame
        input: TickInput,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        /// Status the overlays were last drawn for
        shown_status: Option<GameStatus>,
    }

    impl Game {
        fn new(session: Session<BrowserStore>) -> Self {
            let audio = AudioManager::new(session.settings());
            Self {
                session,
                render_state: None,
                audio,
                input: TickInput::default(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                shown_status: None,
            }
        }

        fn frame(&mut self, time: f64) {
            let input = std::mem::take(&mut self.input);
            if input.start {
                self.audio.resume();
            }
            let events = self.session.frame(&input, js_sys::Date::now());
            self.audio.play_events(&events);

            self.track_fps(time);
            self.render(time);
            self.update_hud();
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 && time > oldest {
                self.fps = (60000.0 / (time - oldest)).round() as u32;
            }
        }

        fn render(&mut self, time: f64) {
            let vertices = build_frame(self.session.state(), time, self.session.settings());
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&vertices) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        render_state.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn toggle_mute(&mut self) {
            let muted = self.session.toggle_mute();
            self.audio.apply_settings(self.session.settings());
            log::info!("Sound {}", if muted { "off" } else { "on" });
        }

        /// Match the canvas backing store and the play area to the CSS size
        fn resize(&mut self, canvas: &HtmlCanvasElement, dpr: f64) {
            let client_w = canvas.client_width().max(1);
            let client_h = canvas.client_height().max(1);
            let width = (client_w as f64 * dpr) as u32;
            let height = (client_h as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);

            let logical = (client_w as f32, client_h as f32);
            self.session.resize(Viewport::new(logical.0, logical.1));
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height, logical);
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.session.hud();

            set_text(&document, "hud-score", &hud.score.to_string());
            set_text(&document, "hud-high", &hud.high_score.to_string());
            set_text(&document, "hud-max-balls", &hud.max_balls.to_string());
            update_energy_bar(&document, &hud);
            update_timer(&document, "hud-shield", hud.shield_seconds);
            update_timer(&document, "hud-magnet", hud.magnet_seconds);

            let show_fps = self.session.settings().show_fps;
            set_hidden(&document, "hud-fps", !show_fps);
            if show_fps {
                set_text(&document, "hud-fps", &format!("{} FPS", self.fps));
            }

            if self.shown_status != Some(hud.status) {
                self.shown_status = Some(hud.status);
                self.update_overlays(&document, &hud);
            }
        }

        /// Start, pause and game over screens
        fn update_overlays(&self, document: &Document, hud: &HudSnapshot) {
            set_overlay(document, "start-screen", hud.status == GameStatus::Start);
            set_overlay(document, "pause-menu", hud.status == GameStatus::Paused);
            set_overlay(document, "game-over", hud.status == GameStatus::GameOver);

            if hud.status == GameStatus::GameOver {
                set_text(document, "final-score", &hud.score.to_string());
                set_text(document, "final-high", &hud.high_score.to_string());
                self.update_leaderboard(document);
            }
        }

        fn update_leaderboard(&self, document: &Document) {
            let Some(list) = document.get_element_by_id("leaderboard-list") else {
                return;
            };
            let now = js_sys::Date::now();
            let board = self.session.leaderboard();
            let mut html = String::new();
            for (i, entry) in board.entries.iter().enumerate() {
                html.push_str(&format!(
                    "<li><span class=\"rank\">{}</span><span class=\"score\">{}</span><span class=\"age\">{}</span></li>",
                    i + 1,
                    entry.score,
                    format_age(now, entry.timestamp)
                ));
            }
            list.set_inner_html(&html);
            set_text(document, "total-score", &board.total_score.to_string());
            set_text(document, "best-run", &board.best_run.to_string());
        }

        /// Grey out bought items
        fn update_shop(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let owned = self.session.purchases();
            for item in CATALOG.iter() {
                if let Some(btn) = document.get_element_by_id(&shop_button_id(item.id())) {
                    if owned.contains(item.id()) {
                        let _ = btn.set_attribute("disabled", "");
                        let _ = btn.class_list().add_1("owned");
                    } else {
                        let _ = btn.remove_attribute("disabled");
                        let _ = btn.class_list().remove_1("owned");
                    }
                }
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn set_overlay(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn update_timer(document: &Document, id: &str, seconds: u32) {
        set_hidden(document, id, seconds == 0);
        if seconds > 0 {
            set_text(document, &format!("{}-time", id), &format!("{}s", seconds));
        }
    }

    fn update_energy_bar(document: &Document, hud: &HudSnapshot) {
        let Some(bar) = document
            .get_element_by_id("energy-bar")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let color = if hud.low_energy {
            palette::HAZARD
        } else {
            palette::ENERGY
        };
        let style = bar.style();
        let _ = style.set_property("width", &format!("{:.1}%", hud.energy_fraction * 100.0));
        let _ = style.set_property("background-color", &format!("#{:06x}", color));
        set_text(
            document,
            "energy-value",
            &format!("{:.0}/{:.0}", hud.energy.max(0.0), hud.max_energy),
        );
    }

    fn shop_button_id(item_id: &str) -> String {
        format!("shop-{}", item_id)
    }

    fn show_shop_notice(text: &str) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            set_text(&document, "shop-notice", text);
        }
    }

    /// Validate, pay, then record. No borrow of the game is held across the
    /// wallet await.
    async fn buy(game: Rc<RefCell<Game>>, id: &'static str) {
        let wallet = BrowserWallet;
        let prepared = {
            let g = game.borrow();
            shop::prepare(id, &g.session.purchases(), &wallet)
        };
        let request = match prepared {
            Ok(request) => request,
            Err(e) => {
                show_shop_notice(&e.to_string());
                return;
            }
        };

        show_shop_notice("Confirm the payment in your wallet...");
        if let Err(e) = shop::pay(&wallet, &request).await {
            show_shop_notice(&e.to_string());
            return;
        }

        let mut g = game.borrow_mut();
        let recorded = g.session.complete_purchase(id);
        match recorded {
            Ok(_) => {
                log::info!("Purchased {}", id);
                show_shop_notice("Upgrade unlocked!");
                g.update_shop();
            }
            Err(e) => {
                log::error!("Paid for {} but could not record it: {}", id, e);
                show_shop_notice(&e.to_string());
            }
        }
    }

    /// Handles that keep the game alive; dropping them stops it
    struct App {
        frame_loop: FrameLoop,
        listeners: Vec<EventListener>,
    }

    impl Drop for App {
        fn drop(&mut self) {
            self.frame_loop.stop();
            log::info!("Neon Pulse stopped ({} listeners removed)", self.listeners.len());
        }
    }

    thread_local! {
        static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    }

    /// Stop the loop and remove every listener
    pub fn shutdown() {
        let app = APP.with(|app| app.borrow_mut().take());
        drop(app);
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Neon Pulse starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let viewport = Viewport::new(client_w as f32, client_h as f32);
        let session = Session::new(PersistenceBridge::new(BrowserStore::open()), viewport, seed);
        let game = Rc::new(RefCell::new(Game::new(session)));

        log::info!("Game initialized with seed: {}", seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        match init_renderer(&instance, &canvas, width, height, viewport).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => log::error!("Rendering disabled: {}", e),
        }

        game.borrow().update_shop();

        let listeners = match setup_listeners(&canvas, &game) {
            Ok(listeners) => listeners,
            Err(e) => {
                log::error!("Failed to attach input handlers: {:?}", e);
                return;
            }
        };

        let frame_game = game.clone();
        let frame_loop = match FrameLoop::start(move |time| frame_game.borrow_mut().frame(time)) {
            Ok(frame_loop) => frame_loop,
            Err(e) => {
                log::error!("Failed to start frame loop: {:?}", e);
                return;
            }
        };

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        APP.with(|app| {
            *app.borrow_mut() = Some(App {
                frame_loop,
                listeners,
            })
        });

        log::info!("Neon Pulse running!");
    }

    async fn init_renderer(
        instance: &wgpu::Instance,
        canvas: &HtmlCanvasElement,
        width: u32,
        height: u32,
        viewport: Viewport,
    ) -> Result<RenderState, neon_pulse::renderer::RenderError> {
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        RenderState::new(
            surface,
            &adapter,
            width,
            height,
            (viewport.width, viewport.height),
        )
        .await
    }

    /// Pointer position relative to the canvas
    fn touch_position(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Vec2> {
        let touch = event.touches().get(0)?;
        let rect = canvas.get_bounding_client_rect();
        Some(Vec2::new(
            touch.client_x() as f32 - rect.left() as f32,
            touch.client_y() as f32 - rect.top() as f32,
        ))
    }

    fn setup_listeners(
        canvas: &HtmlCanvasElement,
        game: &Rc<RefCell<Game>>,
    ) -> Result<Vec<EventListener>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let mut listeners = Vec::new();

        // Pointer (mouse and pen)
        {
            let game = game.clone();
            listeners.push(EventListener::typed(
                canvas,
                "pointermove",
                move |event: PointerEvent| {
                    let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                    game.borrow_mut().session.pointer_moved(pos);
                },
            )?);
        }

        // Touch
        for name in ["touchstart", "touchmove"] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            listeners.push(EventListener::typed(
                canvas,
                name,
                move |event: TouchEvent| {
                    event.prevent_default();
                    if let Some(pos) = touch_position(&canvas_clone, &event) {
                        game.borrow_mut().session.pointer_moved(pos);
                    }
                },
            )?);
        }

        // Keyboard
        {
            let game = game.clone();
            listeners.push(EventListener::typed(
                &window,
                "keydown",
                move |event: KeyboardEvent| {
                    let mut g = game.borrow_mut();
                    match event.key().as_str() {
                        " " | "Enter" => g.input.start = true,
                        "Escape" | "p" | "P" => g.input.pause = true,
                        "m" | "M" => g.toggle_mute(),
                        _ => {}
                    }
                },
            )?);
        }

        // Resize
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let window_clone = window.clone();
            listeners.push(EventListener::new(&window, "resize", move |_: Event| {
                game.borrow_mut()
                    .resize(&canvas_clone, window_clone.device_pixel_ratio());
            })?);
        }

        // Auto-pause: tab hidden or window blurred
        {
            let game = game.clone();
            let document_clone = document.clone();
            listeners.push(EventListener::new(
                &document,
                "visibilitychange",
                move |_: Event| {
                    if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                        game.borrow_mut().session.auto_pause();
                    }
                },
            )?);
        }
        {
            let game = game.clone();
            listeners.push(EventListener::new(&window, "blur", move |_: Event| {
                game.borrow_mut().session.auto_pause();
            })?);
        }

        // Page going away: tear down outside this callback
        listeners.push(EventListener::new(&window, "pagehide", move |_: Event| {
            wasm_bindgen_futures::spawn_local(async { shutdown() });
        })?);

        // Overlay buttons
        for id in ["start-btn", "restart-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                listeners.push(EventListener::new(&btn, "click", move |_: Event| {
                    game.borrow_mut().input.start = true;
                })?);
            }
        }
        if let Some(btn) = document.get_element_by_id("resume-btn") {
            let game = game.clone();
            listeners.push(EventListener::new(&btn, "click", move |_: Event| {
                game.borrow_mut().input.pause = true;
            })?);
        }
        if let Some(btn) = document.get_element_by_id("mute-btn") {
            let game = game.clone();
            listeners.push(EventListener::new(&btn, "click", move |_: Event| {
                game.borrow_mut().toggle_mute();
            })?);
        }

        // Shop
        for item in CATALOG.iter() {
            let id = item.id();
            if let Some(btn) = document.get_element_by_id(&shop_button_id(id)) {
                let game = game.clone();
                listeners.push(EventListener::new(&btn, "click", move |_: Event| {
                    wasm_bindgen_futures::spawn_local(buy(game.clone(), id));
                })?);
            }
        }

        log::info!("Attached {} listeners", listeners.len());
        Ok(listeners)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Stop the game and release every browser callback
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn stop() {
    wasm_game::shutdown();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Pulse (native) starting...");
    log::info!("Rendering needs a browser - run with `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let frames = args.next().and_then(|s| s.parse().ok()).unwrap_or(60 * 60 * 5);

    let summary = headless::soak(seed, frames);
    println!(
        "Seed {}: {} frames, {} runs, best {}, leaderboard {} entries, total {}",
        seed,
        frames,
        summary.runs,
        summary.best,
        summary.leaderboard_len,
        summary.total_score
    );
}

/// Scripted autopilot for soak testing the simulation without a browser
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use neon_pulse::Session;
    use neon_pulse::persistence::{MemoryStore, PersistenceBridge};
    use neon_pulse::sim::{GameEvent, GameStatus, ParticleKind, TickInput, Viewport};

    pub struct Summary {
        pub runs: u32,
        pub best: u64,
        pub leaderboard_len: usize,
        pub total_score: u64,
    }

    /// Steer towards the nearest energy ball, away from the nearest hazard
    fn steer(session: &Session<MemoryStore>) -> Vec2 {
        let state = session.state();
        let player = state.player.pos;
        let nearest = |kind: ParticleKind| {
            state
                .particles
                .iter()
                .filter(|p| p.kind == kind)
                .min_by(|a, b| {
                    a.pos
                        .distance_squared(player)
                        .total_cmp(&b.pos.distance_squared(player))
                })
        };

        let mut target = player;
        if let Some(energy) = nearest(ParticleKind::Energy) {
            target += (energy.pos - player).clamp_length_max(8.0);
        }
        if let Some(hazard) = nearest(ParticleKind::Hazard) {
            let away = player - hazard.pos;
            if away.length() < 80.0 {
                target += away.normalize_or_zero() * 12.0;
            }
        }
        target
    }

    pub fn soak(seed: u64, frames: u32) -> Summary {
        let viewport = Viewport::new(800.0, 600.0);
        let mut session = Session::new(PersistenceBridge::new(MemoryStore::new()), viewport, seed);
        let mut runs = 0;

        for frame in 0..frames {
            let input = TickInput {
                start: session.status() != GameStatus::Playing,
                ..Default::default()
            };
            let target = steer(&session);
            session.pointer_moved(target);

            let now_ms = frame as f64 * 1000.0 / 60.0;
            for event in session.frame(&input, now_ms) {
                match event {
                    GameEvent::Start => runs += 1,
                    GameEvent::Hit => log::debug!(
                        "Run {} ended at frame {} with score {}",
                        runs,
                        frame,
                        session.state().run.score
                    ),
                    _ => {}
                }
            }
        }

        let board = session.leaderboard();
        Summary {
            runs,
            best: session.high_score(),
            leaderboard_len: board.len(),
            total_score: board.total_score,
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
