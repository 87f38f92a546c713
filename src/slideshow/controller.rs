//! Slideshow controller loop
//!
//! Each iteration: honour a pending reload, rebuild the asset list from the
//! current config snapshot, drain every queued gesture, then either idle
//! (paused, menu open, nothing to show) or show the current card and dwell
//! for its interval. A gesture that changes what is on screen ends the
//! dwell early without advancing.

use super::state::{Phase, SlideshowState, Transition};
use crate::config::{DisplayConfig, SharedConfig, MENU_CARD};
use crate::display::{AssetStore, Blitter};
use crate::input::{ClassifiedEvent, GestureKind};
use log::{debug, error, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep; bounds shutdown latency
const TICK: Duration = Duration::from_millis(100);

/// Regenerates every card asset on demand
pub trait AssetRenderer {
    fn render_all(&mut self, config: &DisplayConfig) -> crate::Result<()>;
}

/// One entry of the live rotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideAsset {
    pub card: String,
    pub raw: PathBuf,
}

/// Enabled cards, in configured order, whose raw asset exists
pub fn enabled_assets(config: &DisplayConfig, store: &AssetStore) -> Vec<SlideAsset> {
    config
        .enabled_cards()
        .map(|card| SlideAsset {
            card: card.to_string(),
            raw: store.raw_path(card),
        })
        .filter(|a| a.raw.is_file())
        .collect()
}

pub struct SlideshowController<B, R> {
    store: AssetStore,
    blitter: B,
    renderer: R,
    config: SharedConfig,
    events: Receiver<ClassifiedEvent>,
    running: Arc<AtomicBool>,
    state: SlideshowState,
    /// Raw file last blitted for the rotation, if still valid
    on_screen: Option<PathBuf>,
}

impl<B: Blitter, R: AssetRenderer> SlideshowController<B, R> {
    pub fn new(
        store: AssetStore,
        blitter: B,
        renderer: R,
        config: SharedConfig,
        events: Receiver<ClassifiedEvent>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            blitter,
            renderer,
            config,
            events,
            running,
            state: SlideshowState::new(),
            on_screen: None,
        }
    }

    pub fn state(&self) -> &SlideshowState {
        &self.state
    }

    pub fn blitter(&self) -> &B {
        &self.blitter
    }

    /// Render everything once, then loop until the running flag clears
    pub fn run(mut self) {
        let config = self.config.snapshot();
        if let Err(e) = self.renderer.render_all(&config) {
            error!("Initial render failed: {}", e);
        }
        info!("Slideshow started");
        while self.running.load(Ordering::SeqCst) {
            self.step();
        }
        info!("Slideshow stopped");
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>>
    where
        B: Send + 'static,
        R: Send + 'static,
    {
        thread::Builder::new()
            .name("slideshow".into())
            .spawn(move || self.run())
    }

    /// One loop iteration
    pub fn step(&mut self) {
        if self.config.take_reload() {
            info!("Configuration changed, re-rendering cards");
            if let Err(e) = self.renderer.render_all(&self.config.snapshot()) {
                error!("Re-render failed: {}", e);
            }
            self.on_screen = None;
        }

        let config = self.config.snapshot();
        let assets = enabled_assets(&config, &self.store);

        let pending: Vec<ClassifiedEvent> = self.events.try_iter().collect();
        for event in &pending {
            self.handle(event, &assets);
        }

        match self.state.phase(assets.len()) {
            Phase::Idle => {
                warn!(
                    "No enabled assets in {}, retrying in {}s",
                    self.store.dir().display(),
                    config.default_interval
                );
                self.sleep(config.default_interval());
            }
            Phase::Paused | Phase::MenuOpen => self.wait_for_event(TICK, &assets),
            Phase::ShowingCard => {
                // A card rendered earlier in the order can shift the index
                // without a reload, so compare paths rather than trust a flag
                let current = self.state.current(assets.len()).map(|i| &assets[i].raw);
                if current != self.on_screen.as_ref() {
                    self.show_current(&assets);
                }
                self.dwell(&config, &assets);
            }
        }
    }

    fn handle(&mut self, event: &ClassifiedEvent, assets: &[SlideAsset]) -> Transition {
        let transition = self.state.apply(event, assets.len());
        debug!("{} -> {:?}", event, transition);
        match transition {
            Transition::Navigate | Transition::CloseMenu => self.show_current(assets),
            Transition::OpenMenu => self.show_menu(),
            Transition::Pause(true) => info!("Slideshow paused"),
            Transition::Pause(false) => info!("Slideshow resumed"),
            Transition::None => {
                if matches!(event.kind, GestureKind::SwipeUp | GestureKind::SwipeDown) {
                    debug!("Vertical swipe ignored");
                }
            }
        }
        transition
    }

    fn show_current(&mut self, assets: &[SlideAsset]) {
        if let Some(i) = self.state.current(assets.len()) {
            debug!("Showing {}", assets[i].card);
            self.blit(&assets[i].raw);
            self.on_screen = Some(assets[i].raw.clone());
        }
    }

    fn show_menu(&mut self) {
        let menu = self.store.raw_path(MENU_CARD);
        if menu.is_file() {
            self.blit(&menu);
        } else {
            debug!("No menu asset at {}", menu.display());
        }
    }

    fn blit(&mut self, raw: &Path) {
        if let Err(e) = self.blitter.blit(raw) {
            error!("Blit failed: {}", e);
        }
    }

    /// Show the current card for its interval, then advance
    fn dwell(&mut self, config: &DisplayConfig, assets: &[SlideAsset]) {
        let interval = self
            .state
            .current(assets.len())
            .map(|i| config.interval_for(&assets[i].card))
            .unwrap_or_else(|| config.default_interval());
        let deadline = Instant::now() + interval;

        loop {
            if !self.running.load(Ordering::SeqCst) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.events.recv_timeout((deadline - now).min(TICK)) {
                Ok(event) => {
                    if self.handle(&event, assets).interrupts() {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep((deadline - now).min(TICK)),
            }
        }

        self.state.advance(assets.len());
        self.on_screen = None;
    }

    fn wait_for_event(&mut self, timeout: Duration, assets: &[SlideAsset]) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.handle(&event, assets);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => thread::sleep(timeout),
        }
    }

    fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(TICK));
        }
    }
}
