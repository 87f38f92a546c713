//! Render → save → blit against a regular file standing in for /dev/fb1

use pidisplay::cards::CardDeck;
use pidisplay::config::{DisplayConfig, SharedConfig};
use pidisplay::display::{codec, AssetStore, Blitter, FramebufferWriter, Panel};
use pidisplay::slideshow::{AssetRenderer, SlideshowController};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn blank_device(path: &Path, panel: Panel) {
    fs::write(path, vec![0u8; panel.frame_len() as usize]).unwrap();
}

fn deck(store: AssetStore, state: &Path) -> CardDeck {
    CardDeck::standard(
        store,
        state,
        Duration::from_secs(180),
        Duration::from_secs(1800),
    )
}

#[test]
fn test_rendered_card_reaches_device() {
    let dir = tempdir().unwrap();
    let panel = Panel::DEFAULT;
    let fb_path = dir.path().join("fb1");
    blank_device(&fb_path, panel);

    let store = AssetStore::new(dir.path().join("images"), panel, false);
    let mut cards = deck(store.clone(), &dir.path().join("state"));
    cards.render_all(&DisplayConfig::default()).unwrap();

    let raw = store.raw_path("btc");
    let mut fb = FramebufferWriter::new(&fb_path, panel);
    fb.blit(&raw).unwrap();

    let on_device = fs::read(&fb_path).unwrap();
    assert_eq!(on_device, fs::read(&raw).unwrap());

    // The raw frame is the PNG re-encoded
    let png = image::open(store.png_path("btc")).unwrap().to_rgb8();
    assert_eq!(codec::encode(&png, false), on_device);
}

#[test]
fn test_truncated_frame_leaves_device_alone() {
    let dir = tempdir().unwrap();
    let panel = Panel::DEFAULT;
    let fb_path = dir.path().join("fb1");
    blank_device(&fb_path, panel);

    let raw = dir.path().join("short.raw");
    fs::write(&raw, vec![0xFFu8; 1000]).unwrap();
    let mut fb = FramebufferWriter::new(&fb_path, panel);
    assert!(fb.blit(&raw).is_err());
    assert!(fs::read(&fb_path).unwrap().iter().all(|b| *b == 0));
}

#[test]
fn test_slideshow_shows_first_enabled_card() {
    let dir = tempdir().unwrap();
    let panel = Panel::DEFAULT;
    let fb_path = dir.path().join("fb1");
    blank_device(&fb_path, panel);

    let store = AssetStore::new(dir.path().join("images"), panel, false);
    let mut display = DisplayConfig::default();
    display.order = vec!["weather".into(), "clock".into()];
    let shared = SharedConfig::new(display);
    let running = Arc::new(AtomicBool::new(true));
    let (_tx, rx) = mpsc::channel();

    let controller = SlideshowController::new(
        store.clone(),
        FramebufferWriter::new(&fb_path, panel),
        deck(store.clone(), &dir.path().join("state")),
        shared,
        rx,
        Arc::clone(&running),
    );
    let handle = controller.spawn().unwrap();

    let raw = store.raw_path("weather");
    for _ in 0..100 {
        if raw.exists() && fs::read(&fb_path).unwrap() == fs::read(&raw).unwrap() {
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }
    running.store(false, Ordering::SeqCst);
    handle.join().unwrap();

    assert_eq!(fs::read(&fb_path).unwrap(), fs::read(&raw).unwrap());
}
