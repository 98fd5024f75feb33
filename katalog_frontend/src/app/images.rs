use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::mpsc::Sender;

use eframe::egui::{self, ColorImage, TextureHandle};
use log::error;

use super::messages::AppMessage;
use super::tasks;

const MAX_CONCURRENT_DOWNLOADS: usize = 4;

#[derive(Clone)]
pub struct LoadedImage {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

/// Avatars and posters keyed by URL. Downloads run in the background, a few
/// at a time; textures are created on the UI thread when first drawn.
pub struct ImageCache {
    tx: Sender<AppMessage>,
    textures: HashMap<String, TextureHandle>,
    pending: HashMap<String, LoadedImage>,
    loading: HashSet<String>,
    errors: HashMap<String, String>,
    queue: VecDeque<String>,
    active: usize,
}

impl ImageCache {
    pub fn new(tx: Sender<AppMessage>) -> Self {
        Self {
            tx,
            textures: HashMap::new(),
            pending: HashMap::new(),
            loading: HashSet::new(),
            errors: HashMap::new(),
            queue: VecDeque::new(),
            active: 0,
        }
    }

    /// Texture for `url`, or None while it is still downloading. Failed URLs
    /// are not retried.
    pub fn texture(&mut self, ctx: &egui::Context, url: &str) -> Option<TextureHandle> {
        if let Some(tex) = self.textures.get(url) {
            return Some(tex.clone());
        }
        if let Some(image) = self.pending.remove(url) {
            let color = ColorImage::from_rgba_unmultiplied(image.size, &image.pixels);
            let tex = ctx.load_texture(url, color, egui::TextureOptions::default());
            self.textures.insert(url.to_string(), tex.clone());
            return Some(tex);
        }
        if !self.errors.contains_key(url) {
            self.enqueue(url);
        }
        None
    }

    pub fn apply(&mut self, url: String, result: Result<LoadedImage, String>) {
        self.loading.remove(&url);
        match result {
            Ok(image) => {
                self.pending.insert(url, image);
            }
            Err(e) => {
                error!("Failed to load image {}: {}", url, e);
                self.errors.insert(url, e);
            }
        }
        if self.active > 0 {
            self.active -= 1;
        }
        self.pump();
    }

    fn enqueue(&mut self, url: &str) {
        if !self.loading.insert(url.to_string()) {
            return;
        }
        self.queue.push_back(url.to_string());
        self.pump();
    }

    fn pump(&mut self) {
        while self.active < MAX_CONCURRENT_DOWNLOADS {
            let Some(url) = self.queue.pop_front() else {
                break;
            };
            self.active += 1;
            tasks::download_image(self.tx.clone(), url);
        }
    }
}
