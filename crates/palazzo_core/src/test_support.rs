//! In-memory port implementations shared by the unit tests.

use crate::domain::{DesignMode, FurnitureItem, ImageData, PartialItem};
use crate::intent::Intent;
use crate::orchestrator::DesignServices;
use crate::ports::{
    CaptionService, ImageGenerationService, IntentClassificationService, ItemExtractionService,
    PortError, PortResult, ProductPhotoService, SessionObserver,
};
use crate::session::SessionSnapshot;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub fn partial(name: &str) -> PartialItem {
    PartialItem {
        name: name.to_string(),
        price_estimate: "$100 - $200".to_string(),
        color: "Natural Oak".to_string(),
        description: format!("A {name}."),
        dimensions: "W: 10\" x D: 10\" x H: 10\"".to_string(),
        materials: vec!["Oak wood".to_string()],
        style_tags: vec!["Modern".to_string()],
    }
}

pub fn furniture(name: &str) -> FurnitureItem {
    FurnitureItem::from_partial(format!("test-{name}"), partial(name), None)
}

fn text_image(text: String) -> ImageData {
    ImageData::new(text.into_bytes(), "image/png")
}

//=========================================================================================
// Image generation
//=========================================================================================

/// Lets a test observe that a call started and decide when it returns.
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeImages {
    calls: Mutex<Vec<&'static str>>,
    fail_next: AtomicBool,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeImages {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Holds the next call until `release` is notified.
    pub fn hold_next(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn respond(&self, call: &'static str, image: ImageData) -> PortResult<ImageData> {
        self.calls.lock().unwrap().push(call);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PortError::GenerationFailed(
                "API did not return a generated image.".to_string(),
            ));
        }
        Ok(image)
    }
}

#[async_trait]
impl ImageGenerationService for FakeImages {
    async fn stage_image(
        &self,
        _source: &ImageData,
        style: &str,
        prompt: &str,
    ) -> PortResult<ImageData> {
        self.respond("stage", text_image(format!("staged:{style}:{prompt}")))
            .await
    }

    async fn restyle_content(
        &self,
        _source: &ImageData,
        style: &str,
        prompt: &str,
    ) -> PortResult<ImageData> {
        self.respond("restyle", text_image(format!("restyled:{style}:{prompt}")))
            .await
    }

    async fn edit_image(
        &self,
        _current: &ImageData,
        instruction: &str,
        mode: DesignMode,
    ) -> PortResult<ImageData> {
        self.respond(
            "edit",
            text_image(format!("edited:{}:{instruction}", mode.as_str())),
        )
        .await
    }
}

//=========================================================================================
// Item extraction and product photos
//=========================================================================================

#[derive(Default)]
pub struct FakeExtractor {
    items: Mutex<Vec<PartialItem>>,
    fail_next: AtomicBool,
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn returning(items: Vec<PartialItem>) -> Self {
        let extractor = Self::default();
        extractor.set_items(items);
        extractor
    }

    pub fn failing() -> Self {
        let extractor = Self::default();
        extractor.fail_next();
        extractor
    }

    pub fn set_items(&self, items: Vec<PartialItem>) {
        *self.items.lock().unwrap() = items;
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemExtractionService for FakeExtractor {
    async fn extract_items(&self, _image: &ImageData) -> PortResult<Vec<PartialItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PortError::ParseFailed(
                "AI response for furniture list was not an array.".to_string(),
            ));
        }
        Ok(self.items.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakePhotos {
    failing: HashSet<String>,
    delays_ms: HashMap<String, u64>,
    completed: Mutex<Vec<String>>,
}

impl FakePhotos {
    pub fn failing_for(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn delayed(mut self, name: &str, millis: u64) -> Self {
        self.delays_ms.insert(name.to_string(), millis);
        self
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductPhotoService for FakePhotos {
    async fn synthesize_item_image(&self, item_name: &str) -> Option<ImageData> {
        if let Some(millis) = self.delays_ms.get(item_name) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }
        self.completed.lock().unwrap().push(item_name.to_string());
        if self.failing.contains(item_name) {
            return None;
        }
        Some(ImageData::new(item_name.as_bytes().to_vec(), "image/jpeg"))
    }
}

//=========================================================================================
// Captions and intent classification
//=========================================================================================

#[derive(Default)]
pub struct FakeCaptions;

#[async_trait]
impl CaptionService for FakeCaptions {
    async fn generate_caption(
        &self,
        image: &ImageData,
        style: &str,
        _prompt: &str,
    ) -> PortResult<String> {
        Ok(format!(
            "caption for {} in {style}",
            String::from_utf8_lossy(&image.bytes)
        ))
    }

    async fn rewrite_caption(&self, image: &ImageData, instruction: &str) -> PortResult<String> {
        Ok(format!(
            "rewritten for {} with {instruction}",
            String::from_utf8_lossy(&image.bytes)
        ))
    }

    async fn recaption_edit(&self, edited: &ImageData, instruction: &str) -> PortResult<String> {
        Ok(format!(
            "recaptioned {} after {instruction}",
            String::from_utf8_lossy(&edited.bytes)
        ))
    }
}

/// Answers queued results in order, then `Image` once the queue is empty.
#[derive(Default)]
pub struct FakeIntents {
    answers: Mutex<VecDeque<PortResult<Intent>>>,
    calls: AtomicUsize,
}

impl FakeIntents {
    pub fn answer(&self, answer: PortResult<Intent>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassificationService for FakeIntents {
    async fn classify_intent(&self, _text: &str) -> PortResult<Intent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Intent::Image))
    }
}

//=========================================================================================
// Wiring
//=========================================================================================

#[derive(Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<SessionSnapshot>>,
}

impl RecordingObserver {
    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn session_changed(&self, snapshot: &SessionSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}

#[derive(Default)]
pub struct Fakes {
    pub images: Arc<FakeImages>,
    pub extractor: Arc<FakeExtractor>,
    pub photos: Arc<FakePhotos>,
    pub captions: Arc<FakeCaptions>,
    pub intents: Arc<FakeIntents>,
}

impl Fakes {
    pub fn with_items(self, items: Vec<PartialItem>) -> Self {
        self.extractor.set_items(items);
        self
    }

    pub fn services(&self) -> DesignServices {
        DesignServices {
            images: self.images.clone(),
            extractor: self.extractor.clone(),
            photos: self.photos.clone(),
            captions: self.captions.clone(),
            intents: self.intents.clone(),
        }
    }
}
