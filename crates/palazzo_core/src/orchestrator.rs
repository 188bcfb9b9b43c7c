//! crates/palazzo_core/src/orchestrator.rs
//!
//! Drives the session through its transitions and sequences the calls to the
//! generation ports. The session lock is only held for synchronous updates,
//! never across an await, so a reset can land while a request is in flight.

use crate::codec::{self, UploadedFile, EXPORT_FILE_NAME};
use crate::domain::{DesignFeedback, DesignMode, ImageData, FEEDBACK_REASONS};
use crate::intent::{Intent, IntentRouter};
use crate::pipeline::FurniturePipeline;
use crate::ports::{
    CaptionService, ImageGenerationService, IntentClassificationService, ItemExtractionService,
    ProductPhotoService, SessionObserver,
};
use crate::session::{
    ChatEdit, ChatTicket, DesignError, DesignResult, GenerationTicket, Session, SessionSnapshot,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{error, info, warn};

pub const STAGING_ROOM: &str = "Staging your room...";
pub const IDENTIFYING_FURNITURE: &str = "Identifying furniture...";
pub const CREATING_PRODUCT_PHOTOS: &str = "Creating product photos...";
pub const GENERATING_CONTENT: &str = "Generating your content...";
pub const APPLYING_CHANGES: &str = "Applying your changes...";
pub const REIDENTIFYING_FURNITURE: &str = "Re-identifying furniture...";
pub const UPDATING_PRODUCT_PHOTOS: &str = "Updating product photos...";
pub const REWRITING_POST: &str = "Rewriting your post...";

/// The set of ports a design session needs.
#[derive(Clone)]
pub struct DesignServices {
    pub images: Arc<dyn ImageGenerationService>,
    pub extractor: Arc<dyn ItemExtractionService>,
    pub photos: Arc<dyn ProductPhotoService>,
    pub captions: Arc<dyn CaptionService>,
    pub intents: Arc<dyn IntentClassificationService>,
}

/// The current design ready to be saved as a local file.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub file_name: &'static str,
    pub image: ImageData,
}

pub struct DesignOrchestrator {
    images: Arc<dyn ImageGenerationService>,
    captions: Arc<dyn CaptionService>,
    pipeline: FurniturePipeline,
    router: IntentRouter,
    session: Mutex<Session>,
    observer: Arc<dyn SessionObserver>,
}

impl DesignOrchestrator {
    pub fn new(
        services: DesignServices,
        mode: DesignMode,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            images: services.images,
            captions: services.captions,
            pipeline: FurniturePipeline::new(services.extractor, services.photos),
            router: IntentRouter::new(services.intents),
            session: Mutex::new(Session::new(mode)),
            observer,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    //=====================================================================================
    // Transitions
    //=====================================================================================

    /// Validates and stores the source photo. A rejected file leaves the
    /// session exactly as it was.
    pub fn upload(&self, file: UploadedFile) -> Result<SessionSnapshot, DesignError> {
        let image = codec::decode(file)?;
        let size = image.len();
        self.update(|session| session.accept_upload(image))?;
        info!("Accepted a {} byte upload.", size);
        Ok(self.snapshot())
    }

    /// Runs the initial generation for the uploaded photo.
    ///
    /// Service failures do not surface as `Err`: they move the session to its
    /// error phase, which the returned snapshot reflects.
    pub async fn generate(&self, style: &str, prompt: &str) -> Result<SessionSnapshot, DesignError> {
        let ticket = self.update(|session| session.begin_generation())?;
        let start = Instant::now();
        info!(
            "Generating {} design in style '{}'.",
            ticket.mode.as_str(),
            style
        );

        let result = match ticket.mode {
            DesignMode::Interior => self.run_interior_generation(&ticket, style, prompt).await,
            DesignMode::Content => self.run_content_generation(&ticket, style, prompt).await,
        };

        match result {
            Ok(design) => {
                self.update(|session| session.complete_generation(ticket.epoch, prompt, design))?;
                info!("Initial generation finished in {:?}.", start.elapsed());
            }
            Err(DesignError::Superseded) => return Err(self.discard(ticket.epoch)),
            Err(e) => {
                error!("Failed to generate initial design: {}", e);
                self.update(|session| session.fail_generation(ticket.epoch, &e.detail()))
                    .map_err(|_| self.discard(ticket.epoch))?;
            }
        }
        Ok(self.snapshot())
    }

    /// Applies a chat message to the current design.
    ///
    /// Blank messages are ignored. Failures are answered with an apology and
    /// never end the session.
    pub async fn send_message(&self, text: &str) -> Result<SessionSnapshot, DesignError> {
        let Some(ticket) = self.update(|session| session.begin_chat(text))? else {
            return Ok(self.snapshot());
        };
        let start = Instant::now();

        let edit = match ticket.mode {
            DesignMode::Interior => self.run_interior_edit(&ticket).await,
            DesignMode::Content => self.run_content_edit(&ticket).await,
        };

        match edit {
            Ok(edit) => {
                self.update(|session| session.complete_chat(ticket.epoch, edit))?;
                info!("Chat edit applied in {:?}.", start.elapsed());
            }
            Err(DesignError::Superseded) => return Err(self.discard(ticket.epoch)),
            Err(e) => {
                warn!("Failed to apply chat edit: {}", e);
                self.update(|session| session.fail_chat(ticket.epoch))
                    .map_err(|_| self.discard(ticket.epoch))?;
            }
        }
        Ok(self.snapshot())
    }

    /// Starts over in the current mode.
    pub fn reset(&self) -> SessionSnapshot {
        let mut session = self.lock();
        let mode = session.mode();
        session.reset(mode);
        info!("Session reset.");
        self.publish(&session)
    }

    /// Switching to a different mode always starts over; picking the current
    /// mode changes nothing.
    pub fn switch_mode(&self, mode: DesignMode) -> SessionSnapshot {
        let mut session = self.lock();
        if session.mode() == mode {
            return session.snapshot();
        }
        session.reset(mode);
        info!("Switched to {} mode.", mode.as_str());
        self.publish(&session)
    }

    pub fn export(&self) -> Option<ExportedImage> {
        self.lock().current_image().cloned().map(|image| ExportedImage {
            file_name: EXPORT_FILE_NAME,
            image,
        })
    }

    /// Feedback is only recorded in the logs.
    pub fn record_feedback(&self, feedback: &DesignFeedback) {
        let session_id = self.lock().id();
        if feedback.satisfied {
            info!(%session_id, "User is satisfied with the design.");
            return;
        }
        let (known, custom): (Vec<&String>, Vec<&String>) = feedback
            .reasons
            .iter()
            .partition(|reason| FEEDBACK_REASONS.contains(&reason.as_str()));
        warn!(
            %session_id,
            reasons = ?known,
            unknown_reasons = ?custom,
            other = feedback.other.as_deref().unwrap_or(""),
            "User is not satisfied with the design."
        );
    }

    //=====================================================================================
    // Workflows
    //=====================================================================================

    async fn run_interior_generation(
        &self,
        ticket: &GenerationTicket,
        style: &str,
        prompt: &str,
    ) -> Result<DesignResult, DesignError> {
        self.progress(ticket.epoch, STAGING_ROOM)?;
        let image = self.images.stage_image(&ticket.source, style, prompt).await?;

        self.progress(ticket.epoch, IDENTIFYING_FURNITURE)?;
        let items = self
            .pipeline
            .extract_full_list_with(&image, |_| {
                self.progress(ticket.epoch, CREATING_PRODUCT_PHOTOS)
            })
            .await?;

        Ok(DesignResult {
            image,
            items,
            caption: None,
        })
    }

    async fn run_content_generation(
        &self,
        ticket: &GenerationTicket,
        style: &str,
        prompt: &str,
    ) -> Result<DesignResult, DesignError> {
        self.progress(ticket.epoch, GENERATING_CONTENT)?;
        let image = self
            .images
            .restyle_content(&ticket.source, style, prompt)
            .await?;
        self.ensure_live(ticket.epoch)?;
        let caption = self.captions.generate_caption(&image, style, prompt).await?;

        Ok(DesignResult {
            image,
            items: Vec::new(),
            caption: Some(caption),
        })
    }

    async fn run_interior_edit(&self, ticket: &ChatTicket) -> Result<ChatEdit, DesignError> {
        self.progress(ticket.epoch, APPLYING_CHANGES)?;
        let image = self
            .images
            .edit_image(&ticket.current, &ticket.instruction, DesignMode::Interior)
            .await?;

        self.progress(ticket.epoch, REIDENTIFYING_FURNITURE)?;
        let items = self
            .pipeline
            .extract_full_list_with(&image, |_| {
                self.progress(ticket.epoch, UPDATING_PRODUCT_PHOTOS)
            })
            .await?;

        Ok(ChatEdit::Image {
            image,
            items,
            caption: None,
        })
    }

    async fn run_content_edit(&self, ticket: &ChatTicket) -> Result<ChatEdit, DesignError> {
        match self.router.route(&ticket.instruction).await? {
            Intent::Text => {
                self.progress(ticket.epoch, REWRITING_POST)?;
                let caption = self
                    .captions
                    .rewrite_caption(&ticket.current, &ticket.instruction)
                    .await?;
                Ok(ChatEdit::CaptionOnly(caption))
            }
            Intent::Image => {
                self.progress(ticket.epoch, APPLYING_CHANGES)?;
                let image = self
                    .images
                    .edit_image(&ticket.current, &ticket.instruction, DesignMode::Content)
                    .await?;
                self.ensure_live(ticket.epoch)?;
                let caption = self
                    .captions
                    .recaption_edit(&image, &ticket.instruction)
                    .await?;
                Ok(ChatEdit::Image {
                    image,
                    items: Vec::new(),
                    caption: Some(caption),
                })
            }
        }
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) -> SessionSnapshot {
        let snapshot = session.snapshot();
        self.observer.session_changed(&snapshot);
        snapshot
    }

    /// Applies a transition and publishes the new state when it succeeds.
    fn update<T>(
        &self,
        transition: impl FnOnce(&mut Session) -> Result<T, DesignError>,
    ) -> Result<T, DesignError> {
        let mut session = self.lock();
        let out = transition(&mut session)?;
        self.publish(&session);
        Ok(out)
    }

    fn progress(&self, epoch: u64, label: &'static str) -> Result<(), DesignError> {
        self.update(|session| session.set_activity(epoch, label))
    }

    /// Stops a workflow early once its session has moved on, so no further
    /// requests are issued on its behalf.
    fn ensure_live(&self, epoch: u64) -> Result<(), DesignError> {
        if self.lock().epoch() == epoch {
            Ok(())
        } else {
            Err(DesignError::Superseded)
        }
    }

    fn discard(&self, epoch: u64) -> DesignError {
        info!("Discarding a late result for session epoch {}.", epoch);
        DesignError::Superseded
    }
}
