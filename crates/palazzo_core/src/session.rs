//! crates/palazzo_core/src/session.rs
//!
//! The design session and its state machine. Every mutation goes through one
//! of the transition methods below; long-running work is split into a
//! `begin_*` step that hands out a ticket and a `complete_*`/`fail_*` step that
//! only applies if the ticket's epoch still matches the live session.

use crate::codec::CodecError;
use crate::domain::{DesignMode, FurnitureItem, ImageData, Message};
use crate::ports::PortError;
use std::fmt;
use uuid::Uuid;

pub const INITIAL_DESIGN_REPLY: &str =
    "Here's the initial design based on your selections! Use the chat to make any changes.";
pub const EDIT_APPLIED_REPLY: &str = "Here you go! Let me know if you'd like any other changes.";
pub const EDIT_FAILED_REPLY: &str =
    "I'm sorry, I wasn't able to make that change. Please try a different prompt.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    ImageUploaded,
    Generating,
    ResultsReady,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initial => "initial",
            Phase::ImageUploaded => "image_uploaded",
            Phase::Generating => "generating",
            Phase::ResultsReady => "results_ready",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DesignError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("{0}")]
    Port(#[from] PortError),
    #[error("Cannot {action} while the session is {phase}")]
    InvalidTransition { action: &'static str, phase: Phase },
    /// The session was reset or switched mode while this work was in flight.
    #[error("The session changed before this result arrived")]
    Superseded,
}

impl DesignError {
    /// The reason to show the user. Port failures drop their variant prefix
    /// so the message reads as a single sentence after the phase prefix.
    pub fn detail(&self) -> String {
        match self {
            DesignError::Port(e) => e.detail().to_string(),
            other => other.to_string(),
        }
    }
}

/// Inputs captured when a generation starts.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub epoch: u64,
    pub mode: DesignMode,
    pub source: ImageData,
}

/// Inputs captured when a chat edit starts.
#[derive(Debug, Clone)]
pub struct ChatTicket {
    pub epoch: u64,
    pub mode: DesignMode,
    pub current: ImageData,
    pub instruction: String,
}

/// The artifacts of a successful initial generation.
#[derive(Debug, Clone)]
pub struct DesignResult {
    pub image: ImageData,
    pub items: Vec<FurnitureItem>,
    pub caption: Option<String>,
}

/// The artifacts of a successful chat edit.
#[derive(Debug, Clone)]
pub enum ChatEdit {
    /// A new image, with the interior item list or the content caption that
    /// belongs to it.
    Image {
        image: ImageData,
        items: Vec<FurnitureItem>,
        caption: Option<String>,
    },
    /// Only the caption changed.
    CaptionOnly(String),
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    epoch: u64,
    mode: DesignMode,
    phase: Phase,
    source_image: Option<ImageData>,
    current_image: Option<ImageData>,
    conversation: Vec<Message>,
    items: Vec<FurnitureItem>,
    social_caption: Option<String>,
    last_error: Option<String>,
    activity: Option<&'static str>,
}

/// An immutable view of a session for the rendering layer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub epoch: u64,
    pub mode: DesignMode,
    pub phase: Phase,
    pub source_image: Option<ImageData>,
    /// The image to show. While a chat edit runs this is the last good result,
    /// rendered under the busy indicator; during the first generation it is absent.
    pub display_image: Option<ImageData>,
    pub conversation: Vec<Message>,
    pub items: Vec<FurnitureItem>,
    pub social_caption: Option<String>,
    pub last_error: Option<String>,
    pub activity: Option<&'static str>,
}

impl SessionSnapshot {
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Generating
    }
}

impl Session {
    pub fn new(mode: DesignMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch: 0,
            mode,
            phase: Phase::Initial,
            source_image: None,
            current_image: None,
            conversation: Vec::new(),
            items: Vec::new(),
            social_caption: None,
            last_error: None,
            activity: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn mode(&self) -> DesignMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_image(&self) -> Option<&ImageData> {
        self.current_image.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            epoch: self.epoch,
            mode: self.mode,
            phase: self.phase,
            source_image: self.source_image.clone(),
            display_image: self.current_image.clone(),
            conversation: self.conversation.clone(),
            items: self.items.clone(),
            social_caption: self.social_caption.clone(),
            last_error: self.last_error.clone(),
            activity: self.activity,
        }
    }

    /// Discards everything and starts an empty session in `mode`.
    /// The epoch moves on so in-flight results for the old session are dropped.
    pub fn reset(&mut self, mode: DesignMode) {
        let epoch = self.epoch + 1;
        *self = Session::new(mode);
        self.epoch = epoch;
    }

    pub fn accept_upload(&mut self, image: ImageData) -> Result<(), DesignError> {
        match self.phase {
            Phase::Initial | Phase::ImageUploaded | Phase::Error => {
                self.source_image = Some(image);
                self.current_image = None;
                self.last_error = None;
                self.phase = Phase::ImageUploaded;
                Ok(())
            }
            phase => Err(DesignError::InvalidTransition {
                action: "upload an image",
                phase,
            }),
        }
    }

    pub fn begin_generation(&mut self) -> Result<GenerationTicket, DesignError> {
        let source = match (self.phase, &self.source_image) {
            (Phase::ImageUploaded | Phase::Error, Some(source)) => source.clone(),
            (phase, _) => {
                return Err(DesignError::InvalidTransition {
                    action: "generate a design",
                    phase,
                })
            }
        };

        self.phase = Phase::Generating;
        self.current_image = None;
        self.items.clear();
        self.social_caption = None;
        self.conversation.clear();
        self.last_error = None;
        self.activity = None;

        Ok(GenerationTicket {
            epoch: self.epoch,
            mode: self.mode,
            source,
        })
    }

    pub fn complete_generation(
        &mut self,
        epoch: u64,
        prompt: &str,
        result: DesignResult,
    ) -> Result<(), DesignError> {
        self.ensure_current(epoch)?;

        self.current_image = Some(result.image);
        self.apply_artifacts(result.items, result.caption);

        if !prompt.trim().is_empty() {
            self.conversation.push(Message::user(prompt));
        }
        self.conversation.push(Message::assistant(INITIAL_DESIGN_REPLY));
        self.finish(Phase::ResultsReady);
        Ok(())
    }

    pub fn fail_generation(&mut self, epoch: u64, detail: &str) -> Result<(), DesignError> {
        self.ensure_current(epoch)?;
        let prefix = match self.mode {
            DesignMode::Interior => "Failed to generate design.",
            DesignMode::Content => "Failed to generate content.",
        };
        self.last_error = Some(format!("{prefix} {detail}"));
        self.current_image = None;
        self.finish(Phase::Error);
        Ok(())
    }

    /// Starts a chat edit. Returns `Ok(None)` when the message is blank or
    /// there is no image to edit yet; the session is left untouched then.
    pub fn begin_chat(&mut self, text: &str) -> Result<Option<ChatTicket>, DesignError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let Some(current) = self.current_image.clone() else {
            return Ok(None);
        };
        if self.phase != Phase::ResultsReady {
            return Err(DesignError::InvalidTransition {
                action: "send a message",
                phase: self.phase,
            });
        }

        self.conversation.push(Message::user(text));
        self.phase = Phase::Generating;
        self.activity = None;

        Ok(Some(ChatTicket {
            epoch: self.epoch,
            mode: self.mode,
            current,
            instruction: text.to_string(),
        }))
    }

    pub fn complete_chat(&mut self, epoch: u64, edit: ChatEdit) -> Result<(), DesignError> {
        self.ensure_current(epoch)?;
        match edit {
            ChatEdit::Image {
                image,
                items,
                caption,
            } => {
                self.current_image = Some(image);
                self.apply_artifacts(items, caption);
            }
            ChatEdit::CaptionOnly(caption) => {
                if self.mode == DesignMode::Content {
                    self.social_caption = Some(caption);
                }
            }
        }
        self.conversation.push(Message::assistant(EDIT_APPLIED_REPLY));
        self.finish(Phase::ResultsReady);
        Ok(())
    }

    /// A failed chat edit is never fatal: the prior artifacts stay and the
    /// assistant apologises.
    pub fn fail_chat(&mut self, epoch: u64) -> Result<(), DesignError> {
        self.ensure_current(epoch)?;
        self.conversation.push(Message::assistant(EDIT_FAILED_REPLY));
        self.finish(Phase::ResultsReady);
        Ok(())
    }

    /// Updates the progress label of the running work.
    pub fn set_activity(&mut self, epoch: u64, label: &'static str) -> Result<(), DesignError> {
        self.ensure_current(epoch)?;
        self.activity = Some(label);
        Ok(())
    }

    fn ensure_current(&self, epoch: u64) -> Result<(), DesignError> {
        if epoch == self.epoch && self.phase == Phase::Generating {
            Ok(())
        } else {
            Err(DesignError::Superseded)
        }
    }

    /// Items only exist in interior mode and captions only in content mode.
    fn apply_artifacts(&mut self, items: Vec<FurnitureItem>, caption: Option<String>) {
        match self.mode {
            DesignMode::Interior => {
                self.items = items;
                self.social_caption = None;
            }
            DesignMode::Content => {
                self.items.clear();
                if caption.is_some() {
                    self.social_caption = caption;
                }
            }
        }
    }

    fn finish(&mut self, phase: Phase) {
        self.phase = phase;
        self.activity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sender;
    use crate::test_support::furniture;

    fn image(tag: &str) -> ImageData {
        ImageData::new(tag.as_bytes().to_vec(), "image/jpeg")
    }

    fn ready_session(mode: DesignMode) -> Session {
        let mut session = Session::new(mode);
        session.accept_upload(image("source")).unwrap();
        let ticket = session.begin_generation().unwrap();
        session
            .complete_generation(
                ticket.epoch,
                "",
                DesignResult {
                    image: image("first"),
                    items: vec![furniture("Sofa")],
                    caption: Some("caption".to_string()),
                },
            )
            .unwrap();
        session
    }

    #[test]
    fn upload_moves_to_image_uploaded() {
        let mut session = Session::new(DesignMode::Interior);
        session.accept_upload(image("source")).unwrap();
        assert_eq!(session.phase(), Phase::ImageUploaded);
        assert!(session.snapshot().source_image.is_some());
        assert!(session.current_image().is_none());
    }

    #[test]
    fn generate_requires_an_upload() {
        let mut session = Session::new(DesignMode::Interior);
        let err = session.begin_generation().unwrap_err();
        assert!(matches!(
            err,
            DesignError::InvalidTransition {
                phase: Phase::Initial,
                ..
            }
        ));
    }

    #[test]
    fn successful_generation_echoes_prompt_and_acknowledges() {
        let mut session = Session::new(DesignMode::Interior);
        session.accept_upload(image("source")).unwrap();
        let ticket = session.begin_generation().unwrap();
        assert_eq!(session.phase(), Phase::Generating);
        assert!(session.snapshot().display_image.is_none());

        session
            .complete_generation(
                ticket.epoch,
                "cozy fireplace",
                DesignResult {
                    image: image("staged"),
                    items: vec![furniture("Sofa"), furniture("Lamp")],
                    caption: None,
                },
            )
            .unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::ResultsReady);
        assert_eq!(snapshot.display_image, Some(image("staged")));
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.conversation.len(), 2);
        assert_eq!(snapshot.conversation[0].sender, Sender::User);
        assert_eq!(snapshot.conversation[0].text, "cozy fireplace");
        assert_eq!(snapshot.conversation[1].text, INITIAL_DESIGN_REPLY);
    }

    #[test]
    fn blank_prompt_is_not_echoed() {
        let session = ready_session(DesignMode::Interior);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.conversation.len(), 1);
        assert_eq!(snapshot.conversation[0].sender, Sender::Assistant);
    }

    #[test]
    fn interior_results_never_carry_a_caption() {
        let session = ready_session(DesignMode::Interior);
        assert!(session.snapshot().social_caption.is_none());
    }

    #[test]
    fn content_results_never_carry_items() {
        let session = ready_session(DesignMode::Content);
        let snapshot = session.snapshot();
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.social_caption.as_deref(), Some("caption"));
    }

    #[test]
    fn failed_generation_is_a_dead_end_until_retry() {
        let mut session = Session::new(DesignMode::Content);
        session.accept_upload(image("source")).unwrap();
        let ticket = session.begin_generation().unwrap();
        session
            .fail_generation(ticket.epoch, "Generation failed: no image")
            .unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Error);
        assert_eq!(
            snapshot.last_error.as_deref(),
            Some("Failed to generate content. Generation failed: no image")
        );
        assert!(snapshot.display_image.is_none());

        // The source image survives, so the user can try again.
        assert!(session.begin_generation().is_ok());
    }

    #[test]
    fn blank_messages_are_no_ops() {
        let mut session = ready_session(DesignMode::Interior);
        let before = session.snapshot();
        assert!(session.begin_chat("").unwrap().is_none());
        assert!(session.begin_chat("   ").unwrap().is_none());
        let after = session.snapshot();
        assert_eq!(after.phase, Phase::ResultsReady);
        assert_eq!(after.conversation, before.conversation);
    }

    #[test]
    fn message_without_image_is_a_no_op() {
        let mut session = Session::new(DesignMode::Interior);
        session.accept_upload(image("source")).unwrap();
        assert!(session.begin_chat("add a plant").unwrap().is_none());
        assert_eq!(session.phase(), Phase::ImageUploaded);
        assert!(session.snapshot().conversation.is_empty());
    }

    #[test]
    fn chat_appends_user_message_before_the_result() {
        let mut session = ready_session(DesignMode::Interior);
        let ticket = session.begin_chat("add a plant").unwrap().unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Generating);
        assert_eq!(snapshot.conversation.last().unwrap().text, "add a plant");
        // The last good image stays visible under the busy indicator.
        assert_eq!(snapshot.display_image, Some(image("first")));
        assert_eq!(ticket.current, image("first"));
    }

    #[test]
    fn second_message_while_busy_is_rejected() {
        let mut session = ready_session(DesignMode::Interior);
        session.begin_chat("add a plant").unwrap();
        let err = session.begin_chat("and a rug").unwrap_err();
        assert!(matches!(
            err,
            DesignError::InvalidTransition {
                phase: Phase::Generating,
                ..
            }
        ));
    }

    #[test]
    fn failed_chat_keeps_prior_artifacts() {
        let mut session = ready_session(DesignMode::Interior);
        let before = session.snapshot();
        let ticket = session.begin_chat("add a plant").unwrap().unwrap();
        session.fail_chat(ticket.epoch).unwrap();

        let after = session.snapshot();
        assert_eq!(after.phase, Phase::ResultsReady);
        assert_eq!(after.display_image, before.display_image);
        assert_eq!(after.items, before.items);
        assert_eq!(after.conversation.len(), before.conversation.len() + 2);
        assert_eq!(after.conversation.last().unwrap().text, EDIT_FAILED_REPLY);
    }

    #[test]
    fn caption_only_edit_leaves_the_image() {
        let mut session = ready_session(DesignMode::Content);
        let ticket = session.begin_chat("make it funnier").unwrap().unwrap();
        session
            .complete_chat(ticket.epoch, ChatEdit::CaptionOnly("funnier".to_string()))
            .unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.display_image, Some(image("first")));
        assert_eq!(snapshot.social_caption.as_deref(), Some("funnier"));
        assert_eq!(snapshot.conversation.last().unwrap().text, EDIT_APPLIED_REPLY);
    }

    #[test]
    fn reset_clears_everything_from_every_phase() {
        let mut sessions = vec![
            Session::new(DesignMode::Interior),
            ready_session(DesignMode::Interior),
            ready_session(DesignMode::Content),
        ];
        let mut uploaded = Session::new(DesignMode::Interior);
        uploaded.accept_upload(image("source")).unwrap();
        sessions.push(uploaded);
        let mut generating = ready_session(DesignMode::Interior);
        generating.begin_chat("add a plant").unwrap();
        sessions.push(generating);
        let mut failed = Session::new(DesignMode::Interior);
        failed.accept_upload(image("source")).unwrap();
        let ticket = failed.begin_generation().unwrap();
        failed.fail_generation(ticket.epoch, "boom").unwrap();
        sessions.push(failed);

        for mut session in sessions {
            let old_epoch = session.epoch();
            let old_id = session.id();
            session.reset(DesignMode::Content);
            let snapshot = session.snapshot();
            assert_eq!(snapshot.phase, Phase::Initial);
            assert_eq!(snapshot.mode, DesignMode::Content);
            assert!(snapshot.source_image.is_none());
            assert!(snapshot.display_image.is_none());
            assert!(snapshot.conversation.is_empty());
            assert!(snapshot.items.is_empty());
            assert!(snapshot.social_caption.is_none());
            assert!(snapshot.last_error.is_none());
            assert_eq!(snapshot.epoch, old_epoch + 1);
            assert_ne!(snapshot.session_id, old_id);
        }
    }

    #[test]
    fn stale_results_are_rejected_after_reset() {
        let mut session = ready_session(DesignMode::Interior);
        let ticket = session.begin_chat("add a plant").unwrap().unwrap();
        session.reset(DesignMode::Interior);

        let err = session
            .complete_chat(
                ticket.epoch,
                ChatEdit::Image {
                    image: image("late"),
                    items: Vec::new(),
                    caption: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DesignError::Superseded));
        assert!(session.snapshot().display_image.is_none());
        assert!(matches!(
            session.set_activity(ticket.epoch, "late"),
            Err(DesignError::Superseded)
        ));
    }
}
