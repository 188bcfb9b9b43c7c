pub mod codec;
pub mod domain;
pub mod intent;
pub mod orchestrator;
pub mod pipeline;
pub mod ports;
pub mod session;

#[cfg(test)]
mod test_support;

pub use codec::{CodecError, UploadedFile};
pub use domain::{
    DesignFeedback, DesignMode, DesignStyle, FurnitureItem, ImageData, Message, PartialItem, Sender,
};
pub use intent::{Intent, IntentRouter};
pub use orchestrator::{DesignOrchestrator, DesignServices, ExportedImage};
pub use pipeline::FurniturePipeline;
pub use ports::{
    CaptionService, ImageGenerationService, IntentClassificationService, ItemExtractionService,
    PortError, PortResult, ProductPhotoService, SessionObserver,
};
pub use session::{DesignError, Phase, Session, SessionSnapshot};
