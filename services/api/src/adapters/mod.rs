pub mod caption_llm;
pub mod gemini;
pub mod image_gen;
pub mod intent_llm;
pub mod items_llm;

pub use caption_llm::GeminiCaptionAdapter;
pub use gemini::GeminiClient;
pub use image_gen::GeminiImageAdapter;
pub use intent_llm::GeminiIntentAdapter;
pub use items_llm::GeminiItemsAdapter;
