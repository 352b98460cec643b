//! NovelSeg - plain-text novel segmenter and translator.
//!
//! This library provides functionality for:
//! - Splitting novels into chapters from mixed header conventions
//! - Packing chapter text into length-bounded, uniquely named segments
//! - Storing segments as YAML records
//! - Translating records one by one through OpenAI-compatible APIs

pub mod config;
pub mod console;
pub mod driver;
pub mod error;
pub mod prompts;
pub mod records;
pub mod segmenter;
pub mod translator;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use driver::{DriverOptions, DriverSummary, RangeSpec, SegmentOutcome};
pub use error::{ConfigError, PromptError, RecordError, TranslationError};
pub use records::Record;
pub use segmenter::{Chapter, Segmentation, extract, segment_document};
pub use translator::{OpenAiTranslator, TranslationRequest, TranslationService};
