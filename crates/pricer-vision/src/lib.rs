//! Vision-model extraction pipeline.
//!
//! Validates an [`pricer_core::AnalysisRequest`], sends the image and prompt
//! to an OpenAI-compatible chat completions endpoint, and turns the model's
//! free-form reply into normalized [`pricer_core::ExtractedItem`]s. Replies
//! that are not JSON are absorbed by a single fallback item; only upstream
//! failures surface as errors.

pub mod candidate;
pub mod client;
pub mod decode;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod types;
pub mod validate;

pub use candidate::CandidateItem;
pub use client::{OpenAiVisionClient, VisionModel, VisionRequest};
pub use decode::{decode_reply, strip_code_fence, DecodedReply};
pub use error::{AnalysisError, VisionError};
pub use normalize::{normalize_item, normalize_items};
pub use pipeline::{ExtractionPipeline, PipelineOptions};
pub use validate::{validate_request, ModelHandle, ValidatedRequest};
