//! # Response Generation
//!
//! The generation side of the pipeline: persona prompt construction, the
//! structured reply contract with its lenient parser, and the
//! [`ResponderService`] schema loop that turns an analysis into a reply the
//! caller can always ship.

pub mod prompt;
pub mod reply;
pub mod responder;

pub use prompt::build_prompt;
pub use reply::{parse_reply, Appraisal, GeneratedReply};
pub use responder::{ResponderService, FALLBACK_RESPONSE};
