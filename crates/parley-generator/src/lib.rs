// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response generation for the Parley pipeline.
//!
//! [`ResponseGenerator`] drives one request through cache lookup, context
//! assembly, prompt construction, the model call, output parsing, safety
//! filtering, cache write and analytics. Streaming callers receive tokens
//! through a [`StreamSink`](parley_core::StreamSink); [`ChannelSink`] adapts
//! that to an mpsc channel.

pub mod analytics;
pub mod generator;
pub mod parse;
pub mod recording;
pub mod sink;
pub mod stage;

pub use analytics::summarize;
pub use generator::{FAILURE_CONFIDENCE, FAILURE_SUGGESTIONS, ResponseGenerator};
pub use parse::{ParsedOutput, parse_model_output};
pub use recording::register_metrics;
pub use sink::{ChannelSink, StreamEvent};
pub use stage::Stage;
