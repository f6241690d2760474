// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One handler per job kind.

pub mod contact;
pub mod media;
pub mod promise;
pub mod response;

pub use contact::ContactInferenceHandler;
pub use media::MediaHandler;
pub use promise::PromiseHandler;
pub use response::ResponseHandler;
