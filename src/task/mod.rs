//! Generation task lifecycle: submit, poll, result.

mod ark;
mod client;
mod poller;
#[cfg(test)]
pub(crate) mod test_helpers;
mod types;

pub use ark::{ArkClient, ArkClientBuilder, DEFAULT_BASE_URL};
pub use client::TaskClient;
pub use poller::{PollConfig, PollReport, Poller};
pub use types::{
    ContentItem, GenerationParams, GenerationRequest, ImageReference, ImageRole, ImageUrl,
    TaskContent, TaskHandle, TaskOutcome, TaskSnapshot, TaskStatus, DEFAULT_MODEL,
};
