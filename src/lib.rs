#![warn(missing_docs)]
//! ArkGen - image-to-video generation through the Volcengine Ark API.
//!
//! A run encodes a local image, submits a content-generation task with a
//! prompt and the image as first frame, polls the task until it succeeds or
//! fails, and streams the resulting video to disk.
//!
//! # Quick Start
//!
//! ```no_run
//! use arkgen::{ArkClient, Downloader, Driver, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> arkgen::Result<()> {
//!     let client = ArkClient::builder().build()?;
//!     let downloader = Downloader::new()?;
//!     let config = RunConfig::new("seed.jpg", "Torch-lit procession on a moonlit ridge");
//!
//!     let report = Driver::new(&client, &downloader, config).run().await?;
//!     println!("{:?}", report.outcome);
//!     Ok(())
//! }
//! ```
//!
//! # Lower-level pieces
//!
//! ```no_run
//! use arkgen::{ArkClient, GenerationRequest, PollConfig, Poller, TaskClient};
//!
//! # async fn demo() -> arkgen::Result<()> {
//! let client = ArkClient::builder().api_key("ark-...").build()?;
//! let image = arkgen::encode::image_to_data_url("seed.png").await?;
//! let request = GenerationRequest::new("A cat playing with a ball").with_first_frame(image);
//!
//! let task = client.create(&request).await?;
//! let report = Poller::new(PollConfig::default()).poll(&client, &task).await?;
//! println!("{task}: {:?} after {} queries", report.outcome, report.attempts);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//! - `cli` (default): the `arkgen` command-line binary

pub mod config;
pub mod download;
pub mod driver;
pub mod encode;
mod error;
pub mod task;

// Re-export error types at crate root
pub use error::{ArkGenError, Result};

pub use config::RunConfig;
pub use download::{DownloadResult, Downloader};
pub use driver::{Driver, RunOutcome, RunReport};
pub use encode::{EncodedImage, ImageMime};
pub use task::{
    ArkClient, ArkClientBuilder, GenerationParams, GenerationRequest, PollConfig, PollReport,
    Poller, TaskClient, TaskHandle, TaskOutcome, TaskSnapshot, TaskStatus,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ArkGenError, Result};
    pub use crate::{
        ArkClient, Downloader, Driver, GenerationRequest, PollConfig, Poller, RunConfig,
        TaskClient,
    };
}
