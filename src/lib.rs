//! An unofficial Rust client for Gemini Deep Research background tasks.
//!
//! Deep Research runs take minutes, so the API executes them in the background.
//! This crate submits a query, polls the resulting interaction until it reaches
//! a terminal state and hands back the final report text, or a typed error
//! saying which layer failed.
//!
//! ## Features
//! - Asynchronous HTTP transport for the Interactions API.
//! - Normalization of both id encodings (`id` or `interactions/<id>`) and of status case.
//! - A fixed-interval poller with optional deadline and cancellation.
//! - Injectable clock and sleeper for deterministic tests.
//!
//! ## Example
//!
//! ```no_run
//! use deep_research::{Credential, GeminiClient, Poller, SystemClock, TaskSpec, TokioSleeper};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let client = GeminiClient::new(&Credential::new("your_api_key"))?;
//! let poller = Poller::new(client);
//! let spec = TaskSpec::new("What changed in the Rust 2024 edition?");
//! let completion = poller.run(&spec, &SystemClock, &TokioSleeper).await?;
//! println!("{}", completion.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod transport;
pub mod types;

pub use client::GeminiClient;
pub use config::Config;
pub use error::{ConfigError, ResearchError, TransportError};
pub use poller::{
    Clock, Completion, PollOptions, Poller, Sleeper, SystemClock, TokioSleeper, POLL_INTERVAL,
};
pub use transport::Transport;
pub use types::{Credential, OutputFragment, Status, Task, TaskId, TaskSpec, DEFAULT_AGENT};
