//! Remote collector clients
//!
//! ## Architecture
//!
//! - **NotifierClient**: async HTTP client that posts a [`NoticePayload`] to
//!   the collector endpoint
//! - **NotificationClient**: trait seam used by [`RemoteSink`](crate::sinks::RemoteSink)
//! - **Filters**: functions that rewrite or drop reports before delivery
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use errbrake::clients::NotifierClient;
//! use errbrake::config::NotifierConfig;
//! use errbrake::report::ErrorReport;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NotifierClient::configure(NotifierConfig {
//!     endpoint: "https://collector.example.com/api/notices".to_string(),
//!     project_id: "144031".to_string(),
//!     project_key: "5a2fb879e83b".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let report = ErrorReport::builder("ZeroDivision", "division by zero").build();
//! let result = client.notify(&report).await;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod filters;
pub mod notifier;
pub mod payload;
pub mod traits;

pub use filters::{context_filter, ReportFilter};
pub use notifier::NotifierClient;
pub use payload::{HostInfo, NoticePayload, ReportParts};
pub use traits::{ClientConfigInfo, ClientStats, DeliveryResult, NotificationClient};
