//! Source adapters for external content providers
//!
//! Each adapter wraps one provider API and speaks the same contract:
//! `discover` returning provider-native raw items, and a static `fallback`
//! sample used whenever the provider is unavailable. Discovery never fails;
//! expected failure modes (missing credentials, upstream errors, empty
//! payloads) are logged and answered with the fallback item so the rest of
//! the pipeline always has a deterministic shape to exercise.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::RawItem;

pub mod fallback;
pub mod pluto_live;
pub mod pluto_vod;
pub mod radiobrowser;
pub mod rtp_play;

pub use pluto_live::PlutoLiveAdapter;
pub use pluto_vod::PlutoVodAdapter;
pub use radiobrowser::RadioBrowserAdapter;
pub use rtp_play::RtpPlayAdapter;

/// Timeout for provider discovery requests. Probes use their own, tighter
/// budget from the validation config.
pub(crate) const DISCOVERY_TIMEOUT_SECS: u64 = 30;

/// One external content provider.
///
/// `config` is the per-source opaque JSON from the sources table; each
/// adapter deserializes the fields it understands and defaults the rest.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Registry key, referenced by `adapter_id` in source registrations.
    fn id(&self) -> &'static str;

    /// Discover items from the provider. Never fails: expected failure
    /// modes degrade to [`SourceAdapter::fallback`].
    async fn discover(&self, config: &Value) -> Vec<RawItem>;

    /// Static, clearly-labeled demo sample for this provider.
    fn fallback(&self) -> Vec<RawItem>;
}
