//! Build-context sources
//!
//! A context source stages a build-context archive somewhere a builder pod can
//! reach and describes the pod that fetches and builds it.

pub mod onprem;
pub mod traits;

pub use onprem::OnPremContextSource;
pub use traits::{ContextSource, UploadedContext};
