// Topic scoring: trait-based abstraction for swappable backends.
//
// The TopicScorer trait defines the interface. OnnxZeroShotScorer runs an NLI
// model locally; RemoteZeroShotScorer calls a hosted inference endpoint.
// BoundedScorer wraps either one with deployment limits.

pub mod blocking;
pub mod bounded;
pub mod download;
pub mod onnx;
pub mod rate_limiter;
pub mod remote;
pub mod traits;
