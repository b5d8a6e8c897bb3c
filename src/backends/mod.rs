//! The mirror backends the dispatcher fans out to.

pub mod analytic;
pub mod store_mirror;
pub mod stream;
pub mod vertex_rpc;

pub use analytic::AnalyticBackend;
pub use store_mirror::StoreMirror;
pub use stream::StreamMirror;
pub use vertex_rpc::{LineRpc, RecordingRpc, RpcCall, VertexRpc, VertexRpcMirror};

/// Attribute values rendered for text-oriented backends: strings go out raw,
/// everything else as its JSON form.
pub(crate) fn attr_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
