//! Statistics-fabrication tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect
//! fabrication semantics.

use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use sha2::{Digest, Sha256};

///
/// StatisticsTraceSink
///

pub trait StatisticsTraceSink: Send + Sync {
    fn on_event(&self, event: StatisticsTraceEvent);
}

///
/// RequestFingerprint
///
/// Stable digest of one statistics request, for correlating trace events.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RequestFingerprint([u8; 32]);

impl RequestFingerprint {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

///
/// TraceComputerKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraceComputerKind {
    Root,
    Children,
    Parent,
    Siblings,
    SiblingsTraveling,
    NodeRelative,
}

///
/// StatisticsTraceEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatisticsTraceEvent {
    Start {
        fingerprint: RequestFingerprint,
        outputs: u32,
    },
    Computer {
        fingerprint: RequestFingerprint,
        kind: TraceComputerKind,
        trees: u32,
    },
    Finish {
        fingerprint: RequestFingerprint,
        outputs: u32,
    },
    Error {
        fingerprint: RequestFingerprint,
        class: ErrorClass,
        origin: ErrorOrigin,
    },
}

/// Emit an error event for internal failures; usage errors carry no
/// classification and are not traced.
pub(crate) fn emit_error(
    sink: Option<&'static dyn StatisticsTraceSink>,
    fingerprint: RequestFingerprint,
    err: &InternalError,
) {
    if let Some(sink) = sink {
        sink.on_event(StatisticsTraceEvent::Error {
            fingerprint,
            class: err.class,
            origin: err.origin,
        });
    }
}

/// Digest one statistics request: the self-scope output names plus the
/// referenced-entity names, in registration order.
pub(crate) fn request_fingerprint<'a>(
    self_outputs: impl Iterator<Item = &'a str>,
    reference_names: impl Iterator<Item = &'a str>,
) -> RequestFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(b"hierfp:v1");

    for name in self_outputs {
        hasher.update([0x01]);
        write_str(&mut hasher, name);
    }
    for name in reference_names {
        hasher.update([0x02]);
        write_str(&mut hasher, name);
    }

    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    RequestFingerprint::from_bytes(out)
}

fn write_str(hasher: &mut Sha256, value: &str) {
    let len = u32::try_from(value.len()).unwrap_or(u32::MAX);
    hasher.update(len.to_be_bytes());
    hasher.update(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_order_sensitive() {
        let a = request_fingerprint(["megaMenu"].into_iter(), ["brand"].into_iter());
        let b = request_fingerprint(["megaMenu"].into_iter(), ["brand"].into_iter());
        let c = request_fingerprint(["brand"].into_iter(), ["megaMenu"].into_iter());

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
