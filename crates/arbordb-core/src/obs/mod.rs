pub mod trace;

pub use trace::{
    RequestFingerprint, StatisticsTraceEvent, StatisticsTraceSink, TraceComputerKind,
};
