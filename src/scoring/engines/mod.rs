//! The four independent base engines (spec §4.2.1). Each is a pure
//! function `(Candidate, Context) -> (score, reasons, diagnostic)`; no
//! engine reads another's output.

pub mod ai;
pub mod esoteric;
pub mod jarvis;
pub mod research;

pub const AI_WEIGHT: f64 = 0.25;
pub const RESEARCH_WEIGHT: f64 = 0.35;
pub const ESOTERIC_WEIGHT: f64 = 0.20;
pub const JARVIS_WEIGHT: f64 = 0.20;
