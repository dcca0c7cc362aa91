// Topic classification core: validation, ranking and the pipeline that
// wires them around an injected scorer.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod rank;
pub mod validate;
