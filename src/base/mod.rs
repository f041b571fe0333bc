//! Foundation constants shared by every stage of the pipeline.
//!
//! This module has NO dependencies on other `jclnorm` modules.

pub mod constants;
