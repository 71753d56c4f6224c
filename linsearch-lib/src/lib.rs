#![deny(unsafe_code)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments
)]

pub mod cache;
pub mod collection;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mode;
pub mod pipeline;
pub mod search;
