//! http-recorder - HTTP record/playback transport for deterministic tests
//!
//! A [`Session`](recording::Session) is opened in record, playback or
//! pass-through mode and shared by any number of
//! [`HttpRecorder`](proxy::HttpRecorder) transports. Recorded exchanges and
//! generated asset names are persisted when the session is closed and served
//! back, in order, when it is reopened for playback.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod matcher;
pub mod network;
pub mod proxy;
pub mod recording;
pub mod replay;
pub mod storage;

pub use config::{Config, Mode};
pub use error::{RecorderError, Result};
pub use matcher::{RecordMatcher, SimpleMatcher};
pub use network::{HttpRequest, HttpResponse, Transport};
pub use proxy::HttpRecorder;
pub use recording::{RecordEntry, Session};
