//! Record/playback interception

mod http;

pub use http::HttpRecorder;
