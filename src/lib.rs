// Library surface for the host binary and the integration tests.
// Nothing here touches the terminal except the event passthrough in `runtime`.
pub mod app_dirs;
pub mod config;
pub mod credit;
pub mod exercise;
pub mod progress;
pub mod report;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod sound;
pub mod store;
pub mod timer;
pub mod util;
