//! Profiling utilities based on the `puffin` crate.
//!
//! All hooks compile to no-ops unless the `profiling` feature is enabled.

#[cfg(feature = "profiling")]
mod enabled {
    use std::sync::OnceLock;

    pub use puffin::{profile_function, profile_scope};

    /// Global profiling server instance.
    static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

    /// Enable puffin scopes and start the HTTP server for `puffin_viewer`.
    pub fn init_profiling() {
        puffin::set_scopes_on(true);

        match puffin_http::Server::new("0.0.0.0:8585") {
            Ok(server) => {
                tracing::info!("Puffin profiler server started on http://0.0.0.0:8585");
                let _ = PROFILING_SERVER.set(server);
            }
            Err(e) => {
                tracing::error!("Failed to start puffin server: {}", e);
            }
        }
    }

    /// Mark the start of a new frame for profiling.
    ///
    /// Call this once per frame to organize profiling data by frame.
    pub fn new_frame() {
        puffin::GlobalProfiler::lock().new_frame();
    }
}

#[cfg(feature = "profiling")]
pub use enabled::*;

#[cfg(not(feature = "profiling"))]
mod disabled {
    #[macro_export]
    macro_rules! profile_function {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! profile_scope {
        ($($tt:tt)*) => {};
    }

    pub fn init_profiling() {}

    pub fn new_frame() {}
}

#[cfg(not(feature = "profiling"))]
pub use crate::{profile_function, profile_scope};
#[cfg(not(feature = "profiling"))]
pub use disabled::{init_profiling, new_frame};
