//! Top-level facade crate for reqmeter.
//!
//! Re-exports the core registry and the server library so users can depend on a single crate.

pub mod core {
    pub use reqmeter_core::*;
}

pub mod server {
    pub use reqmeter_server::*;
}
