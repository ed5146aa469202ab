// Core modules implementing module resolution, cache install, and negotiation.
pub mod cache;
pub mod config;
pub mod error;
pub mod ffi;
pub mod hooks;
pub mod negotiate;
pub mod platform;
pub mod registry;
pub mod resolve;
