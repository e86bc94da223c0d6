//! Actor System for the serve session
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --BuildMsg--> BuildActor --HubMsg--> HubActor --> browsers
//! (watch)              (rebuild lane)          (broadcast)
//!                                                 ^
//!                          reload server --AddClient
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `build` - Serialized generator runs and static copy/remove
//! - `hub` - Push-channel connections and reload broadcast
//! - `coordinator` - Wires up and runs actors

pub mod build;
pub mod coordinator;
pub mod fs;
pub mod hub;
pub mod messages;

pub use coordinator::Coordinator;
