//! Core process-wide state shared by the serve session.

mod state;

pub use state::{
    fail_session, is_failed, is_serving, is_shutdown, register_scope, register_server, set_serving,
    setup_shutdown_handler,
};
