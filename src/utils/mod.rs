//! Utility modules shared by the serve session.

pub mod exec;
pub mod httpdate;
pub mod mime;
pub mod path;
