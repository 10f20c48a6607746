//! Gateway module - fan-out of one query to many backends

pub mod dispatcher;

pub use dispatcher::Dispatcher;
