//! Event routing: the in-process listener bus.

pub mod bus;
