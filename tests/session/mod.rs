//! Session integration tests: discovery, execution, the C callback tables
//! and the driver on top of them.

mod driver;
mod explore;
mod ffi;
