#[macro_use]
extern crate log;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate lazy_static;

pub mod browser_controller;
pub mod credentials;
pub mod session;
pub mod submitter;
pub mod types;
pub mod utils;
