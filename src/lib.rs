#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod net;
pub mod storage;
pub mod util;
