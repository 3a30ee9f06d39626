#![forbid(unsafe_code)]
#![deny(unused_must_use)]

pub mod report;
pub mod source;
