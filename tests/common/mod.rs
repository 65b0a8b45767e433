#![allow(dead_code)]

pub mod assertions;
pub mod harness;
pub mod signatures;
