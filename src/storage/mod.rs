//! Storage module - persistent block store

mod db;

pub use db::*;
