//! SQLite database module for the Marketplace Settlement Engine.
mod sqlite_impl;

pub mod db;

pub use sqlite_impl::SqliteDatabase;
