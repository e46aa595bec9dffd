pub mod classes;
pub mod config;
pub mod db;
pub mod ledger;
pub mod models;
pub mod roster;
pub mod server;
pub mod store;
pub mod sync;
