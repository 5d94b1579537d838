// Library for tests to access modules

pub mod alert;
pub mod config;
pub mod diff;
pub mod load_worker;
pub mod loadavg_repo;
pub mod models;
pub mod port_worker;
pub mod scanner;
pub mod schedule;
pub mod state_repo;
