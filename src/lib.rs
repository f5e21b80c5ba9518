// Library for tests to access modules

pub mod config;
pub mod csv_io;
pub mod detector;
pub mod error;
pub mod jobs;
pub mod models;
pub mod notify;
pub mod router;
pub mod routes;
pub mod service;
pub mod store;
