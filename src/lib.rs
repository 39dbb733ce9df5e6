#[macro_use] extern crate lazy_static;
#[macro_use] extern crate serde;

pub mod api;
pub mod apps;
pub mod config;
pub mod excel;
pub mod logging;
pub mod paths;
pub mod reconcile;
pub mod report;
pub mod sap;
