#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
#[macro_use]
extern crate rocket;

pub mod catchers;
pub mod configuration;
pub mod dispatch;
pub mod domain;
pub mod email;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod models;
pub mod promotion;
pub mod routes;
pub mod schema;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod template;
