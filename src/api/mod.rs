// HTTP surface for the recommender: search, title listing, health

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState};
