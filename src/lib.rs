//! # Novda Telegram Bot
//!
//! A Telegram front-end for the Novda tree-planting backend: users log in
//! or register, browse the catalog, manage their cart and check out, and
//! workers report planted trees with a bucket id, location and photo.

pub mod api_client;
pub mod api_errors;
pub mod bot;
pub mod config;
pub mod dialogue;
pub mod localization;
pub mod models;
pub mod session;
