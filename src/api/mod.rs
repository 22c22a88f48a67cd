pub mod endpoints;
pub mod middleware;
pub mod navigation;
pub mod rest;
pub mod state;
pub mod views;
