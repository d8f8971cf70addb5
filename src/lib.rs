pub mod audit;
pub mod cart;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod roles;
pub mod routes;
pub mod services;
pub mod state;
pub mod workflow;
