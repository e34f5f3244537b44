//! ReviewDb API - Backend for a community review-aggregation platform
//!
//! This crate provides the REST API for ReviewDb, enabling:
//! - Cataloguing reviewable works ("titles") by category and genre
//! - One scored review per user per title, aggregated into a rating
//! - Comments on reviews

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod rating;
pub mod routes;
pub mod state;
