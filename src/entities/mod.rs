//! `SeaORM` entities for the review data model.
//!
//! Cascade behavior lives in the migrations' foreign keys: reviews go with
//! their title or author, comments with their review or author, join rows with
//! either side. The category reference on a title is weak (set null).

pub mod category;
pub mod comment;
pub mod genre;
pub mod review;
pub mod title;
pub mod title_genre;
pub mod user;
