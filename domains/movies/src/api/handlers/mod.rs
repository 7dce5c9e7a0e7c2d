//! HTTP handlers for the Movies domain

pub mod movies;
