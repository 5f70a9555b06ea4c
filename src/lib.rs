//! Library crate for quiz-arena-back, exposing modules for the binary and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod quizgen;
pub mod routes;
pub mod scoring;
pub mod services;
pub mod state;
