//! Aura: a rule-based chat assistant that schedules household appliances
//! into low-carbon energy windows.
//!
//! The crate is split the way a turn flows:
//!
//! - [`nlp`] classifies a message and extracts appliances, deadline and urgency
//! - [`optimizer`] asks the energy API for green windows
//! - [`scheduler`] lays tasks out into the green and dirty windows
//! - [`responder`] renders the reply
//! - [`assistant`] ties the steps together over a persisted [`chat`] log

pub mod analytics;
pub mod assistant;
pub mod capability;
pub mod chat;
pub mod cli;
pub mod config;
pub mod matching;
pub mod nlp;
pub mod optimizer;
pub mod responder;
pub mod scheduler;
pub mod utils;
pub mod web;
