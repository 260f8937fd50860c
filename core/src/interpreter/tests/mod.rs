//! Tests for the task interpreter
//!
//! Organized by feature area

mod helpers;

mod action_tests;
mod task_tests;
