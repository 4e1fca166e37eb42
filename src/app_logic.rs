/*
 * This module provides the application logic layer, centered around
 * `IpoTrackerLogic`, which the command-line front end drives. It turns user
 * input into validated store writes and assembles the list, dashboard and
 * export views from fresh reads of the store.
 * Unit tests for `IpoTrackerLogic` are in `handler_tests.rs`.
 */
pub mod handler;

#[cfg(test)]
mod handler_tests;

pub use handler::{ApplicationView, Dashboard, IpoTrackerLogic, LogicError};
