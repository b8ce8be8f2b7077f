pub mod config;
pub mod database;
pub mod logging;

// Landmark geometry and matching
pub mod comparator;
pub mod gesture_matcher;
pub mod normalizer;
pub mod quality_evaluator;

// Gesture library and detection pipeline
pub mod detection_service;
pub mod gesture_store;

#[cfg(test)]
pub(crate) mod fixtures;
