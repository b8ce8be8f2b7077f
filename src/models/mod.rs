// Data models for hand landmarks, gestures, training samples and detection results

pub mod detection;
pub mod gesture;
pub mod landmark;
