pub mod calibration;
pub mod config;
pub mod exercise;
pub mod geometry;
pub mod pose;
pub mod session;
pub mod synth;
pub mod tracker;
