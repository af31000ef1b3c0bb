pub mod activity_service;
pub mod ratio_tracker;
