pub mod contraction;
pub mod dataset_service;
pub mod indicators;
pub mod ranking_service;
pub mod relative_strength;
