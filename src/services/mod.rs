pub mod media_service;
pub mod naming;
pub mod normalizer;
pub mod storage;
