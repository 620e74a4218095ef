pub mod media;
pub mod validation;
