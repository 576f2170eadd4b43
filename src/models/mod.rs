pub mod response;
pub mod user;
pub mod video;
