pub mod auth;
pub mod database;
pub mod memory;
pub mod surreal;
pub mod video;

// 重新导出常用类型
pub use auth::AuthService;
pub use database::{Database, UserStore, VideoStore};
pub use memory::MemoryStore;
pub use surreal::SurrealStore;
pub use video::VideoService;
