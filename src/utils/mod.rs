pub mod extract;
pub mod middleware;
