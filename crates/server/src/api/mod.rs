pub mod assistant;
pub mod handlers;
pub mod middleware;
pub mod ocr;
pub mod routes;
pub mod substitutes;

pub use routes::create_router;
