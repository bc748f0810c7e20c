pub mod bot;
pub mod constants;
pub mod field;
pub mod food;
pub mod pool;
pub mod snake;
pub mod spatial;
pub mod torus;
