pub mod boards;
pub mod health;
pub mod images;
