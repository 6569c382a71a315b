pub mod content;
pub mod files;
pub mod health;
