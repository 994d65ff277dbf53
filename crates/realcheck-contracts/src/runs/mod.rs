pub mod scoreboard;
pub mod summary;
