pub mod board;
pub mod chest;
pub mod entity;
pub mod item;
pub mod physics;
pub mod proximity;
pub mod selection;
