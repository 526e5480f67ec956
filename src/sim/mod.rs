pub mod event;
pub mod layout;
pub mod round;
pub mod schedule;
pub mod step;
pub mod world;
