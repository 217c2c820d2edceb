pub mod event;
pub mod step;
pub mod viewport;
pub mod world;
