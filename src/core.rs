pub mod extract;
pub mod live;
pub mod lookup;
pub mod schedule;
pub mod slot;
pub mod spike;
pub mod window;
pub mod zone;
