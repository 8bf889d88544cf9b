#[macro_use]
mod macros;

pub mod demand;
pub mod price;

pub use self::{
    demand::KilowattRate,
    price::{CentsPerKilowattHour, KilowattHourPrice, MegawattHourPrice},
};
