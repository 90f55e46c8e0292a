pub mod bookings;
pub mod fleet;
pub mod packages;
pub mod promotions;
pub mod quads;
pub mod queue;
pub mod reports;
pub mod settings;
pub mod staff;
pub mod users;
