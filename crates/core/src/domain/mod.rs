pub mod channel;
pub mod preference;
pub mod schedule;
pub mod workspace;
