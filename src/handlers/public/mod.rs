mod health;
mod submissions;

pub use health::health;
pub use submissions::submit;
