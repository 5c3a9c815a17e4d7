pub mod board;
pub mod capture;
pub mod codec;
pub mod config;
pub mod error;
pub mod query;
pub mod scenario;
pub mod selector;
pub mod sim;
pub mod surface;
pub mod validator;
pub mod waiter;

pub use board::*;
pub use capture::*;
pub use config::*;
pub use error::DriverError;
pub use query::*;
pub use scenario::*;
pub use selector::*;
pub use surface::*;
pub use validator::*;
pub use waiter::*;
