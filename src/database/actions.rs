mod ingredients;
mod recipes;
mod shopping;
mod subscriptions;
mod tags;
mod toggles;
mod users;

pub use ingredients::*;
pub use recipes::*;
pub use shopping::*;
pub use subscriptions::*;
pub use tags::*;
pub use toggles::*;
pub use users::*;
