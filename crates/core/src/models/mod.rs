pub mod movie;
pub mod search;
pub mod user;
pub mod watchlist;

pub use movie::*;
pub use search::*;
pub use user::*;
pub use watchlist::*;
