pub mod reward_pool;
pub mod vault;

pub use reward_pool::*;
pub use vault::*;
