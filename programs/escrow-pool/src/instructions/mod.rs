pub mod collect_dust;
pub mod create_vault;
pub mod deposit;
pub mod initialize_pool;
pub mod lifetime_vault;
pub mod view;
pub mod withdraw;

#[allow(ambiguous_glob_reexports)]
pub use collect_dust::*;
#[allow(ambiguous_glob_reexports)]
pub use create_vault::*;
#[allow(ambiguous_glob_reexports)]
pub use deposit::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize_pool::*;
#[allow(ambiguous_glob_reexports)]
pub use lifetime_vault::*;
#[allow(ambiguous_glob_reexports)]
pub use view::*;
#[allow(ambiguous_glob_reexports)]
pub use withdraw::*;
