#![allow(ambiguous_glob_reexports)]

pub mod initialize;
pub mod configure;
pub mod request_seed;
pub mod fulfill_random_words;
pub mod select_winners;
pub mod finish_eligibility;
pub mod read_winners;

pub use initialize::*;
pub use configure::*;
pub use request_seed::*;
pub use fulfill_random_words::*;
pub use select_winners::*;
pub use finish_eligibility::*;
pub use read_winners::*;
