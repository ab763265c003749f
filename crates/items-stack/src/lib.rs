pub mod api;
pub mod cors;
pub mod error;
pub mod function;
pub mod iam;
pub mod intrinsics;
pub mod stack;
pub mod table;
pub mod template;

pub use error::StackError;
pub use function::Architecture;
pub use stack::{Stack, StackConfig, compose};
pub use template::Template;
