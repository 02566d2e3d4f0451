pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Cat, Cp, Info, Init, Ls, Mkdir, Mv, Put, Rm, Sign, Touch, Version};
