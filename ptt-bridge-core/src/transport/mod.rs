pub mod binding;
pub mod completion;
pub mod connector;
pub mod control;
