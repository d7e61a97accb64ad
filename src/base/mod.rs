pub mod behavior;
pub mod mask;
pub mod module;
