pub mod layer;
pub mod template;
