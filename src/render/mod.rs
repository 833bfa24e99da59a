pub mod base_color;
pub mod composite;
pub mod export;
pub mod layer;
pub mod mask;
