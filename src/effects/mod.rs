pub mod recolor;
