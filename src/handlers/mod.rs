// HTTP handlers, grouped by route prefix:
//   public/  - /health and /public/* (no tree access)
//   tree/    - /api/:kind/* operations on categories, pages and page components

pub mod public;
pub mod tree;
