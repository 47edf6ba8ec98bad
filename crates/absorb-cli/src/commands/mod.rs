pub mod mesh;
pub mod oracles;
pub mod run;
