pub mod u2f;
