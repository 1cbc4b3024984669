pub mod admin;
pub mod game;
pub mod legacy;
pub mod pages;
pub mod session;
