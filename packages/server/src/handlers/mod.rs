pub mod admin;
pub mod auth;
pub mod gallery;
pub mod member;
pub mod sponsor;
pub mod sub_team;
pub mod team;
pub mod video;
