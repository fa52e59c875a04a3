mod admin;
mod auth;
mod common;
mod gallery;
