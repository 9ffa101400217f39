mod cli;
mod config;
mod dto;
mod run;

pub use run::run;
