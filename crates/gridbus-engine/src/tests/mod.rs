mod calc_lifecycle;
mod common;
mod composite_commands;
