pub mod summary_commands;
