// Adapters layer: concrete implementations of the domain ports.

pub mod console;
pub mod shell;

pub use console::ConsoleReporter;
pub use shell::ShellRunner;
