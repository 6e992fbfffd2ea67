//! Thin XBoard front-end to the Blunders engine: spawns the input thread
//! and hands control to the protocol manager.

use std::panic;
use std::process;

use blunders_engine::threads::{spawn_input_thread, CommandQueue};
use blunders_engine::Manager;

const NAME_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Prints panic payloads and locations to standard output before the
/// process exits, so a GUI driving the engine over a pipe can still see
/// what went wrong rather than just observing the pipe close.
fn panic_hook() {
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        println!("# panic: {}", panic_info);
        orig_hook(panic_info);
        process::exit(1);
    }));
}

fn main() {
    panic_hook();
    println!("# {}", NAME_VERSION);

    let queue = CommandQueue::new();
    let input_thread = spawn_input_thread(queue.clone());

    let mut manager = Manager::new();
    manager.run(&queue);

    drop(input_thread); // input thread exits on its own once stdin closes.
    process::exit(0);
}
